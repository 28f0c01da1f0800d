//! Error types for the Clearhouse venue core.
//!
//! All errors use the `CH_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order / book errors
//! - 2xx: Auction round errors
//! - 3xx: Deposit store errors
//! - 4xx: Balance oracle errors
//! - 5xx: Proof-of-assets errors
//! - 9xx: Configuration / internal errors

use thiserror::Error;

use crate::{AuctionId, OrderId, Pair};

/// Central error enum for all Clearhouse operations.
#[derive(Debug, Error)]
pub enum ClearhouseError {
    // =================================================================
    // Order / Book Errors (1xx)
    // =================================================================
    /// The requested order was not found in the book.
    #[error("CH_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order failed validation (zero amounts, malformed fields, etc.).
    #[error("CH_ERR_101: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// An order with this ID is already resting in the book.
    #[error("CH_ERR_102: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The order's trading pair does not match the book it was sent to.
    #[error("CH_ERR_103: Wrong market: book serves {expected}, order is for {got}")]
    WrongMarket { expected: Pair, got: Pair },

    // =================================================================
    // Auction Round Errors (2xx)
    // =================================================================
    /// The auction round is unknown to this book.
    #[error("CH_ERR_200: Auction not found: {0}")]
    AuctionNotFound(AuctionId),

    // =================================================================
    // Deposit Store Errors (3xx)
    // =================================================================
    /// No deposit address is registered for the pubkey.
    #[error("CH_ERR_300: Deposit address not found for pubkey")]
    DepositAddressNotFound,

    // =================================================================
    // Balance Oracle Errors (4xx)
    // =================================================================
    /// The balance oracle could not resolve a pubkey. Recoverable: the
    /// caller may retry once the oracle knows the key.
    #[error("CH_ERR_400: Balance lookup failed: {reason}")]
    BalanceLookupFailed { reason: String },

    // =================================================================
    // Proof-of-Assets Errors (5xx)
    // =================================================================
    /// A response was requested before any challenge was set.
    #[error("CH_ERR_500: No challenge has been set")]
    MissingChallenge,

    /// An operation was attempted in the wrong machine state.
    #[error("CH_ERR_501: Invalid state: expected {expected}, got {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    /// RNG or curve arithmetic failure. Fatal to the proof instance; the
    /// transcript is discarded.
    #[error("CH_ERR_502: Cryptographic failure: {reason}")]
    CryptoFailure { reason: String },

    // =================================================================
    // Configuration / Internal (9xx)
    // =================================================================
    /// Configuration error (unknown coin, conflicting registry entry).
    #[error("CH_ERR_900: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ClearhouseError>;
