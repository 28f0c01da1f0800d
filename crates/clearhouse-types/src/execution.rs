//! Execution, cancellation, settlement, and deposit event types.
//!
//! These are the data carriers exchanged between the book, the clearing
//! engine, the deposit store, and the (external) settlement layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Asset, OrderId, Pubkey};

/// The result of matching one order in a cleared round.
///
/// `filled` removes the order from the book; otherwise the new amounts
/// replace the old ones and the order keeps resting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExecution {
    pub order_id: OrderId,
    pub filled: bool,
    pub new_amount_have: u64,
    pub new_amount_want: u64,
}

/// A cancellation request for a resting order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelledOrder {
    pub order_id: OrderId,
    pub reason: String,
}

impl CancelledOrder {
    #[must_use]
    pub fn new(order_id: OrderId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
        }
    }
}

/// Direction of a settlement event as seen by the venue's ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SettlementType {
    Debit,
    Credit,
}

impl fmt::Display for SettlementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debit => write!(f, "DEBIT"),
            Self::Credit => write!(f, "CREDIT"),
        }
    }
}

/// A single ledger movement emitted toward the settlement layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementExecution {
    pub pubkey: Pubkey,
    pub asset: Asset,
    pub amount: u64,
    pub settlement_type: SettlementType,
}

/// An on-chain deposit observed by a chain watcher.
///
/// The deposit is credited once the chain reaches
/// `block_height_received + confirmations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub pubkey: Pubkey,
    pub address: String,
    pub amount: u64,
    pub txid: String,
    /// Coin name as registered in the coin registry.
    pub coin: String,
    pub block_height_received: u64,
    pub confirmations: u64,
}

impl Deposit {
    /// The block height at which this deposit becomes spendable.
    #[must_use]
    pub fn maturation_height(&self) -> u64 {
        self.block_height_received + self.confirmations
    }
}
