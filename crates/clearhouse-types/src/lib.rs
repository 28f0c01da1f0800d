//! # clearhouse-types
//!
//! Shared types, price arithmetic, and errors for the **Clearhouse**
//! batch-auction venue.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`AuctionId`], [`Pubkey`]
//! - **Assets**: [`Asset`], [`Pair`], [`CoinParams`], [`CoinRegistry`]
//! - **Prices**: [`Price`], the exact reduced-rational bucket key
//! - **Order model**: [`AuctionOrder`], [`OrderSide`], [`BookEntry`]
//! - **Events**: [`OrderExecution`], [`CancelledOrder`],
//!   [`SettlementExecution`], [`Deposit`]
//! - **Errors**: [`ClearhouseError`] with `CH_ERR_` prefix codes

pub mod asset;
pub mod constants;
pub mod error;
pub mod execution;
pub mod ids;
pub mod order;
pub mod price;

pub use asset::*;
pub use error::*;
pub use execution::*;
pub use ids::*;
pub use order::*;
pub use price::*;

// Constants are accessed via `clearhouse_types::constants::FOO`
// (not re-exported to avoid name collisions).
