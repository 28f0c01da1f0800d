//! # clearhouse-book
//!
//! **Auction order book and clearing engine for Clearhouse.**
//!
//! Orders collect per auction round and clear at one uniform mid-market
//! price per round. The book is the venue's hot path:
//!
//! - **Two-level index**: auction round, then canonical price bucket
//! - **Exact price keys**: reduced rationals, never floating point
//! - **One lock per book**: linearizable operations, snapshot reads
//! - **Per-pair sharding**: each market gets an independent book

pub mod clearing;
pub mod orderbook;
pub mod price_bucket;

pub use clearing::{round_report, ClearingReport};
pub use orderbook::{AuctionBook, MemoryAuctionBook};
pub use price_bucket::PriceBucket;
