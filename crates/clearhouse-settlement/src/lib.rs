//! # clearhouse-settlement
//!
//! **Deposit side of the Clearhouse settlement pipeline.**
//!
//! Chain watchers report observed deposits here; the store holds them in
//! maturation-height buckets and releases them as settlement executions
//! once confirmed. Address bindings live alongside so the watchers know
//! which addresses to watch for which user.

pub mod deposit_store;

pub use deposit_store::{DepositStore, MemoryDepositStore};
