//! The balance oracle port.
//!
//! The proof-of-assets machine asks the oracle for the confirmed balance
//! of each wallet the venue owns. Implementations must be pure lookups
//! and safe to call from several threads at once; a deployment backs this
//! with chain watchers, tests use [`MemoryBalanceOracle`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use clearhouse_types::{ClearhouseError, Pubkey, Result};

/// Resolve a wallet's confirmed on-chain balance.
pub trait BalanceOracle: Send + Sync {
    /// The balance for `pubkey`, in base units.
    ///
    /// # Errors
    /// `BalanceLookupFailed` if the key cannot be resolved. The error is
    /// recoverable: callers may retry once the oracle learns the key.
    fn balance(&self, pubkey: &Pubkey) -> Result<u64>;
}

/// In-memory [`BalanceOracle`] backed by a reader-writer lock, so
/// concurrent provers can read while watchers post updates.
#[derive(Debug, Default)]
pub struct MemoryBalanceOracle {
    balances: RwLock<HashMap<Pubkey, u64>>,
}

impl MemoryBalanceOracle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the balance for a wallet, replacing any previous value.
    pub fn set_balance(&self, pubkey: Pubkey, amount: u64) {
        self.balances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pubkey, amount);
    }

    /// Forget a wallet entirely.
    pub fn clear_balance(&self, pubkey: &Pubkey) {
        self.balances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(pubkey);
    }
}

impl BalanceOracle for MemoryBalanceOracle {
    fn balance(&self, pubkey: &Pubkey) -> Result<u64> {
        self.balances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pubkey)
            .copied()
            .ok_or_else(|| ClearhouseError::BalanceLookupFailed {
                reason: format!("no balance recorded for {pubkey}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn pubkey(seed: u8) -> Pubkey {
        let mut pk = [seed; 33];
        pk[0] = 0x02;
        Pubkey(pk)
    }

    #[test]
    fn set_then_get() {
        let oracle = MemoryBalanceOracle::new();
        oracle.set_balance(pubkey(0x11), 12345);
        assert_eq!(oracle.balance(&pubkey(0x11)).unwrap(), 12345);
    }

    #[test]
    fn unknown_key_fails_lookup() {
        let oracle = MemoryBalanceOracle::new();
        let result = oracle.balance(&pubkey(0x11));
        assert!(matches!(
            result,
            Err(ClearhouseError::BalanceLookupFailed { .. })
        ));
    }

    #[test]
    fn cleared_key_fails_lookup_again() {
        let oracle = MemoryBalanceOracle::new();
        oracle.set_balance(pubkey(0x11), 1);
        oracle.clear_balance(&pubkey(0x11));
        assert!(oracle.balance(&pubkey(0x11)).is_err());
    }

    #[test]
    fn concurrent_readers_see_consistent_values() {
        let oracle = Arc::new(MemoryBalanceOracle::new());
        for seed in 0..8u8 {
            oracle.set_balance(pubkey(seed), u64::from(seed) * 100);
        }

        let handles: Vec<_> = (0..8u8)
            .map(|seed| {
                let oracle = Arc::clone(&oracle);
                thread::spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(
                            oracle.balance(&pubkey(seed)).unwrap(),
                            u64::from(seed) * 100
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
