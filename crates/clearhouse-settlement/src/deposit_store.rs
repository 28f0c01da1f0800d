//! Per-coin deposit store.
//!
//! Tracks which deposit address belongs to which user, and holds observed
//! on-chain deposits until they have enough confirmations. Deposits are
//! bucketed by maturation height; when the chain reaches a bucket's
//! height, the bucket drains into settlement executions exactly once.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use clearhouse_types::{
    Asset, ClearhouseError, CoinParams, CoinRegistry, Deposit, Pubkey, Result,
    SettlementExecution, SettlementType,
};
use tracing::{debug, warn};

/// The deposit store port for a single coin.
pub trait DepositStore: Send + Sync {
    /// Bind a pubkey to its deposit address. Last write wins.
    fn register_user(&self, pubkey: Pubkey, address: String) -> Result<()>;

    /// Record newly observed deposits and drain everything that has
    /// matured at `current_height` into settlement executions.
    fn update_deposits(
        &self,
        deposits: &[Deposit],
        current_height: u64,
    ) -> Result<Vec<SettlementExecution>>;

    /// The deposit address registered for a pubkey.
    fn deposit_address(&self, pubkey: &Pubkey) -> Result<String>;

    /// Snapshot copy of the full address-to-pubkey map.
    fn deposit_address_map(&self) -> HashMap<String, Pubkey>;
}

/// A deposit waiting for confirmations.
#[derive(Debug, Clone)]
struct PendingDeposit {
    pubkey: Pubkey,
    amount: u64,
}

/// In-memory [`DepositStore`] for one coin.
#[derive(Debug)]
pub struct MemoryDepositStore {
    coin: CoinParams,
    inner: Mutex<StoreInner>,
}

#[derive(Debug, Default)]
struct StoreInner {
    addr_to_pub: HashMap<String, Pubkey>,
    pub_to_addr: HashMap<Pubkey, String>,
    /// `maturation height -> deposits maturing there`.
    pending: HashMap<u64, Vec<PendingDeposit>>,
}

impl MemoryDepositStore {
    /// Create a store for one coin, resolving it in the registry.
    ///
    /// # Errors
    /// `Configuration` if the coin is not registered.
    pub fn new(registry: &CoinRegistry, coin: &str) -> Result<Self> {
        let coin = registry.params(coin)?.clone();
        Ok(Self {
            coin,
            inner: Mutex::new(StoreInner::default()),
        })
    }

    /// One store per registered coin.
    ///
    /// # Errors
    /// `Configuration` if any coin name is unknown to the registry.
    pub fn map_for_coins(
        registry: &CoinRegistry,
        coins: &[&str],
    ) -> Result<HashMap<Asset, MemoryDepositStore>> {
        let mut stores = HashMap::new();
        for coin in coins {
            let store = MemoryDepositStore::new(registry, coin)?;
            stores.insert(store.asset(), store);
        }
        Ok(stores)
    }

    /// The asset tag this store settles.
    #[must_use]
    pub fn asset(&self) -> Asset {
        self.coin.asset()
    }

    /// Number of deposits still waiting to mature.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.locked().pending.values().map(Vec::len).sum()
    }

    fn locked(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DepositStore for MemoryDepositStore {
    fn register_user(&self, pubkey: Pubkey, address: String) -> Result<()> {
        let mut inner = self.locked();
        // Last write wins in both directions: rebinding a user drops
        // their old address, and claiming an address evicts its previous
        // owner, so the forward and reverse maps never disagree.
        if let Some(owner) = inner.addr_to_pub.get(&address).copied() {
            if owner != pubkey {
                inner.pub_to_addr.remove(&owner);
            }
        }
        if let Some(old) = inner.pub_to_addr.insert(pubkey, address.clone()) {
            if old != address {
                inner.addr_to_pub.remove(&old);
            }
        }
        inner.addr_to_pub.insert(address, pubkey);
        Ok(())
    }

    fn update_deposits(
        &self,
        deposits: &[Deposit],
        current_height: u64,
    ) -> Result<Vec<SettlementExecution>> {
        let asset = self.coin.asset();
        let mut inner = self.locked();

        for dep in deposits {
            if dep.coin != self.coin.name {
                warn!(
                    deposit_coin = %dep.coin,
                    store_coin = %self.coin.name,
                    txid = %dep.txid,
                    "deposit routed to store for a different coin"
                );
            }
            inner
                .pending
                .entry(dep.maturation_height())
                .or_default()
                .push(PendingDeposit {
                    pubkey: dep.pubkey,
                    amount: dep.amount,
                });
        }

        // Drain every bucket at or below the current height: a deposit
        // observed late matures on the same call instead of stranding.
        let mut due: Vec<u64> = inner
            .pending
            .keys()
            .copied()
            .filter(|height| *height <= current_height)
            .collect();
        due.sort_unstable();

        let mut execs = Vec::new();
        for height in due {
            let Some(matured) = inner.pending.remove(&height) else {
                continue;
            };
            for pd in matured {
                debug!(pubkey = %pd.pubkey, amount = pd.amount, height, "deposit matured");
                execs.push(SettlementExecution {
                    pubkey: pd.pubkey,
                    asset,
                    amount: pd.amount,
                    settlement_type: SettlementType::Debit,
                });
            }
        }
        Ok(execs)
    }

    fn deposit_address(&self, pubkey: &Pubkey) -> Result<String> {
        self.locked()
            .pub_to_addr
            .get(pubkey)
            .cloned()
            .ok_or(ClearhouseError::DepositAddressNotFound)
    }

    fn deposit_address_map(&self) -> HashMap<String, Pubkey> {
        self.locked().addr_to_pub.clone()
    }
}
