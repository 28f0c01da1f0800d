//! Assets, trading pairs, and the coin registry.
//!
//! An [`Asset`] is a stable one-byte tag for a coin. The [`CoinRegistry`]
//! owns the injective mapping from coin names to tags; everything else in
//! the venue works with bare tags.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ClearhouseError, Result};

/// Opaque one-byte identifier for a coin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Asset(pub u8);

impl Asset {
    #[must_use]
    pub fn tag(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset:{:02x}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Pair
// ---------------------------------------------------------------------------

/// A trading pair: the asset a buyer wants against the asset they have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Pair {
    pub asset_want: Asset,
    pub asset_have: Asset,
}

impl Pair {
    #[must_use]
    pub fn new(asset_want: Asset, asset_have: Asset) -> Self {
        Self {
            asset_want,
            asset_have,
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}/{:02x}", self.asset_want.0, self.asset_have.0)
    }
}

// ---------------------------------------------------------------------------
// CoinParams / CoinRegistry
// ---------------------------------------------------------------------------

/// Chain parameters the venue needs to know about a coin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinParams {
    /// Short lowercase coin name, e.g. `"btc"`.
    pub name: String,
    /// Stable one-byte asset tag.
    pub tag: u8,
}

impl CoinParams {
    #[must_use]
    pub fn new(name: impl Into<String>, tag: u8) -> Self {
        Self {
            name: name.into(),
            tag,
        }
    }

    #[must_use]
    pub fn asset(&self) -> Asset {
        Asset(self.tag)
    }
}

/// Injective coin-name to asset-tag registry.
///
/// Registration rejects a name that would remap to a different tag and a
/// tag already claimed by another name, so the mapping stays one-to-one
/// for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct CoinRegistry {
    by_name: HashMap<String, CoinParams>,
}

impl CoinRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the chains the venue ships support for.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        for (name, tag) in [("btc", 0x00), ("ltc", 0x01), ("vtc", 0x02)] {
            reg.register(CoinParams::new(name, tag))
                .expect("default registry entries are disjoint");
        }
        reg
    }

    /// Register a coin.
    ///
    /// Re-registering an identical entry is a no-op.
    ///
    /// # Errors
    /// `Configuration` if the name or the tag is already bound differently.
    pub fn register(&mut self, params: CoinParams) -> Result<()> {
        if let Some(existing) = self.by_name.get(&params.name) {
            if existing.tag == params.tag {
                return Ok(());
            }
            return Err(ClearhouseError::Configuration(format!(
                "coin {} already registered with tag {:02x}",
                params.name, existing.tag
            )));
        }
        if let Some(taken) = self.by_name.values().find(|p| p.tag == params.tag) {
            return Err(ClearhouseError::Configuration(format!(
                "tag {:02x} already claimed by coin {}",
                params.tag, taken.name
            )));
        }
        self.by_name.insert(params.name.clone(), params);
        Ok(())
    }

    /// Resolve a coin name to its asset tag.
    ///
    /// # Errors
    /// `Configuration` if the coin is unknown.
    pub fn asset(&self, coin: &str) -> Result<Asset> {
        self.params(coin).map(CoinParams::asset)
    }

    /// Full parameters for a coin name.
    ///
    /// # Errors
    /// `Configuration` if the coin is unknown.
    pub fn params(&self, coin: &str) -> Result<&CoinParams> {
        self.by_name
            .get(coin)
            .ok_or_else(|| ClearhouseError::Configuration(format!("unknown coin: {coin}")))
    }

    /// All registered coins.
    pub fn coins(&self) -> impl Iterator<Item = &CoinParams> {
        self.by_name.values()
    }
}
