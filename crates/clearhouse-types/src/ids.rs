//! Identifiers used throughout Clearhouse.
//!
//! Orders and auction rounds are identified by 32-byte digests rather than
//! sequence numbers, so any two venue nodes derive the same IDs from the
//! same inputs. User keys are compressed SEC1 secp256k1 points (33 bytes).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::PUBKEY_BYTES;

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Order identifier: SHA3-256 digest of the order's canonical serialization.
///
/// Identical economic fields always yield identical IDs, so a resubmitted
/// order is detectable as a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub [u8; 32]);

impl OrderId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Full hex rendering for logs and transcripts.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ord:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// AuctionId
// ---------------------------------------------------------------------------

/// Opaque identifier for one auction round, unique per pair per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct AuctionId(pub [u8; 32]);

impl AuctionId {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for AuctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "auc:{}", hex::encode(&self.0[..8]))
    }
}

// ---------------------------------------------------------------------------
// Pubkey
// ---------------------------------------------------------------------------

/// A compressed SEC1 secp256k1 public key (33 bytes).
///
/// Stored as raw bytes so the model crates stay curve-agnostic; the
/// solvency crate parses these into actual curve points when it needs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Pubkey(pub [u8; PUBKEY_BYTES]);

impl Pubkey {
    #[must_use]
    pub fn from_bytes(bytes: [u8; PUBKEY_BYTES]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PUBKEY_BYTES] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pk:{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({})", self.to_hex())
    }
}

// serde's array impls stop at 32 elements, so the 33-byte key is carried
// as a hex string on the wire.
impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let bytes: [u8; PUBKEY_BYTES] = raw
            .try_into()
            .map_err(|_| serde::de::Error::custom("pubkey must be 33 bytes"))?;
        Ok(Self(bytes))
    }
}
