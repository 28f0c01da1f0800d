//! System-wide constants for the Clearhouse venue core.

/// Length of a compressed SEC1 secp256k1 public key.
pub const PUBKEY_BYTES: usize = 33;

/// Length of order and auction identifiers.
pub const ID_BYTES: usize = 32;

/// Length of the per-order nonce.
pub const NONCE_BYTES: usize = 2;

/// Length of an order's canonical signable serialization:
/// 2 asset tags + side + two u64 amounts + auction id + nonce + pubkey.
pub const SIGNABLE_BYTES: usize = 2 + 1 + 8 + 8 + ID_BYTES + NONCE_BYTES + PUBKEY_BYTES;
