//! # clearhouse-solvency
//!
//! **Privacy-preserving proof of assets for Clearhouse.**
//!
//! The venue proves it controls wallets covering its liabilities without
//! revealing which wallets it owns. The proof is taken over a wallet
//! anonymity set: per wallet, a Pedersen commitment and a disjunctive
//! proof of "I know the discrete log" or "this wallet contributes zero";
//! in aggregate, a homomorphic sum committing to total venue assets.
//!
//! - [`PedersenGens`] / [`Commitment`]: commitments on secp256k1
//! - [`WalletProver`]: per-wallet nonces, announcements, responses
//! - [`AssetsProofMachine`]: the attestation round state machine
//! - [`BalanceOracle`]: the balance lookup port, with an in-memory
//!   default for tests

pub mod assets;
pub mod balance_proof;
pub mod encoding;
pub mod oracle;
pub mod pedersen;

pub use assets::{AssetCommitment, AssetsProofMachine, AttestationTranscript, WalletAttestation};
pub use balance_proof::WalletProver;
pub use oracle::{BalanceOracle, MemoryBalanceOracle};
pub use pedersen::{random_scalar, Commitment, PedersenGens};
