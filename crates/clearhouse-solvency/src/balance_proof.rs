//! Per-wallet prover for the disjunctive ownership proof.
//!
//! For each wallet in the anonymity set the venue proves "I know the
//! wallet's discrete log" OR "this wallet contributes zero", without
//! revealing which branch is real. The [`WalletProver`] holds the four
//! nonces backing the two branch announcements and turns a verifier
//! challenge into the response for its wallet.

use k256::{ProjectivePoint, Scalar};

use clearhouse_types::{ClearhouseError, Result};

use crate::pedersen::{random_scalar, PedersenGens};

/// One wallet's share of an attestation round: nonces, announcements,
/// and the challenge response.
pub struct WalletProver {
    u1: Scalar,
    u2: Scalar,
    u3: Scalar,
    u4: Scalar,
    challenge: Option<Scalar>,
}

impl WalletProver {
    /// Sample the four branch nonces.
    ///
    /// # Errors
    /// `CryptoFailure` if the system RNG fails; the caller must discard
    /// the whole attestation round.
    pub fn new() -> Result<Self> {
        Ok(Self {
            u1: random_scalar()?,
            u2: random_scalar()?,
            u3: random_scalar()?,
            u4: random_scalar()?,
            challenge: None,
        })
    }

    /// The two branch announcements, one per disjunct.
    #[must_use]
    pub fn announcements(&self, gens: &PedersenGens) -> (ProjectivePoint, ProjectivePoint) {
        let known = *gens.g() * self.u1 + *gens.h() * self.u2;
        let zero = *gens.g() * self.u3 + *gens.h() * self.u4;
        (known, zero)
    }

    /// Store the verifier's challenge for this wallet.
    pub fn set_challenge(&mut self, challenge: Scalar) {
        self.challenge = Some(challenge);
    }

    #[must_use]
    pub fn has_challenge(&self) -> bool {
        self.challenge.is_some()
    }

    /// The response for this wallet: `u1 + c` when the venue owns the
    /// wallet, the bare nonce `u1` otherwise.
    ///
    /// # Errors
    /// `MissingChallenge` if no challenge has been set.
    pub fn s_response(&self, owned: bool) -> Result<Scalar> {
        let challenge = self.challenge.ok_or(ClearhouseError::MissingChallenge)?;
        if owned {
            Ok(self.u1 + challenge)
        } else {
            Ok(self.u1)
        }
    }
}

// Nonces never appear in logs.
impl std::fmt::Debug for WalletProver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletProver")
            .field("challenged", &self.challenge.is_some())
            .finish_non_exhaustive()
    }
}
