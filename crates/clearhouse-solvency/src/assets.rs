//! The proof-of-assets state machine.
//!
//! One machine instance drives one attestation round over a frozen wallet
//! anonymity set. Wallets the venue owns carry a private key; the rest
//! carry none and contribute zero. The round walks explicit states:
//!
//! ```text
//! New --set_anon_set--> Init --init--> Committed --set_challenge-->
//! Challenged --s_response--> Done
//! ```
//!
//! Out-of-order operations are rejected with `InvalidState`; RNG and
//! curve failures poison the instance (`Failed`) and its transcript is
//! discarded. Balance-oracle misses are the one recoverable error: the
//! machine is left exactly as it was so the caller can retry.
//!
//! The aggregate asset commitment is computed at most once per instance.
//! Its blinding is preserved on the machine for later verification and is
//! never reused for any other commitment.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use k256::{NonZeroScalar, Scalar, SecretKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use clearhouse_types::{ClearhouseError, Pubkey, Result};

use crate::balance_proof::WalletProver;
use crate::encoding::{point_hex, pubkey_to_point, scalar_hex};
use crate::oracle::BalanceOracle;
use crate::pedersen::{Commitment, PedersenGens};

/// One member of the anonymity set.
struct Wallet {
    pubkey: Pubkey,
    /// `Some` marks a wallet the venue owns; its balance enters the
    /// asset total. `None` contributes zero.
    secret: Option<NonZeroScalar>,
}

impl Wallet {
    fn owned(&self) -> bool {
        self.secret.is_some()
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("pubkey", &self.pubkey)
            .field("owned", &self.owned())
            .finish()
    }
}

/// The aggregate commitment and the secrets needed to open it later.
#[derive(Clone)]
pub struct AssetCommitment {
    commitment: Commitment,
    blinding: Scalar,
    wallet_commitments: Vec<Commitment>,
}

impl AssetCommitment {
    /// The aggregate commitment point.
    #[must_use]
    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    /// The blinding the aggregate opens under. Keep it secret.
    #[must_use]
    pub fn blinding(&self) -> &Scalar {
        &self.blinding
    }

    /// Per-wallet commitments, in anonymity-set order.
    #[must_use]
    pub fn wallet_commitments(&self) -> &[Commitment] {
        &self.wallet_commitments
    }
}

impl std::fmt::Debug for AssetCommitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCommitment")
            .field("commitment", &self.commitment)
            .field("wallets", &self.wallet_commitments.len())
            .finish_non_exhaustive()
    }
}

/// One wallet's public share of the attestation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletAttestation {
    pub pubkey: Pubkey,
    /// Commitment to this wallet's declared contribution.
    pub commitment: Commitment,
    /// Announcement for the "I know the discrete log" branch.
    #[serde(with = "point_hex")]
    pub announce_known: k256::ProjectivePoint,
    /// Announcement for the "contributes zero" branch.
    #[serde(with = "point_hex")]
    pub announce_zero: k256::ProjectivePoint,
    /// Response to the round challenge.
    #[serde(with = "scalar_hex")]
    pub response: Scalar,
}

/// The publishable outcome of one attestation round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationTranscript {
    pub attestation_id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(with = "scalar_hex")]
    pub challenge: Scalar,
    pub wallets: Vec<WalletAttestation>,
    /// Homomorphic sum of all per-wallet commitments.
    pub asset_commitment: Commitment,
}

/// Explicit machine state; each variant carries exactly the data the
/// remaining transitions need.
#[derive(Debug, Default)]
enum MachineState {
    #[default]
    New,
    Init {
        wallets: Vec<Wallet>,
    },
    Committed {
        wallets: Vec<Wallet>,
        provers: Vec<WalletProver>,
    },
    Challenged {
        wallets: Vec<Wallet>,
        provers: Vec<WalletProver>,
        challenge: Scalar,
    },
    Done {
        transcript: AttestationTranscript,
    },
    /// A fatal cryptographic error occurred; every further operation is
    /// rejected and the instance should be dropped.
    Failed,
}

impl MachineState {
    fn name(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Init { .. } => "Init",
            Self::Committed { .. } => "Committed",
            Self::Challenged { .. } => "Challenged",
            Self::Done { .. } => "Done",
            Self::Failed => "Failed",
        }
    }

    fn wallets(&self) -> Option<&[Wallet]> {
        match self {
            Self::Init { wallets }
            | Self::Committed { wallets, .. }
            | Self::Challenged { wallets, .. } => Some(wallets),
            Self::New | Self::Done { .. } | Self::Failed => None,
        }
    }
}

fn invalid_state(expected: &'static str, actual: &'static str) -> ClearhouseError {
    ClearhouseError::InvalidState { expected, actual }
}

/// State machine producing a privacy-preserving proof of venue assets.
pub struct AssetsProofMachine {
    gens: PedersenGens,
    oracle: Arc<dyn BalanceOracle>,
    state: MachineState,
    asset_commitment: Option<AssetCommitment>,
}

impl AssetsProofMachine {
    /// Create a fresh machine bound to a balance oracle.
    ///
    /// # Errors
    /// `CryptoFailure` if the commitment generators cannot be derived.
    pub fn new(oracle: Arc<dyn BalanceOracle>) -> Result<Self> {
        Ok(Self {
            gens: PedersenGens::new()?,
            oracle,
            state: MachineState::New,
            asset_commitment: None,
        })
    }

    /// The generators this machine commits over.
    #[must_use]
    pub fn gens(&self) -> &PedersenGens {
        &self.gens
    }

    /// Name of the current state, for diagnostics and tests.
    #[must_use]
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// Freeze the anonymity set. A wallet with a private key is owned;
    /// one without contributes zero.
    ///
    /// # Errors
    /// `InvalidState` unless the machine is new; `CryptoFailure` if any
    /// pubkey is not a valid SEC1 point (the machine stays new).
    pub fn set_anon_set(&mut self, wallets: Vec<(Pubkey, Option<SecretKey>)>) -> Result<()> {
        if !matches!(self.state, MachineState::New) {
            return Err(invalid_state("New", self.state.name()));
        }
        let mut set = Vec::with_capacity(wallets.len());
        for (pubkey, secret) in wallets {
            pubkey_to_point(&pubkey)?;
            set.push(Wallet {
                pubkey,
                secret: secret.map(|sk| sk.to_nonzero_scalar()),
            });
        }
        debug!(wallets = set.len(), "anonymity set frozen");
        self.state = MachineState::Init { wallets: set };
        Ok(())
    }

    /// Sample the per-wallet proof nonces.
    ///
    /// # Errors
    /// `InvalidState` outside `Init`; `CryptoFailure` poisons the
    /// instance.
    pub fn init(&mut self) -> Result<()> {
        match std::mem::take(&mut self.state) {
            MachineState::Init { wallets } => {
                let mut provers = Vec::with_capacity(wallets.len());
                for _ in &wallets {
                    match WalletProver::new() {
                        Ok(prover) => provers.push(prover),
                        Err(e) => {
                            warn!("nonce sampling failed, discarding attestation round");
                            self.state = MachineState::Failed;
                            return Err(e);
                        }
                    }
                }
                self.state = MachineState::Committed { wallets, provers };
                Ok(())
            }
            other => {
                let actual = other.name();
                self.state = other;
                Err(invalid_state("Init", actual))
            }
        }
    }

    /// Commit to the venue's total assets: the homomorphic sum of one
    /// commitment per wallet (owned balance, or zero).
    ///
    /// Computed at most once per instance; later calls return the cached
    /// commitment. The oracle is consulted before anything is committed,
    /// so a failed lookup leaves the machine untouched.
    ///
    /// # Errors
    /// `InvalidState` before the anonymity set is frozen;
    /// `BalanceLookupFailed` (recoverable) if an owned wallet cannot be
    /// resolved; `CryptoFailure` (fatal) on RNG failure.
    pub fn calculate_asset_commitment(&mut self) -> Result<Commitment> {
        if let Some(existing) = &self.asset_commitment {
            return Ok(existing.commitment);
        }

        let values = {
            let wallets = self
                .state
                .wallets()
                .ok_or_else(|| invalid_state("Init", self.state.name()))?;
            let mut values = Vec::with_capacity(wallets.len());
            for wallet in wallets {
                let value = if wallet.owned() {
                    self.oracle.balance(&wallet.pubkey)?
                } else {
                    0
                };
                values.push(value);
            }
            values
        };

        let mut wallet_commitments = Vec::with_capacity(values.len());
        let mut blinding = Scalar::ZERO;
        for value in values {
            match self.gens.commit(value) {
                Ok((commitment, r)) => {
                    blinding += r;
                    wallet_commitments.push(commitment);
                }
                Err(e) => {
                    warn!("blinding sampling failed, discarding attestation round");
                    self.state = MachineState::Failed;
                    return Err(e);
                }
            }
        }

        let commitment: Commitment = wallet_commitments.iter().copied().sum();
        debug!(wallets = wallet_commitments.len(), "asset commitment computed");
        self.asset_commitment = Some(AssetCommitment {
            commitment,
            blinding,
            wallet_commitments,
        });
        Ok(commitment)
    }

    /// The cached asset commitment and its opening secrets, if computed.
    #[must_use]
    pub fn asset_commitment(&self) -> Option<&AssetCommitment> {
        self.asset_commitment.as_ref()
    }

    /// Accept the verifier's round challenge.
    ///
    /// # Errors
    /// `InvalidState` outside `Committed`.
    pub fn set_challenge(&mut self, challenge: Scalar) -> Result<()> {
        match std::mem::take(&mut self.state) {
            MachineState::Committed {
                wallets,
                mut provers,
            } => {
                for prover in &mut provers {
                    prover.set_challenge(challenge);
                }
                self.state = MachineState::Challenged {
                    wallets,
                    provers,
                    challenge,
                };
                Ok(())
            }
            other => {
                let actual = other.name();
                self.state = other;
                Err(invalid_state("Committed", actual))
            }
        }
    }

    /// Produce all wallet responses and assemble the final transcript,
    /// computing the asset commitment first if it has not been already.
    ///
    /// # Errors
    /// `InvalidState` outside `Challenged`; `BalanceLookupFailed`
    /// (recoverable, machine stays challenged) if the commitment still
    /// cannot be computed.
    pub fn s_response(&mut self) -> Result<AttestationTranscript> {
        if !matches!(self.state, MachineState::Challenged { .. }) {
            return Err(invalid_state("Challenged", self.state.name()));
        }
        self.calculate_asset_commitment()?;
        let Some(asset) = self.asset_commitment.clone() else {
            return Err(ClearhouseError::CryptoFailure {
                reason: "asset commitment missing after computation".into(),
            });
        };

        match std::mem::take(&mut self.state) {
            MachineState::Challenged {
                wallets,
                provers,
                challenge,
            } => {
                let responses: Result<Vec<Scalar>> = wallets
                    .iter()
                    .zip(&provers)
                    .map(|(wallet, prover)| prover.s_response(wallet.owned()))
                    .collect();
                let responses = match responses {
                    Ok(responses) => responses,
                    Err(e) => {
                        self.state = MachineState::Challenged {
                            wallets,
                            provers,
                            challenge,
                        };
                        return Err(e);
                    }
                };

                let attestations = wallets
                    .iter()
                    .zip(&provers)
                    .zip(asset.wallet_commitments.iter().copied())
                    .zip(responses)
                    .map(|(((wallet, prover), commitment), response)| {
                        let (announce_known, announce_zero) = prover.announcements(&self.gens);
                        WalletAttestation {
                            pubkey: wallet.pubkey,
                            commitment,
                            announce_known,
                            announce_zero,
                            response,
                        }
                    })
                    .collect();

                let transcript = AttestationTranscript {
                    attestation_id: Uuid::now_v7(),
                    created_at: Utc::now(),
                    challenge,
                    wallets: attestations,
                    asset_commitment: asset.commitment,
                };
                debug!(attestation = %transcript.attestation_id, "attestation transcript emitted");
                self.state = MachineState::Done {
                    transcript: transcript.clone(),
                };
                Ok(transcript)
            }
            other => {
                let actual = other.name();
                self.state = other;
                Err(invalid_state("Challenged", actual))
            }
        }
    }

    /// The finished transcript, once the round is done.
    #[must_use]
    pub fn transcript(&self) -> Option<&AttestationTranscript> {
        match &self.state {
            MachineState::Done { transcript } => Some(transcript),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AssetsProofMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetsProofMachine")
            .field("state", &self.state.name())
            .field("committed", &self.asset_commitment.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use crate::encoding::point_to_pubkey;
    use crate::oracle::MemoryBalanceOracle;
    use crate::pedersen::random_scalar;

    use super::*;

    fn wallet_key() -> (Pubkey, SecretKey) {
        let secret = SecretKey::random(&mut OsRng);
        let pubkey = point_to_pubkey(&secret.public_key());
        (pubkey, secret)
    }

    /// Oracle with one owned wallet at 1000 and one watched-only wallet
    /// at 2000, mirroring the classic two-wallet attestation setup.
    fn two_wallet_machine() -> (AssetsProofMachine, Arc<MemoryBalanceOracle>) {
        let oracle = Arc::new(MemoryBalanceOracle::new());
        let (owned_pk, owned_sk) = wallet_key();
        let (other_pk, _other_sk) = wallet_key();
        oracle.set_balance(owned_pk, 1000);
        oracle.set_balance(other_pk, 2000);

        let mut machine = AssetsProofMachine::new(Arc::clone(&oracle) as Arc<dyn BalanceOracle>)
            .unwrap();
        machine
            .set_anon_set(vec![(owned_pk, Some(owned_sk)), (other_pk, None)])
            .unwrap();
        (machine, oracle)
    }

    #[test]
    fn asset_commitment_opens_to_owned_balances_only() {
        let (mut machine, _oracle) = two_wallet_machine();

        let commitment = machine.calculate_asset_commitment().unwrap();
        let asset = machine.asset_commitment().unwrap();
        // Only the owned wallet's 1000 is counted; the watched wallet's
        // 2000 stays out of the total.
        assert!(machine.gens().open(1000, asset.blinding(), &commitment));
        assert!(!machine.gens().open(3000, asset.blinding(), &commitment));
    }

    #[test]
    fn commitment_is_computed_exactly_once() {
        let (mut machine, _oracle) = two_wallet_machine();
        let first = machine.calculate_asset_commitment().unwrap();
        let second = machine.calculate_asset_commitment().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn oracle_miss_is_recoverable() {
        let oracle = Arc::new(MemoryBalanceOracle::new());
        let (owned_pk, owned_sk) = wallet_key();

        let mut machine = AssetsProofMachine::new(Arc::clone(&oracle) as Arc<dyn BalanceOracle>)
            .unwrap();
        machine
            .set_anon_set(vec![(owned_pk, Some(owned_sk))])
            .unwrap();

        let result = machine.calculate_asset_commitment();
        assert!(matches!(
            result,
            Err(ClearhouseError::BalanceLookupFailed { .. })
        ));
        assert_eq!(machine.state_name(), "Init");

        // The oracle learns the wallet; the same machine succeeds.
        oracle.set_balance(owned_pk, 500);
        let commitment = machine.calculate_asset_commitment().unwrap();
        let asset = machine.asset_commitment().unwrap();
        assert!(machine.gens().open(500, asset.blinding(), &commitment));
    }

    #[test]
    fn full_round_produces_a_consistent_transcript() {
        let (mut machine, _oracle) = two_wallet_machine();

        machine.init().unwrap();
        assert_eq!(machine.state_name(), "Committed");

        let challenge = random_scalar().unwrap();
        machine.set_challenge(challenge).unwrap();
        assert_eq!(machine.state_name(), "Challenged");

        let transcript = machine.s_response().unwrap();
        assert_eq!(machine.state_name(), "Done");
        assert_eq!(transcript.wallets.len(), 2);
        assert_eq!(transcript.challenge, challenge);

        // The published aggregate is the sum of the per-wallet
        // commitments, and it opens under the machine's blinding.
        let sum: Commitment = transcript.wallets.iter().map(|w| w.commitment).sum();
        assert_eq!(sum, transcript.asset_commitment);
        let asset = machine.asset_commitment().unwrap();
        assert!(machine
            .gens()
            .open(1000, asset.blinding(), &transcript.asset_commitment));

        assert!(machine.transcript().is_some());
    }

    #[test]
    fn transcript_serde_roundtrip() {
        let (mut machine, _oracle) = two_wallet_machine();
        machine.init().unwrap();
        machine.set_challenge(random_scalar().unwrap()).unwrap();
        let transcript = machine.s_response().unwrap();

        let json = serde_json::to_string(&transcript).unwrap();
        let back: AttestationTranscript = serde_json::from_str(&json).unwrap();
        assert_eq!(back.attestation_id, transcript.attestation_id);
        assert_eq!(back.asset_commitment, transcript.asset_commitment);
        assert_eq!(back.wallets.len(), transcript.wallets.len());
        assert_eq!(back.wallets[0].response, transcript.wallets[0].response);
    }

    #[test]
    fn out_of_order_operations_are_rejected() {
        let (mut machine, _oracle) = two_wallet_machine();

        // Challenge before nonce sampling.
        let err = machine.set_challenge(Scalar::ONE).unwrap_err();
        assert!(matches!(
            err,
            ClearhouseError::InvalidState {
                expected: "Committed",
                ..
            }
        ));

        // Responses before any challenge.
        machine.init().unwrap();
        let err = machine.s_response().unwrap_err();
        assert!(matches!(
            err,
            ClearhouseError::InvalidState {
                expected: "Challenged",
                ..
            }
        ));

        // The detours left the protocol state intact.
        assert_eq!(machine.state_name(), "Committed");
    }

    #[test]
    fn anon_set_can_only_be_frozen_once() {
        let (mut machine, _oracle) = two_wallet_machine();
        let err = machine.set_anon_set(Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            ClearhouseError::InvalidState { expected: "New", .. }
        ));
    }

    #[test]
    fn second_response_round_is_rejected() {
        let (mut machine, _oracle) = two_wallet_machine();
        machine.init().unwrap();
        machine.set_challenge(random_scalar().unwrap()).unwrap();
        machine.s_response().unwrap();

        let err = machine.s_response().unwrap_err();
        assert!(matches!(err, ClearhouseError::InvalidState { .. }));
        assert_eq!(machine.state_name(), "Done");
    }

    #[test]
    fn malformed_pubkey_rejected_before_freezing() {
        let oracle: Arc<dyn BalanceOracle> = Arc::new(MemoryBalanceOracle::new());
        let mut machine = AssetsProofMachine::new(oracle).unwrap();

        let err = machine
            .set_anon_set(vec![(Pubkey([0xff; 33]), None)])
            .unwrap_err();
        assert!(matches!(err, ClearhouseError::CryptoFailure { .. }));
        assert_eq!(machine.state_name(), "New");
    }

    #[test]
    fn init_requires_a_frozen_set() {
        let oracle: Arc<dyn BalanceOracle> = Arc::new(MemoryBalanceOracle::new());
        let mut machine = AssetsProofMachine::new(oracle).unwrap();
        let err = machine.init().unwrap_err();
        assert!(matches!(
            err,
            ClearhouseError::InvalidState { expected: "Init", .. }
        ));
    }
}
