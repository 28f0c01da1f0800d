//! Pedersen commitments on secp256k1.
//!
//! A commitment to `v` is `v*G + r*H` where `G` is the curve's base point
//! and `H` is a second generator derived by hashing into the curve, so
//! nobody knows the discrete log of `H` with respect to `G`. Commitments
//! are perfectly hiding, computationally binding, and additively
//! homomorphic: the sum of two commitments commits to the sum of the
//! values under the sum of the blindings.

use k256::elliptic_curve::hash2curve::{ExpandMsgXmd, GroupDigest};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, ProjectivePoint, Scalar, Secp256k1};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use clearhouse_types::{ClearhouseError, Result};

/// Domain separation tag for deriving the blinding generator.
const H_DST: &[u8] = b"CLEARHOUSE-V01-CS01-with-secp256k1_XMD:SHA-256_SSWU_RO_";

/// A Pedersen commitment: a single curve point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commitment(pub(crate) ProjectivePoint);

impl Commitment {
    #[must_use]
    pub fn as_point(&self) -> &ProjectivePoint {
        &self.0
    }

    /// Compressed SEC1 encoding of the commitment point.
    #[must_use]
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        self.0.to_affine().to_encoded_point(true).as_bytes().to_vec()
    }
}

impl serde::Serialize for Commitment {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        crate::encoding::point_hex::serialize(&self.0, serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Commitment {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        crate::encoding::point_hex::deserialize(deserializer).map(Commitment)
    }
}

impl std::ops::Add for Commitment {
    type Output = Commitment;

    fn add(self, rhs: Commitment) -> Commitment {
        Commitment(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Commitment {
    fn sum<I: Iterator<Item = Commitment>>(iter: I) -> Commitment {
        Commitment(iter.fold(ProjectivePoint::IDENTITY, |acc, c| acc + c.0))
    }
}

/// The two generators every commitment in the venue is formed over.
#[derive(Debug, Clone, Copy)]
pub struct PedersenGens {
    g: ProjectivePoint,
    h: ProjectivePoint,
}

impl PedersenGens {
    /// Build the generator pair: `G` is the secp256k1 base point, `H` is
    /// hashed into the curve under a fixed domain tag.
    ///
    /// # Errors
    /// `CryptoFailure` if hash-to-curve fails.
    pub fn new() -> Result<Self> {
        let h = Secp256k1::hash_from_bytes::<ExpandMsgXmd<Sha256>>(
            &[b"clearhouse pedersen blinding generator"],
            &[H_DST],
        )
        .map_err(|e| ClearhouseError::CryptoFailure {
            reason: format!("deriving blinding generator: {e}"),
        })?;
        Ok(Self {
            g: ProjectivePoint::GENERATOR,
            h,
        })
    }

    #[must_use]
    pub fn g(&self) -> &ProjectivePoint {
        &self.g
    }

    #[must_use]
    pub fn h(&self) -> &ProjectivePoint {
        &self.h
    }

    /// Commit to `value` under a freshly sampled blinding.
    ///
    /// Returns the commitment together with the blinding; the caller owns
    /// keeping the blinding secret for later opening.
    ///
    /// # Errors
    /// `CryptoFailure` if the system RNG fails.
    pub fn commit(&self, value: u64) -> Result<(Commitment, Scalar)> {
        let blinding = random_scalar()?;
        Ok((self.commit_with(value, &blinding), blinding))
    }

    /// Commit to `value` under a caller-chosen blinding.
    #[must_use]
    pub fn commit_with(&self, value: u64, blinding: &Scalar) -> Commitment {
        Commitment(self.g * Scalar::from(value) + self.h * blinding)
    }

    /// Check that `commitment` opens to `(value, blinding)`.
    #[must_use]
    pub fn open(&self, value: u64, blinding: &Scalar, commitment: &Commitment) -> bool {
        self.commit_with(value, blinding) == *commitment
    }
}

/// Sample a uniform scalar from the system RNG.
///
/// Candidate bytes outside the scalar field are rejected and redrawn; the
/// loop bound is far beyond anything a working RNG can hit.
///
/// # Errors
/// `CryptoFailure` if the system RNG fails or every draw is rejected.
pub fn random_scalar() -> Result<Scalar> {
    let mut rng = OsRng;
    for _ in 0..64 {
        let mut bytes = [0u8; 32];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|e| ClearhouseError::CryptoFailure {
                reason: format!("system rng: {e}"),
            })?;
        if let Some(scalar) = Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(bytes))) {
            return Ok(scalar);
        }
    }
    Err(ClearhouseError::CryptoFailure {
        reason: "no canonical scalar after 64 draws".into(),
    })
}
