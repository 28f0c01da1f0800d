//! Hex serde adapters for curve material in published transcripts.
//!
//! Scalars travel as 32-byte big-endian hex, points as compressed SEC1
//! hex, matching how the rest of the venue renders key material.

use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::PrimeField;
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, PublicKey, Scalar};

use clearhouse_types::{ClearhouseError, Pubkey, Result};

/// Parse a stored 33-byte compressed key into a curve point.
///
/// # Errors
/// `CryptoFailure` if the bytes are not a valid SEC1 point.
pub fn pubkey_to_point(pubkey: &Pubkey) -> Result<PublicKey> {
    PublicKey::from_sec1_bytes(pubkey.as_bytes()).map_err(|e| ClearhouseError::CryptoFailure {
        reason: format!("invalid wallet pubkey {pubkey}: {e}"),
    })
}

/// Render a curve point back into the venue's 33-byte key form.
#[must_use]
pub fn point_to_pubkey(point: &PublicKey) -> Pubkey {
    let encoded = point.to_encoded_point(true);
    let bytes: [u8; 33] = encoded
        .as_bytes()
        .try_into()
        .expect("compressed SEC1 public key is 33 bytes");
    Pubkey(bytes)
}

pub mod scalar_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{FieldBytes, PrimeField, Scalar};

    pub fn serialize<S: Serializer>(
        scalar: &Scalar,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(scalar.to_repr()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Scalar, D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| serde::de::Error::custom("scalar must be 32 bytes"))?;
        Option::<Scalar>::from(Scalar::from_repr(FieldBytes::from(bytes)))
            .ok_or_else(|| serde::de::Error::custom("bytes exceed the scalar field"))
    }
}

pub mod point_hex {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{AffinePoint, EncodedPoint, FromEncodedPoint, ProjectivePoint, ToEncodedPoint};

    pub fn serialize<S: Serializer>(
        point: &ProjectivePoint,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        let encoded = point.to_affine().to_encoded_point(true);
        serializer.serialize_str(&hex::encode(encoded.as_bytes()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<ProjectivePoint, D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(&s).map_err(serde::de::Error::custom)?;
        let encoded = EncodedPoint::from_bytes(&raw).map_err(serde::de::Error::custom)?;
        Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
            .map(ProjectivePoint::from)
            .ok_or_else(|| serde::de::Error::custom("bytes are not a curve point"))
    }
}
