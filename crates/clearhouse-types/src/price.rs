//! Canonical order price arithmetic.
//!
//! A price is the exact rational `amount_want / amount_have`, kept in
//! lowest terms. Two orders quoting the same rational always produce the
//! same [`Price`] value, so the book can key price buckets by it directly:
//! no binary floating point is involved anywhere, and ordering follows true
//! rational order.

use std::fmt;
use std::str::FromStr;

use num_rational::Ratio;
use num_traits::Zero;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{ClearhouseError, Result};

/// An exact, reduced rational price.
///
/// Numerator and denominator live in `u128` so any pair of `u64` amounts
/// fits without reduction loss, and midpoints of two prices stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Price(Ratio<u128>);

impl Price {
    /// Derive the price of an order quoting `amount_want` against
    /// `amount_have`.
    ///
    /// # Errors
    /// `InvalidOrder` if either amount is zero.
    pub fn from_amounts(amount_want: u64, amount_have: u64) -> Result<Self> {
        if amount_want == 0 || amount_have == 0 {
            return Err(ClearhouseError::InvalidOrder {
                reason: "order amounts must be non-zero".into(),
            });
        }
        Ok(Self(Ratio::new(
            u128::from(amount_want),
            u128::from(amount_have),
        )))
    }

    /// The zero price, used when one side of a round is empty.
    #[must_use]
    pub fn zero() -> Self {
        Self(Ratio::zero())
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Exact midpoint of two prices. No rounding occurs.
    #[must_use]
    pub fn midpoint(a: Self, b: Self) -> Self {
        Self((a.0 + b.0) / Ratio::from_integer(2))
    }

    /// Numerator of the reduced fraction.
    #[must_use]
    pub fn numer(&self) -> u128 {
        *self.0.numer()
    }

    /// Denominator of the reduced fraction.
    #[must_use]
    pub fn denom(&self) -> u128 {
        *self.0.denom()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0.numer(), self.0.denom())
    }
}

impl FromStr for Price {
    type Err = ClearhouseError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || ClearhouseError::InvalidOrder {
            reason: format!("malformed price: {s}"),
        };
        let (numer, denom) = s.split_once('/').ok_or_else(bad)?;
        let numer: u128 = numer.parse().map_err(|_| bad())?;
        let denom: u128 = denom.parse().map_err(|_| bad())?;
        if denom == 0 {
            return Err(bad());
        }
        Ok(Self(Ratio::new(numer, denom)))
    }
}

// Wire form is the reduced "numer/denom" string: JSON has no 128-bit
// integers, and the string doubles as a stable map key for book views.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
