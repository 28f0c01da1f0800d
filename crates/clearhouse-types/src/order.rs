//! Auction order model and canonical identifier derivation.
//!
//! An order's identity is the SHA3-256 digest of its canonical byte
//! serialization, so every venue node derives the same [`OrderId`] for the
//! same economic fields and a resubmission shows up as a duplicate.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

use crate::constants::{NONCE_BYTES, SIGNABLE_BYTES};
use crate::{AuctionId, ClearhouseError, OrderId, Pair, Price, Pubkey, Result};

/// Which side of the auction this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Canonical wire byte: 0 for buy, 1 for sell.
    #[must_use]
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Buy => 0,
            Self::Sell => 1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// An order submitted for one auction round.
///
/// Amounts are integer base units of the respective assets. The price is
/// not stored; it is derived as `amount_want / amount_have`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionOrder {
    pub pair: Pair,
    pub side: OrderSide,
    pub amount_have: u64,
    pub amount_want: u64,
    pub auction_id: AuctionId,
    pub nonce: [u8; NONCE_BYTES],
    pub pubkey: Pubkey,
}

impl AuctionOrder {
    /// Check the order's economic fields.
    ///
    /// # Errors
    /// `InvalidOrder` if either amount is zero.
    pub fn validate(&self) -> Result<()> {
        if self.amount_have == 0 || self.amount_want == 0 {
            return Err(ClearhouseError::InvalidOrder {
                reason: "order amounts must be non-zero".into(),
            });
        }
        Ok(())
    }

    /// The order's price, `amount_want / amount_have`.
    ///
    /// # Errors
    /// `InvalidOrder` if either amount is zero.
    pub fn price(&self) -> Result<Price> {
        Price::from_amounts(self.amount_want, self.amount_have)
    }

    /// Canonical byte serialization covering the economic fields:
    ///
    /// `tag_want || tag_have || side || amount_have (BE) || amount_want (BE)
    ///  || auction_id || nonce || pubkey`
    #[must_use]
    pub fn serialize_signable(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(SIGNABLE_BYTES);
        buf.push(self.pair.asset_want.tag());
        buf.push(self.pair.asset_have.tag());
        buf.push(self.side.as_byte());
        buf.extend_from_slice(&self.amount_have.to_be_bytes());
        buf.extend_from_slice(&self.amount_want.to_be_bytes());
        buf.extend_from_slice(self.auction_id.as_bytes());
        buf.extend_from_slice(&self.nonce);
        buf.extend_from_slice(self.pubkey.as_bytes());
        buf
    }

    /// Derive the order's identifier: SHA3-256 of the canonical bytes.
    #[must_use]
    pub fn order_id(&self) -> OrderId {
        let digest = Sha3_256::digest(self.serialize_signable());
        OrderId(digest.into())
    }
}

/// A placed order as the book stores it: identifier, order, derived price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    pub order_id: OrderId,
    pub order: AuctionOrder,
    pub price: Price,
}

impl BookEntry {
    /// Validate an order and derive its id and price.
    ///
    /// # Errors
    /// `InvalidOrder` if the order fails validation.
    pub fn from_order(order: AuctionOrder) -> Result<Self> {
        order.validate()?;
        let price = order.price()?;
        let order_id = order.order_id();
        Ok(Self {
            order_id,
            order,
            price,
        })
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl AuctionOrder {
    /// An order on the default 00/01 pair in round `[0x01, 0, 0, ...]`,
    /// keyed by `seed` so tests can mint distinct owners.
    #[must_use]
    pub fn dummy_for(seed: u8, side: OrderSide, amount_have: u64, amount_want: u64) -> Self {
        let mut pk = [seed; 33];
        pk[0] = 0x02;
        let mut auction = [0u8; 32];
        auction[0] = 0x01;
        Self {
            pair: Pair::new(crate::Asset(0x00), crate::Asset(0x01)),
            side,
            amount_have,
            amount_want,
            auction_id: AuctionId(auction),
            nonce: [0x01, 0x02],
            pubkey: Pubkey(pk),
        }
    }

    #[must_use]
    pub fn dummy(side: OrderSide, amount_have: u64, amount_want: u64) -> Self {
        Self::dummy_for(0x11, side, amount_have, amount_want)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signable_layout_is_byte_exact() {
        let order = AuctionOrder::dummy(OrderSide::Buy, 1000, 2000);
        let bytes = order.serialize_signable();
        assert_eq!(bytes.len(), SIGNABLE_BYTES);
        assert_eq!(bytes[0], 0x00); // want tag
        assert_eq!(bytes[1], 0x01); // have tag
        assert_eq!(bytes[2], 0); // buy
        assert_eq!(&bytes[3..11], &1000u64.to_be_bytes());
        assert_eq!(&bytes[11..19], &2000u64.to_be_bytes());
        assert_eq!(&bytes[19..51], order.auction_id.as_bytes());
        assert_eq!(&bytes[51..53], &order.nonce);
        assert_eq!(&bytes[53..86], order.pubkey.as_bytes());
    }

    #[test]
    fn order_id_is_deterministic() {
        let a = AuctionOrder::dummy(OrderSide::Buy, 1000, 2000);
        let b = AuctionOrder::dummy(OrderSide::Buy, 1000, 2000);
        assert_eq!(a.order_id(), b.order_id());
    }

    #[test]
    fn order_id_distinguishes_every_economic_field() {
        let base = AuctionOrder::dummy(OrderSide::Buy, 1000, 2000);
        let mut variants = Vec::new();

        let mut v = base.clone();
        v.side = OrderSide::Sell;
        variants.push(v);

        let mut v = base.clone();
        v.amount_have = 1001;
        variants.push(v);

        let mut v = base.clone();
        v.amount_want = 2001;
        variants.push(v);

        let mut v = base.clone();
        v.auction_id = AuctionId([0x02; 32]);
        variants.push(v);

        let mut v = base.clone();
        v.nonce = [0xff, 0xff];
        variants.push(v);

        let mut v = base.clone();
        v.pair = Pair::new(crate::Asset(0x01), crate::Asset(0x00));
        variants.push(v);

        variants.push(AuctionOrder::dummy_for(0x22, OrderSide::Buy, 1000, 2000));

        for variant in variants {
            assert_ne!(base.order_id(), variant.order_id());
        }
    }

    #[test]
    fn price_derivation() {
        let order = AuctionOrder::dummy(OrderSide::Buy, 1000, 2000);
        assert_eq!(order.price().unwrap(), Price::from_amounts(2, 1).unwrap());
    }

    #[test]
    fn zero_amount_order_rejected() {
        let order = AuctionOrder::dummy(OrderSide::Buy, 0, 2000);
        assert!(order.validate().is_err());
        assert!(BookEntry::from_order(order).is_err());
    }

    #[test]
    fn book_entry_carries_derived_fields() {
        let order = AuctionOrder::dummy(OrderSide::Sell, 300, 900);
        let entry = BookEntry::from_order(order.clone()).unwrap();
        assert_eq!(entry.order_id, order.order_id());
        assert_eq!(entry.price, Price::from_amounts(3, 1).unwrap());
    }

    #[test]
    fn order_serde_roundtrip() {
        let order = AuctionOrder::dummy(OrderSide::Sell, 123, 456);
        let json = serde_json::to_string(&order).unwrap();
        let back: AuctionOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }

    #[test]
    fn side_display() {
        assert_eq!(format!("{}", OrderSide::Buy), "BUY");
        assert_eq!(format!("{}", OrderSide::Sell), "SELL");
    }
}
