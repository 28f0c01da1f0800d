//! Uniform clearing price computation for one auction round.
//!
//! The venue clears every round at a single mid-market price: the exact
//! midpoint of the highest sell price and the lowest buy price across all
//! orders in the round. A side with no orders contributes zero. The
//! computation is a pure fold over the round's buckets, so insertion order
//! never affects the result.

use std::collections::HashMap;

use clearhouse_types::{OrderSide, Price};

use crate::price_bucket::PriceBucket;

/// Summary of one round's clearing computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearingReport {
    /// The uniform clearing price for the round. Zero when the round is
    /// empty; callers decide whether to settle at it.
    pub clearing_price: Price,
    /// Highest price quoted by any sell order, if the round has sells.
    pub max_sell: Option<Price>,
    /// Lowest price quoted by any buy order, if the round has buys.
    pub min_buy: Option<Price>,
    /// Number of orders inspected.
    pub order_count: usize,
}

/// Compute the clearing report for a round's price buckets.
///
/// The midpoint is taken over price extremes of the whole round, not best
/// bid/ask, and both sides participate even when they cross.
#[must_use]
pub fn round_report(round: &HashMap<Price, PriceBucket>) -> ClearingReport {
    let mut max_sell: Option<Price> = None;
    let mut min_buy: Option<Price> = None;
    let mut order_count = 0usize;

    for (price, bucket) in round {
        for entry in bucket.iter() {
            order_count += 1;
            match entry.order.side {
                OrderSide::Sell => {
                    if max_sell.is_none_or(|p| *price > p) {
                        max_sell = Some(*price);
                    }
                }
                OrderSide::Buy => {
                    if min_buy.is_none_or(|p| *price < p) {
                        min_buy = Some(*price);
                    }
                }
            }
        }
    }

    let clearing_price = Price::midpoint(
        max_sell.unwrap_or_else(Price::zero),
        min_buy.unwrap_or_else(Price::zero),
    );

    ClearingReport {
        clearing_price,
        max_sell,
        min_buy,
        order_count,
    }
}
