//! The auction order book for a single trading pair.
//!
//! Open orders are indexed two levels deep: auction round, then canonical
//! price bucket. An auxiliary `OrderId -> (AuctionId, Price)` index makes
//! execution, cancellation, and lookup O(1) instead of a full scan.
//!
//! Every operation runs under one exclusive lock: the nested index cannot
//! be traversed safely while another thread splices buckets, and callers
//! only ever receive clones, never references into the locked state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use clearhouse_types::{
    AuctionId, BookEntry, CancelledOrder, ClearhouseError, OrderExecution, OrderId, Pair, Price,
    Pubkey, Result,
};
use tracing::debug;

use crate::clearing::{round_report, ClearingReport};
use crate::price_bucket::PriceBucket;

/// The order book port: placement, mutation, queries, and round clearing
/// for one trading pair. Implementations must be safe to share across
/// threads.
pub trait AuctionBook: Send + Sync {
    /// The pair this book serves.
    fn pair(&self) -> Pair;

    /// Insert a placed order into its `(auction, price)` bucket.
    fn place(&self, entry: BookEntry) -> Result<()>;

    /// Apply an execution: remove on full fill, shrink amounts on partial.
    fn execute(&self, exec: &OrderExecution) -> Result<()>;

    /// Remove a resting order unconditionally. Returns the removed entry.
    fn cancel(&self, cancel: &CancelledOrder) -> Result<BookEntry>;

    /// Look up a single resting order by id.
    fn order(&self, order_id: &OrderId) -> Result<BookEntry>;

    /// All resting orders owned by `pubkey`, keyed by price, aggregated
    /// across rounds.
    fn orders_for_pubkey(&self, pubkey: &Pubkey) -> HashMap<Price, Vec<BookEntry>>;

    /// Snapshot of the whole book keyed by price, aggregated across
    /// rounds. The returned map is a copy and safe to read lock-free.
    fn view(&self) -> HashMap<Price, Vec<BookEntry>>;

    /// The uniform clearing price for a round.
    fn clearing_price(&self, auction_id: &AuctionId) -> Result<Price>;

    /// The full clearing summary for a round.
    fn clearing_report(&self, auction_id: &AuctionId) -> Result<ClearingReport>;
}

/// In-memory [`AuctionBook`] implementation.
#[derive(Debug)]
pub struct MemoryAuctionBook {
    pair: Pair,
    inner: Mutex<BookInner>,
}

#[derive(Debug, Default)]
struct BookInner {
    /// `auction -> price -> bucket of resting orders`.
    rounds: HashMap<AuctionId, HashMap<Price, PriceBucket>>,
    /// Fast lookup: where does each order currently rest.
    index: HashMap<OrderId, (AuctionId, Price)>,
}

impl MemoryAuctionBook {
    /// Create an empty book for the given pair.
    #[must_use]
    pub fn new(pair: Pair) -> Self {
        Self {
            pair,
            inner: Mutex::new(BookInner::default()),
        }
    }

    /// One book per pair, for venues serving several markets.
    #[must_use]
    pub fn map_for_pairs(pairs: &[Pair]) -> HashMap<Pair, MemoryAuctionBook> {
        pairs
            .iter()
            .map(|pair| (*pair, MemoryAuctionBook::new(*pair)))
            .collect()
    }

    /// Total number of resting orders across all rounds.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.locked().index.len()
    }

    /// Returns `true` if no orders rest in any round.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locked().index.is_empty()
    }

    // A poisoned lock means a panic mid-mutation elsewhere; the book's
    // state is still structurally sound, so we keep serving.
    fn locked(&self) -> MutexGuard<'_, BookInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuctionBook for MemoryAuctionBook {
    fn pair(&self) -> Pair {
        self.pair
    }

    fn place(&self, entry: BookEntry) -> Result<()> {
        if entry.order.pair != self.pair {
            return Err(ClearhouseError::WrongMarket {
                expected: self.pair,
                got: entry.order.pair,
            });
        }
        entry.order.validate()?;

        let mut inner = self.locked();
        if inner.index.contains_key(&entry.order_id) {
            return Err(ClearhouseError::DuplicateOrder(entry.order_id));
        }

        let auction_id = entry.order.auction_id;
        let price = entry.price;
        debug!(order = %entry.order_id, auction = %auction_id, %price, "order placed");

        inner.index.insert(entry.order_id, (auction_id, price));
        inner
            .rounds
            .entry(auction_id)
            .or_default()
            .entry(price)
            .or_default()
            .push(entry);
        Ok(())
    }

    fn execute(&self, exec: &OrderExecution) -> Result<()> {
        let mut inner = self.locked();
        let (auction_id, price) = *inner
            .index
            .get(&exec.order_id)
            .ok_or(ClearhouseError::OrderNotFound(exec.order_id))?;

        if exec.filled {
            inner.index.remove(&exec.order_id);
            let round = inner
                .rounds
                .get_mut(&auction_id)
                .ok_or(ClearhouseError::OrderNotFound(exec.order_id))?;
            let bucket = round
                .get_mut(&price)
                .ok_or(ClearhouseError::OrderNotFound(exec.order_id))?;
            bucket
                .swap_remove(&exec.order_id)
                .ok_or(ClearhouseError::OrderNotFound(exec.order_id))?;
            if bucket.is_empty() {
                round.remove(&price);
            }
            debug!(order = %exec.order_id, "order filled and removed");
            return Ok(());
        }

        // Partial fill: the remainder must keep the original price ratio,
        // otherwise the order's bucket key would be a lie.
        let new_price = Price::from_amounts(exec.new_amount_want, exec.new_amount_have)?;
        if new_price != price {
            return Err(ClearhouseError::InvalidOrder {
                reason: format!(
                    "partial execution changes price from {price} to {new_price}"
                ),
            });
        }

        let entry = inner
            .rounds
            .get_mut(&auction_id)
            .and_then(|round| round.get_mut(&price))
            .and_then(|bucket| bucket.get_mut(&exec.order_id))
            .ok_or(ClearhouseError::OrderNotFound(exec.order_id))?;
        entry.order.amount_have = exec.new_amount_have;
        entry.order.amount_want = exec.new_amount_want;
        debug!(order = %exec.order_id, have = exec.new_amount_have, want = exec.new_amount_want, "order partially filled");
        Ok(())
    }

    fn cancel(&self, cancel: &CancelledOrder) -> Result<BookEntry> {
        let mut inner = self.locked();
        let (auction_id, price) = inner
            .index
            .remove(&cancel.order_id)
            .ok_or(ClearhouseError::OrderNotFound(cancel.order_id))?;

        let round = inner
            .rounds
            .get_mut(&auction_id)
            .ok_or(ClearhouseError::OrderNotFound(cancel.order_id))?;
        let bucket = round
            .get_mut(&price)
            .ok_or(ClearhouseError::OrderNotFound(cancel.order_id))?;
        let entry = bucket
            .swap_remove(&cancel.order_id)
            .ok_or(ClearhouseError::OrderNotFound(cancel.order_id))?;
        if bucket.is_empty() {
            round.remove(&price);
        }

        debug!(order = %cancel.order_id, reason = %cancel.reason, "order cancelled");
        Ok(entry)
    }

    fn order(&self, order_id: &OrderId) -> Result<BookEntry> {
        let inner = self.locked();
        let (auction_id, price) = inner
            .index
            .get(order_id)
            .ok_or(ClearhouseError::OrderNotFound(*order_id))?;
        inner
            .rounds
            .get(auction_id)
            .and_then(|round| round.get(price))
            .and_then(|bucket| bucket.get(order_id))
            .cloned()
            .ok_or(ClearhouseError::OrderNotFound(*order_id))
    }

    fn orders_for_pubkey(&self, pubkey: &Pubkey) -> HashMap<Price, Vec<BookEntry>> {
        let inner = self.locked();
        let mut orders: HashMap<Price, Vec<BookEntry>> = HashMap::new();
        for round in inner.rounds.values() {
            for (price, bucket) in round {
                for entry in bucket.iter().filter(|e| e.order.pubkey == *pubkey) {
                    orders.entry(*price).or_default().push(entry.clone());
                }
            }
        }
        orders
    }

    fn view(&self) -> HashMap<Price, Vec<BookEntry>> {
        let inner = self.locked();
        let mut book: HashMap<Price, Vec<BookEntry>> = HashMap::new();
        for round in inner.rounds.values() {
            for (price, bucket) in round {
                book.entry(*price).or_default().extend(bucket.to_vec());
            }
        }
        book
    }

    fn clearing_price(&self, auction_id: &AuctionId) -> Result<Price> {
        self.clearing_report(auction_id)
            .map(|report| report.clearing_price)
    }

    fn clearing_report(&self, auction_id: &AuctionId) -> Result<ClearingReport> {
        let inner = self.locked();
        let round = inner
            .rounds
            .get(auction_id)
            .ok_or(ClearhouseError::AuctionNotFound(*auction_id))?;
        Ok(round_report(round))
    }
}

#[cfg(test)]
mod tests {
    use clearhouse_types::{Asset, AuctionOrder, OrderSide};

    use super::*;

    fn test_pair() -> Pair {
        Pair::new(Asset(0x00), Asset(0x01))
    }

    fn place_dummy(book: &MemoryAuctionBook, seed: u8, side: OrderSide) -> BookEntry {
        let entry =
            BookEntry::from_order(AuctionOrder::dummy_for(seed, side, 1000, 2000)).unwrap();
        book.place(entry.clone()).unwrap();
        entry
    }

    #[test]
    fn place_then_get_roundtrip() {
        let book = MemoryAuctionBook::new(test_pair());
        let entry = place_dummy(&book, 0x11, OrderSide::Buy);

        let got = book.order(&entry.order_id).unwrap();
        assert_eq!(got, entry);

        let view = book.view();
        let price = Price::from_amounts(2, 1).unwrap();
        assert_eq!(view[&price].len(), 1);
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn duplicate_place_rejected() {
        let book = MemoryAuctionBook::new(test_pair());
        let entry = place_dummy(&book, 0x11, OrderSide::Buy);
        let result = book.place(entry);
        assert!(matches!(result, Err(ClearhouseError::DuplicateOrder(_))));
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn wrong_pair_rejected() {
        let book = MemoryAuctionBook::new(Pair::new(Asset(0x05), Asset(0x06)));
        let entry =
            BookEntry::from_order(AuctionOrder::dummy(OrderSide::Buy, 1000, 2000)).unwrap();
        let result = book.place(entry);
        assert!(matches!(result, Err(ClearhouseError::WrongMarket { .. })));
    }

    #[test]
    fn cancel_removes_order_and_empty_bucket() {
        let book = MemoryAuctionBook::new(test_pair());
        let entry = place_dummy(&book, 0x11, OrderSide::Buy);

        let removed = book
            .cancel(&CancelledOrder::new(entry.order_id, "user request"))
            .unwrap();
        assert_eq!(removed.order_id, entry.order_id);

        let result = book.order(&entry.order_id);
        assert!(matches!(result, Err(ClearhouseError::OrderNotFound(_))));
        // The only entry at price 2/1 is gone, so the bucket is too.
        assert!(book.view().is_empty());
        assert!(book.is_empty());
    }

    #[test]
    fn second_cancel_is_not_found() {
        let book = MemoryAuctionBook::new(test_pair());
        let entry = place_dummy(&book, 0x11, OrderSide::Buy);

        let cancel = CancelledOrder::new(entry.order_id, "user request");
        assert!(book.cancel(&cancel).is_ok());
        assert!(matches!(
            book.cancel(&cancel),
            Err(ClearhouseError::OrderNotFound(_))
        ));
    }

    #[test]
    fn full_fill_removes_order() {
        let book = MemoryAuctionBook::new(test_pair());
        let entry = place_dummy(&book, 0x11, OrderSide::Buy);

        book.execute(&OrderExecution {
            order_id: entry.order_id,
            filled: true,
            new_amount_have: 0,
            new_amount_want: 0,
        })
        .unwrap();

        assert!(matches!(
            book.order(&entry.order_id),
            Err(ClearhouseError::OrderNotFound(_))
        ));
        assert!(book.view().is_empty());
    }

    #[test]
    fn partial_fill_updates_amounts_in_place() {
        let book = MemoryAuctionBook::new(test_pair());
        let entry = place_dummy(&book, 0x11, OrderSide::Buy);

        book.execute(&OrderExecution {
            order_id: entry.order_id,
            filled: false,
            new_amount_have: 500,
            new_amount_want: 1000,
        })
        .unwrap();

        let got = book.order(&entry.order_id).unwrap();
        assert_eq!(got.order.amount_have, 500);
        assert_eq!(got.order.amount_want, 1000);
        // Still in the same price bucket.
        let price = Price::from_amounts(2, 1).unwrap();
        assert_eq!(book.view()[&price].len(), 1);
    }

    #[test]
    fn partial_fill_must_preserve_price_ratio() {
        let book = MemoryAuctionBook::new(test_pair());
        let entry = place_dummy(&book, 0x11, OrderSide::Buy);

        let result = book.execute(&OrderExecution {
            order_id: entry.order_id,
            filled: false,
            new_amount_have: 500,
            new_amount_want: 999,
        });
        assert!(matches!(result, Err(ClearhouseError::InvalidOrder { .. })));

        // Untouched on rejection.
        let got = book.order(&entry.order_id).unwrap();
        assert_eq!(got.order.amount_have, 1000);
    }

    #[test]
    fn execute_unknown_order_is_not_found() {
        let book = MemoryAuctionBook::new(test_pair());
        let result = book.execute(&OrderExecution {
            order_id: OrderId([0xee; 32]),
            filled: true,
            new_amount_have: 0,
            new_amount_want: 0,
        });
        assert!(matches!(result, Err(ClearhouseError::OrderNotFound(_))));
    }

    #[test]
    fn orders_for_pubkey_filters_owner() {
        let book = MemoryAuctionBook::new(test_pair());
        let mine = place_dummy(&book, 0x11, OrderSide::Buy);
        let _theirs = place_dummy(&book, 0x22, OrderSide::Sell);

        let orders = book.orders_for_pubkey(&mine.order.pubkey);
        let price = Price::from_amounts(2, 1).unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[&price].len(), 1);
        assert_eq!(orders[&price][0].order_id, mine.order_id);
    }

    #[test]
    fn clearing_price_for_unknown_round() {
        let book = MemoryAuctionBook::new(test_pair());
        let result = book.clearing_price(&AuctionId([0x09; 32]));
        assert!(matches!(result, Err(ClearhouseError::AuctionNotFound(_))));
    }

    #[test]
    fn drained_round_still_clears_at_zero() {
        let book = MemoryAuctionBook::new(test_pair());
        let entry = place_dummy(&book, 0x11, OrderSide::Buy);
        let auction_id = entry.order.auction_id;

        book.cancel(&CancelledOrder::new(entry.order_id, "drain"))
            .unwrap();

        // The round stays known after its last bucket empties.
        let price = book.clearing_price(&auction_id).unwrap();
        assert!(price.is_zero());
    }

    #[test]
    fn clearing_midpoint_through_the_book() {
        let book = MemoryAuctionBook::new(test_pair());
        let buy = place_dummy(&book, 0x11, OrderSide::Buy); // 2000/1000 = 2
        let _sell = BookEntry::from_order(AuctionOrder::dummy_for(
            0x22,
            OrderSide::Sell,
            1000,
            8000, // price 8
        ))
        .map(|e| book.place(e).unwrap())
        .unwrap();

        let price = book.clearing_price(&buy.order.auction_id).unwrap();
        assert_eq!(price, Price::from_amounts(5, 1).unwrap());
    }

    #[test]
    fn map_for_pairs_builds_one_book_each() {
        let pairs = [
            Pair::new(Asset(0x00), Asset(0x01)),
            Pair::new(Asset(0x00), Asset(0x02)),
        ];
        let books = MemoryAuctionBook::map_for_pairs(&pairs);
        assert_eq!(books.len(), 2);
        assert_eq!(books[&pairs[0]].pair(), pairs[0]);
        assert_eq!(books[&pairs[1]].pair(), pairs[1]);
    }
}
