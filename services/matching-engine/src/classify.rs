//! Side classification for a matcher snapshot
//!
//! Orders carry no mandatory side, so each run derives one: if every order
//! in the snapshot has an explicit side it is honored, otherwise the
//! snapshot is split at the ceiling-median of its price-sorted sequence
//! (upper half bids). A price shared across the median may flip sides
//! between runs; callers must not rely on classification stability.

use types::{Order, Side};

/// Stable price-time ordering: descending price, ascending timestamp,
/// ascending admission sequence.
pub fn sort_price_time(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.price
            .cmp(&a.price)
            .then(a.timestamp.cmp(&b.timestamp))
            .then(a.admitted_seq.cmp(&b.admitted_seq))
    });
}

/// Partition a price-time sorted snapshot into (bids, asks).
///
/// Bids keep the descending-price order of the input; asks are re-ordered
/// cheapest-first so the best ask crosses before worse ones.
pub fn split_bids_asks(sorted: Vec<Order>) -> (Vec<Order>, Vec<Order>) {
    let (bids, mut asks) = if sorted.iter().all(|o| o.side.is_some()) && !sorted.is_empty() {
        sorted
            .into_iter()
            .partition(|order| order.side == Some(Side::Bid))
    } else {
        // Ceiling-median split: the top half of the price-sorted sequence
        // are bids, the bottom half asks.
        let midpoint = (sorted.len() + 1) / 2;
        let mut bids = sorted;
        let asks = bids.split_off(midpoint);
        (bids, asks)
    };

    asks.sort_by(|a, b| {
        a.price
            .cmp(&b.price)
            .then(a.timestamp.cmp(&b.timestamp))
            .then(a.admitted_seq.cmp(&b.admitted_seq))
    });

    (bids, asks)
}
