//! Multi-fill crossing matcher
//!
//! Consumes a book snapshot, crosses bids against asks in price-time
//! priority, and emits at most `max_batch` fills committed under a Merkle
//! root. Pure function of its inputs: identical snapshots produce
//! byte-identical roots and manifests.

use commitment::{merkle_root, CommitError};
use thiserror::Error;
use tracing::{debug, info, warn};
use types::numeric::min_quantity;
use types::{Batch, Fill, Order};

use crate::classify::{sort_price_time, split_bids_asks};

/// Matcher-internal errors
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("commitment failed: {0}")]
    Commit(#[from] CommitError),
}

/// Result of one matcher run
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Committed fills, absent when nothing crossed
    pub batch: Option<Batch>,
    /// Orders surviving into the next run
    pub remaining: Vec<Order>,
}

/// Cross the snapshot, producing at most `max_batch` fills.
///
/// Fewer than two orders, or no crossable pair, returns the input
/// untouched with no batch. Partially filled orders stay live with their
/// residual amounts; orders drained to within epsilon are pruned.
pub fn match_and_batch(orders: Vec<Order>, max_batch: usize) -> Result<MatchOutcome, MatchError> {
    if orders.len() < 2 {
        debug!(book_size = orders.len(), "not enough orders to match");
        return Ok(MatchOutcome {
            batch: None,
            remaining: orders,
        });
    }

    info!(
        orders = orders.len(),
        max_batch, "starting multi-fill matching run"
    );

    let mut sorted = orders.clone();
    sort_price_time(&mut sorted);
    let (mut bids, mut asks) = split_bids_asks(sorted);
    debug!(bids = bids.len(), asks = asks.len(), "classified snapshot");

    let mut fills: Vec<Fill> = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while fills.len() < max_batch && i < bids.len() && j < asks.len() {
        if bids[i].price < asks[j].price {
            debug!(
                bid_price = %bids[i].price,
                ask_price = %asks[j].price,
                "no further crossings possible"
            );
            break;
        }

        // A drained or malformed working amount cannot fill; skip the
        // order rather than aborting the batch.
        if bids[i].make_amount.is_exhausted() {
            warn!(maker = %bids[i].maker, "skipping bid with non-positive make amount");
            i += 1;
            continue;
        }
        if asks[j].take_amount.is_exhausted() {
            warn!(maker = %asks[j].maker, "skipping ask with non-positive take amount");
            j += 1;
            continue;
        }

        let quantity = min_quantity(bids[i].make_amount, asks[j].take_amount);
        debug!(
            bid_maker = %bids[i].maker,
            ask_maker = %asks[j].maker,
            quantity = %quantity,
            "crossing bid against ask"
        );

        // Hashes are taken from the orders' current state, so a second
        // fill against a partially drained order commits its residual.
        fills.push(Fill::new(
            bids[i].canonical_hash(),
            asks[j].canonical_hash(),
            quantity,
        ));

        bids[i].make_amount = (bids[i].make_amount - quantity).quantize();
        asks[j].take_amount = (asks[j].take_amount - quantity).quantize();

        if bids[i].make_amount.is_exhausted() {
            i += 1;
        }
        if asks[j].take_amount.is_exhausted() {
            j += 1;
        }
    }

    if fills.is_empty() {
        info!("no matches found, book unchanged");
        return Ok(MatchOutcome {
            batch: None,
            remaining: orders,
        });
    }

    // Indices only ever advance past exhausted orders, so the partially
    // filled bid at `i` and ask at `j` are still in range here.
    let mut remaining: Vec<Order> = Vec::with_capacity(bids.len() - i + asks.len() - j);
    remaining.extend(
        bids.into_iter()
            .skip(i)
            .filter(|order| !order.make_amount.is_exhausted()),
    );
    remaining.extend(
        asks.into_iter()
            .skip(j)
            .filter(|order| !order.take_amount.is_exhausted()),
    );

    let root = merkle_root(&fills)?;
    let batch = Batch { root, fills };

    info!(
        fills = batch.fills.len(),
        remaining = remaining.len(),
        root = %batch.root_hex(),
        "matching run complete"
    );

    Ok(MatchOutcome {
        batch: Some(batch),
        remaining,
    })
}
