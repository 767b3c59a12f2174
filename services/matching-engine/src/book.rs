//! In-memory order book
//!
//! The wire order carries no side field, so the book cannot keep separate
//! bid/ask containers at rest; it stores live orders in admission order and
//! the matcher derives sides on each run. The admission sequence number is
//! the final price-time tie-break and survives `replace`.

use types::{Order, OrderError};

/// Admission-ordered store of live orders
#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    orders: Vec<Order>,
    next_seq: u64,
}

impl OrderBook {
    /// Create a new empty book
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append an order, stamping its admission sequence.
    pub fn admit(&mut self, mut order: Order) -> Result<(), OrderError> {
        order.validate()?;
        order.admitted_seq = self.next_seq;
        self.next_seq += 1;
        self.orders.push(order);
        Ok(())
    }

    /// Copy of the live order set, in admission order.
    pub fn snapshot(&self) -> Vec<Order> {
        self.orders.clone()
    }

    /// Overwrite the live order set with a matcher's remaining orders.
    ///
    /// The sequence counter is not reset; re-admitted residuals keep their
    /// original priority and new orders sort after them.
    pub fn replace(&mut self, orders: Vec<Order>) {
        self.orders = orders;
    }

    /// Number of live orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// True when no orders are resting.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}
