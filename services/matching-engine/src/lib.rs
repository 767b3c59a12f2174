//! Matching Engine Service
//!
//! Price-time priority matching over an admission-ordered book.
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced (price, timestamp, admission order)
//! - Deterministic matching (same snapshot → byte-identical root and manifest)
//! - Conservation of quantity across partial fills
//! - Fill count bounded by the batch ceiling

pub mod book;
pub mod classify;
pub mod matcher;

pub use book::OrderBook;
pub use matcher::{match_and_batch, MatchError, MatchOutcome};
