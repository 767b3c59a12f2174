//! Shared domain types for the sequencer
//!
//! Orders, fills, batches, and the fixed-point numeric newtypes every
//! service builds on. The canonical hash recipes here are wire contracts:
//! the on-chain dispute verifier reconstructs the same order hash, leaf
//! hash, and price rendering.

pub mod errors;
pub mod fill;
pub mod numeric;
pub mod order;

pub use errors::OrderError;
pub use fill::{Batch, Fill};
pub use numeric::{Price, Quantity};
pub use order::{Order, Side};
