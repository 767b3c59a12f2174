//! Batch commitment: Merkle roots and operator threshold signatures
//!
//! The commitment pipeline sits between the matcher and the submitter: a
//! batch of fills is committed by a Merkle root, and an operator quorum
//! signs that root so the settlement contract can verify the batch came
//! from the operator set.

pub mod merkle;
pub mod signer;
pub mod store;

pub use merkle::merkle_root;
pub use signer::{is_mock_signature, ThresholdSigner, MOCK_SIGNATURE_PREFIX};
pub use store::{BatchLog, BatchRecord, BatchStatus};

use thiserror::Error;

/// Merkle construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    #[error("cannot compute merkle root for empty fill set")]
    EmptyBatch,
}

/// Threshold signing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("no valid signatures collected from {operators} operators")]
    EmptyQuorum { operators: usize },

    #[error("failed to aggregate operator signatures: {0}")]
    Aggregation(String),
}
