//! Merkle root construction over fill leaves
//!
//! Bitcoin-style tree: pair-wise SHA-256 reduction, odd node duplicated at
//! each level. The dispute verifier reconstructs this exact shape, so the
//! padding rule must never change.

use sha2::{Digest, Sha256};
use types::Fill;

use crate::CommitError;

/// Compute the Merkle root over a non-empty fill sequence.
///
/// The root depends only on leaf bytes and order; an empty batch is an
/// error because there is nothing to commit.
pub fn merkle_root(fills: &[Fill]) -> Result<[u8; 32], CommitError> {
    if fills.is_empty() {
        return Err(CommitError::EmptyBatch);
    }

    let mut level: Vec<[u8; 32]> = fills.iter().map(Fill::leaf_hash).collect();

    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| {
                let left = pair[0];
                let right = pair.get(1).copied().unwrap_or(left);
                hash_pair(&left, &right)
            })
            .collect();
    }

    Ok(level[0])
}

/// Internal node: SHA-256 over the concatenation of both child hashes.
fn hash_pair(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
