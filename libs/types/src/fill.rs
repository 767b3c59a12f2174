//! Fills and batches
//!
//! A fill pairs one bid with one ask for a matched quantity. Fills are
//! value-typed and never mutated; their leaf hash and the batch root are
//! the compatibility contract with the on-chain dispute verifier.

use crate::numeric::Quantity;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A single matched-quantity record
///
/// Field order is the canonical wire order for the serialized manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fill {
    /// Canonical hash of the bid at fill time
    pub maker_hash: String,
    /// Canonical hash of the ask at fill time
    pub taker_hash: String,
    /// Matched quantity, eight fractional digits
    pub quantity: String,
}

impl Fill {
    /// Create a fill, rendering the quantity canonically.
    pub fn new(maker_hash: String, taker_hash: String, quantity: Quantity) -> Self {
        Self {
            maker_hash,
            taker_hash,
            quantity: quantity.to_canonical(),
        }
    }

    /// Merkle leaf: SHA-256 over `makerHash:takerHash:quantity` (ASCII).
    pub fn leaf_hash(&self) -> [u8; 32] {
        let preimage = format!("{}:{}:{}", self.maker_hash, self.taker_hash, self.quantity);
        Sha256::digest(preimage.as_bytes()).into()
    }
}

/// One matcher run's output: an ordered fill sequence committed by a root
///
/// Owned by the submitter once produced; never destroyed, only confirmed
/// on chain or parked in the failed queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Merkle root over the fill leaves
    pub root: [u8; 32],
    /// Fills in matcher-emission order
    pub fills: Vec<Fill>,
}

impl Batch {
    /// Root as lowercase hex.
    pub fn root_hex(&self) -> String {
        hex::encode(self.root)
    }

    /// Canonical manifest bytes shipped on chain: a UTF-8 JSON array of
    /// fills in emission order with stable field order.
    pub fn manifest_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.fills)
    }
}
