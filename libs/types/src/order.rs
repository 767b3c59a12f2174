//! Signed limit orders and their canonical hash
//!
//! The wire format carries no side field; bids and asks are derived by the
//! matcher on each run. Clients that know their side may set the optional
//! `side` field, which never enters the canonical hash.

use crate::errors::OrderError;
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Order side within one matcher run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (offers make_amount, demands take_amount)
    Bid,
    /// Sell order
    Ask,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

/// A signed limit order as submitted by a maker
///
/// The signature is stored opaque; verification against the maker happens
/// upstream of admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Maker account, 20-byte hex on the wire
    pub maker: String,
    /// Asset the maker is willing to receive
    pub taker_asset: String,
    /// Quantity the maker offers
    pub make_amount: Quantity,
    /// Quantity the maker demands in return
    pub take_amount: Quantity,
    /// Limit price, a JSON number on the wire
    pub price: Price,
    /// Maker-assigned monotonic timestamp
    pub timestamp: i64,
    /// Opaque maker signature
    pub signature: String,
    /// Optional explicit side; absent for legacy clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<Side>,
    /// Admission sequence number, assigned by the book; final tie-break
    #[serde(skip)]
    pub admitted_seq: u64,
}

impl Order {
    /// Validate admission invariants: positive amounts, price, timestamp,
    /// non-empty string fields.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.maker.is_empty() {
            return Err(OrderError::EmptyField { field: "maker" });
        }
        if self.taker_asset.is_empty() {
            return Err(OrderError::EmptyField { field: "takerAsset" });
        }
        if self.signature.is_empty() {
            return Err(OrderError::EmptyField { field: "signature" });
        }
        if self.make_amount.is_zero() {
            return Err(OrderError::NonPositiveAmount { field: "makeAmount" });
        }
        if self.take_amount.is_zero() {
            return Err(OrderError::NonPositiveAmount { field: "takeAmount" });
        }
        if self.timestamp <= 0 {
            return Err(OrderError::InvalidTimestamp {
                timestamp: self.timestamp,
            });
        }
        Ok(())
    }

    /// Canonical hash, hex-encoded.
    ///
    /// SHA-256 over `maker:takerAsset:makeAmount:takeAmount:price:timestamp:signature`
    /// with the price rendered to exactly eight fractional digits. The
    /// optional side field is deliberately excluded so extended and legacy
    /// clients hash identically.
    pub fn canonical_hash(&self) -> String {
        let preimage = format!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.maker,
            self.taker_asset,
            self.make_amount,
            self.take_amount,
            self.price.to_canonical(),
            self.timestamp,
            self.signature,
        );
        hex::encode(Sha256::digest(preimage.as_bytes()))
    }
}
