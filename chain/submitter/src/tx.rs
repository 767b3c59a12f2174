//! Settlement call encoding and transaction signing
//!
//! Legacy (EIP-155) transactions are enough for the settlement contract;
//! the call data is the ABI encoding of `submitBatch(bytes32,bytes,bytes)`.

use alloy_primitives::{keccak256, Address, Bytes, U256};
use alloy_rlp::{Encodable, Header};
use alloy_sol_types::{sol, SolCall};
use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use thiserror::Error;

sol! {
    /// Settlement entry point exposed by the batch settlement contract.
    function submitBatch(bytes32 root, bytes fills, bytes aggSig);
}

/// ABI-encode the settlement call for a committed batch.
pub fn encode_submit_batch(root: [u8; 32], fills: &[u8], agg_sig: &[u8]) -> Vec<u8> {
    submitBatchCall {
        root: root.into(),
        fills: Bytes::copy_from_slice(fills),
        aggSig: Bytes::copy_from_slice(agg_sig),
    }
    .abi_encode()
}

/// Transaction signing failures; fatal at startup, per-attempt afterwards
#[derive(Error, Debug)]
pub enum SignerError {
    #[error("private key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

/// Sender key plus its derived account address
pub struct TxSigner {
    key: SigningKey,
    address: Address,
}

impl TxSigner {
    /// Load the sender key from hex (with or without 0x prefix).
    pub fn from_hex(raw: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(raw.trim().trim_start_matches("0x"))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|err| SignerError::InvalidKey(err.to_string()))?;
        let address = derive_address(&key);
        Ok(Self { key, address })
    }

    /// Sender account address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a legacy transaction, returning the raw RLP for broadcast.
    pub fn sign_transaction(&self, tx: &LegacyTransaction) -> Result<Vec<u8>, SignerError> {
        let sighash = keccak256(tx.rlp_unsigned());
        let (signature, recovery) = self
            .key
            .sign_prehash_recoverable(sighash.as_slice())
            .map_err(|err| SignerError::Signing(err.to_string()))?;
        let (signature, recovery) = normalize_signature(signature, recovery)?;

        let v = tx.chain_id * 2 + 35 + u64::from(recovery.to_byte());
        let r = U256::from_be_slice(&signature.r().to_bytes());
        let s = U256::from_be_slice(&signature.s().to_bytes());

        Ok(tx.rlp_signed(v, r, s))
    }
}

/// Chain consensus only accepts low-s signatures; flip the recovery parity
/// when normalization changes s.
fn normalize_signature(
    signature: Signature,
    recovery: RecoveryId,
) -> Result<(Signature, RecoveryId), SignerError> {
    match signature.normalize_s() {
        Some(normalized) => {
            let flipped = RecoveryId::from_byte(recovery.to_byte() ^ 1)
                .ok_or_else(|| SignerError::Signing("recovery id out of range".to_string()))?;
            Ok((normalized, flipped))
        }
        None => Ok((signature, recovery)),
    }
}

fn derive_address(key: &SigningKey) -> Address {
    let point = key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// Pre-EIP-1559 transaction shape, sufficient for the settlement call
#[derive(Debug, Clone)]
pub struct LegacyTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

impl LegacyTransaction {
    fn encode_common_fields(&self, out: &mut Vec<u8>) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.to.encode(out);
        self.value.encode(out);
        self.data.encode(out);
    }

    /// EIP-155 signing payload: the common fields plus (chain_id, 0, 0).
    pub fn rlp_unsigned(&self) -> Vec<u8> {
        let mut payload = Vec::new();
        self.encode_common_fields(&mut payload);
        self.chain_id.encode(&mut payload);
        0u8.encode(&mut payload);
        0u8.encode(&mut payload);
        wrap_in_list(payload)
    }

    /// Broadcast payload: the common fields plus (v, r, s).
    pub fn rlp_signed(&self, v: u64, r: U256, s: U256) -> Vec<u8> {
        let mut payload = Vec::new();
        self.encode_common_fields(&mut payload);
        v.encode(&mut payload);
        r.encode(&mut payload);
        s.encode(&mut payload);
        wrap_in_list(payload)
    }
}

fn wrap_in_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(&payload);
    out
}
