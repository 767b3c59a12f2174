//! Chain client abstraction and JSON-RPC transport
//!
//! The pipeline only ever makes five calls against a node; they are modeled
//! as a trait so tests can run against a programmable chain and production
//! against any JSON-RPC endpoint.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;

/// Per-connection deadline for the JSON-RPC transport.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Chain RPC failures; all retryable at the pipeline level
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("node error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Gas-estimation call shape
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

/// The slice of a transaction receipt the pipeline cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    /// False when the transaction reverted
    pub status: bool,
    pub block_number: u64,
    pub gas_used: u64,
}

/// The five node calls the submission pipeline makes
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Pending-state nonce for the sender account.
    async fn pending_nonce(&self, account: Address) -> Result<u64, RpcError>;

    /// Gas estimate for the settlement call.
    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, RpcError>;

    /// Node-suggested gas price in wei.
    async fn gas_price(&self) -> Result<U256, RpcError>;

    /// Chain identifier for transaction signing.
    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// Broadcast a signed raw transaction, returning its hash.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError>;

    /// Receipt lookup; None while the transaction is unmined.
    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>, RpcError>;
}

/// JSON-RPC 2.0 client over HTTP
pub struct HttpChainClient {
    http: Client,
    url: String,
    request_id: AtomicU64,
}

impl HttpChainClient {
    /// Build a client for the given endpoint.
    pub fn connect(url: impl Into<String>) -> Result<Self, RpcError> {
        let http = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            http,
            url: url.into(),
            request_id: AtomicU64::new(1),
        })
    }

    /// JSON-RPC call whose result may legitimately be null.
    async fn call_optional<R: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<R>, RpcError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.request_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let envelope: RpcEnvelope<R> = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = envelope.error {
            return Err(RpcError::Node {
                code: error.code,
                message: error.message,
            });
        }
        Ok(envelope.result)
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<R, RpcError> {
        self.call_optional(method, params).await?.ok_or_else(|| {
            RpcError::Malformed(format!("{method} returned neither result nor error"))
        })
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    async fn pending_nonce(&self, account: Address) -> Result<u64, RpcError> {
        let hex: String = self
            .call(
                "eth_getTransactionCount",
                json!([account.to_string(), "pending"]),
            )
            .await?;
        parse_hex_u64(&hex)
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, RpcError> {
        let hex: String = self
            .call(
                "eth_estimateGas",
                json!([{
                    "from": call.from.to_string(),
                    "to": call.to.to_string(),
                    "data": call.data.to_string(),
                }]),
            )
            .await?;
        parse_hex_u64(&hex)
    }

    async fn gas_price(&self) -> Result<U256, RpcError> {
        let hex: String = self.call("eth_gasPrice", json!([])).await?;
        parse_hex_u256(&hex)
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        let hex: String = self.call("eth_chainId", json!([])).await?;
        parse_hex_u64(&hex)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError> {
        let hash: String = self
            .call(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(raw))]),
            )
            .await?;
        hash.parse::<B256>()
            .map_err(|err| RpcError::Malformed(format!("bad transaction hash {hash}: {err}")))
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>, RpcError> {
        // An unmined transaction has a null receipt, not an error.
        let raw: Option<RawReceipt> = self
            .call_optional("eth_getTransactionReceipt", json!([tx_hash.to_string()]))
            .await?;
        raw.map(RawReceipt::into_receipt).transpose()
    }
}

#[derive(Deserialize)]
struct RpcEnvelope<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    status: Option<String>,
    block_number: Option<String>,
    gas_used: Option<String>,
}

impl RawReceipt {
    fn into_receipt(self) -> Result<TxReceipt, RpcError> {
        // Pre-Byzantium receipts carry no status; treat them as success.
        let status = match self.status {
            Some(hex) => parse_hex_u64(&hex)? != 0,
            None => true,
        };
        let block_number = match self.block_number {
            Some(hex) => parse_hex_u64(&hex)?,
            None => 0,
        };
        let gas_used = match self.gas_used {
            Some(hex) => parse_hex_u64(&hex)?,
            None => 0,
        };
        Ok(TxReceipt {
            status,
            block_number,
            gas_used,
        })
    }
}

fn parse_hex_u64(raw: &str) -> Result<u64, RpcError> {
    let trimmed = raw.trim_start_matches("0x");
    u64::from_str_radix(trimmed, 16)
        .map_err(|err| RpcError::Malformed(format!("bad hex quantity {raw}: {err}")))
}

fn parse_hex_u256(raw: &str) -> Result<U256, RpcError> {
    let trimmed = raw.trim_start_matches("0x");
    U256::from_str_radix(trimmed, 16)
        .map_err(|err| RpcError::Malformed(format!("bad hex quantity {raw}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_quantities() {
        assert_eq!(parse_hex_u64("0x0").unwrap(), 0);
        assert_eq!(parse_hex_u64("0x15").unwrap(), 21);
        assert!(parse_hex_u64("0xzz").is_err());

        assert_eq!(
            parse_hex_u256("0x4a817c800").unwrap(),
            U256::from(20_000_000_000u64)
        );
    }

    #[test]
    fn test_receipt_status_decoding() {
        let reverted = RawReceipt {
            status: Some("0x0".to_string()),
            block_number: Some("0x10".to_string()),
            gas_used: Some("0x5208".to_string()),
        };
        let receipt = reverted.into_receipt().unwrap();
        assert!(!receipt.status);
        assert_eq!(receipt.block_number, 16);
        assert_eq!(receipt.gas_used, 21000);

        let legacy = RawReceipt {
            status: None,
            block_number: None,
            gas_used: None,
        };
        assert!(legacy.into_receipt().unwrap().status);
    }
}
