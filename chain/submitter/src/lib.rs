//! On-chain batch submission
//!
//! Takes a committed batch (root, fill manifest, aggregate signature) and
//! lands it in the settlement contract: nonce and gas management, legacy
//! transaction signing, broadcast, bounded confirmation wait, linear
//! back-off retries, and a failed-batch queue for anything that exhausts
//! its attempts.

pub mod failed_queue;
pub mod pipeline;
pub mod rpc;
pub mod tx;

pub use failed_queue::{FailedBatch, FailedQueue};
pub use pipeline::{
    BatchSubmitter, RetryReport, SubmitError, SubmitterConfig, DEFAULT_GAS_PRICE_WEI,
};
pub use rpc::{CallRequest, ChainClient, HttpChainClient, RpcError, TxReceipt};
pub use tx::{encode_submit_batch, LegacyTransaction, SignerError, TxSigner};
