//! Batch submission pipeline
//!
//! One submitter instance per sender account; concurrent sends from the
//! same account would race on the nonce. Each attempt runs the full
//! assemble/sign/broadcast/confirm sequence; attempts are retried with a
//! linear back-off, and a batch that exhausts its retries is parked in the
//! failed queue rather than dropped.

use alloy_primitives::{Address, B256, U256};
use std::time::{Duration, SystemTime};
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::failed_queue::{FailedBatch, FailedQueue};
use crate::rpc::{CallRequest, ChainClient, RpcError, TxReceipt};
use crate::tx::{encode_submit_batch, LegacyTransaction, SignerError, TxSigner};

/// Gas price used when the node's suggestion query fails (20 Gwei).
pub const DEFAULT_GAS_PRICE_WEI: u64 = 20_000_000_000;

/// Submission failures
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("rpc failure: {0}")]
    Rpc(#[from] RpcError),

    #[error("signer failure: {0}")]
    Signer(#[from] SignerError),

    #[error("transaction {tx_hash} reverted")]
    Reverted { tx_hash: String },

    #[error("batch submission failed after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

/// Pipeline tuning knobs
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Settlement contract address
    pub contract: Address,
    /// Attempts per submission, minimum 1
    pub max_retries: u32,
    /// Base back-off; the sleep before attempt k+1 is `backoff * k`
    pub backoff: Duration,
    /// Wall-clock bound on the mining wait per attempt
    pub confirm_timeout: Duration,
    /// Receipt polling cadence during the mining wait
    pub poll_interval: Duration,
}

impl SubmitterConfig {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            max_retries: 5,
            backoff: Duration::from_millis(200),
            confirm_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Outcome of a retry pass over the failed queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryReport {
    pub succeeded: usize,
    pub failed: usize,
    pub remaining: usize,
}

/// Transactional submitter for committed batches
pub struct BatchSubmitter<C> {
    chain: C,
    signer: TxSigner,
    config: SubmitterConfig,
    failed: FailedQueue,
}

enum WaitOutcome {
    Mined(TxReceipt),
    TimedOut,
    PollFailed(RpcError),
}

impl<C: ChainClient> BatchSubmitter<C> {
    pub fn new(chain: C, signer: TxSigner, config: SubmitterConfig) -> Self {
        info!(
            contract = %config.contract,
            sender = %signer.address(),
            max_retries = config.max_retries,
            backoff_ms = config.backoff.as_millis() as u64,
            "submitter initialized"
        );
        Self {
            chain,
            signer,
            config,
            failed: FailedQueue::new(),
        }
    }

    /// The failed-batch queue owned by this submitter.
    pub fn failed_batches(&self) -> &FailedQueue {
        &self.failed
    }

    /// The underlying chain client.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Submit a committed batch, retrying with linear back-off.
    ///
    /// On exhaustion the batch is parked in the failed queue and an error
    /// returned; the caller can drain the queue later via `retry_failed`.
    pub async fn submit(
        &self,
        root: [u8; 32],
        fills: Vec<u8>,
        agg_sig: Vec<u8>,
    ) -> Result<String, SubmitError> {
        info!(
            root = %hex::encode(root),
            fills_len = fills.len(),
            sig_len = agg_sig.len(),
            "submitting batch"
        );

        for attempt in 1..=self.config.max_retries {
            match self.attempt_submit(&root, &fills, &agg_sig).await {
                Ok(tx_id) => {
                    info!(attempt, tx = %tx_id, "batch submitted");
                    return Ok(tx_id);
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max = self.config.max_retries,
                        %err,
                        "submission attempt failed"
                    );
                    if attempt < self.config.max_retries {
                        sleep(self.config.backoff * attempt).await;
                    }
                }
            }
        }

        let queue_len = self.failed.enqueue(FailedBatch {
            root,
            fills,
            sig: agg_sig,
            first_failure: SystemTime::now(),
            attempts: self.config.max_retries,
        });
        error!(
            root = %hex::encode(root),
            attempts = self.config.max_retries,
            queue_len,
            "batch exhausted retries, parked in failed queue"
        );

        Err(SubmitError::Exhausted {
            attempts: self.config.max_retries,
        })
    }

    /// One retry pass over the failed queue.
    ///
    /// Works on a snapshot so the lock is never held across network I/O;
    /// successful entries are removed by original index afterwards.
    pub async fn retry_failed(&self) -> RetryReport {
        let batches = self.failed.snapshot();
        if batches.is_empty() {
            info!("no failed batches to retry");
            return RetryReport {
                succeeded: 0,
                failed: 0,
                remaining: 0,
            };
        }

        info!(count = batches.len(), "retrying failed batches");
        let mut succeeded_indices: Vec<usize> = Vec::new();

        for (index, batch) in batches.iter().enumerate() {
            let mut succeeded = false;
            for attempt in 1..=self.config.max_retries {
                match self.attempt_submit(&batch.root, &batch.fills, &batch.sig).await {
                    Ok(tx_id) => {
                        info!(
                            root = %hex::encode(batch.root),
                            tx = %tx_id,
                            "retry succeeded"
                        );
                        succeeded = true;
                        break;
                    }
                    Err(err) => {
                        warn!(
                            root = %hex::encode(batch.root),
                            attempt,
                            %err,
                            "retry attempt failed"
                        );
                        if attempt < self.config.max_retries {
                            sleep(self.config.backoff * attempt).await;
                        }
                    }
                }
            }
            if succeeded {
                succeeded_indices.push(index);
            }
        }

        self.failed.remove_indices(&succeeded_indices);

        let report = RetryReport {
            succeeded: succeeded_indices.len(),
            failed: batches.len() - succeeded_indices.len(),
            remaining: self.failed.count(),
        };
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            remaining = report.remaining,
            "retry pass complete"
        );
        report
    }

    /// One full submission attempt.
    async fn attempt_submit(
        &self,
        root: &[u8; 32],
        fills: &[u8],
        agg_sig: &[u8],
    ) -> Result<String, SubmitError> {
        let data = encode_submit_batch(*root, fills, agg_sig);
        let from = self.signer.address();

        let nonce = self.chain.pending_nonce(from).await?;
        let estimate = self
            .chain
            .estimate_gas(&CallRequest {
                from,
                to: self.config.contract,
                data: data.clone().into(),
            })
            .await?;
        let gas_limit = with_gas_margin(estimate);

        let gas_price = match self.chain.gas_price().await {
            Ok(price) => price,
            Err(err) => {
                warn!(%err, "gas price query failed, using default");
                U256::from(DEFAULT_GAS_PRICE_WEI)
            }
        };

        let chain_id = self.chain.chain_id().await?;

        let tx = LegacyTransaction {
            chain_id,
            nonce,
            gas_price,
            gas_limit,
            to: self.config.contract,
            value: U256::ZERO,
            data: data.into(),
        };
        let raw = self.signer.sign_transaction(&tx)?;

        let tx_hash = self.chain.send_raw_transaction(&raw).await?;
        let tx_id = tx_hash.to_string();
        debug!(tx = %tx_id, nonce, gas_limit, "transaction broadcast");

        match self.wait_mined(tx_hash).await {
            WaitOutcome::Mined(receipt) if !receipt.status => {
                Err(SubmitError::Reverted { tx_hash: tx_id })
            }
            WaitOutcome::Mined(receipt) => {
                info!(
                    tx = %tx_id,
                    block = receipt.block_number,
                    gas_used = receipt.gas_used,
                    "transaction mined"
                );
                Ok(tx_id)
            }
            WaitOutcome::TimedOut => {
                // The transaction is in flight and may still confirm.
                warn!(tx = %tx_id, "mining wait timed out, returning broadcast hash");
                Ok(tx_id)
            }
            WaitOutcome::PollFailed(err) => {
                warn!(tx = %tx_id, %err, "could not wait for confirmation, returning broadcast hash");
                Ok(tx_id)
            }
        }
    }

    /// Poll for the receipt until mined or the per-attempt deadline passes.
    async fn wait_mined(&self, tx_hash: B256) -> WaitOutcome {
        let deadline = Instant::now() + self.config.confirm_timeout;
        loop {
            match self.chain.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => return WaitOutcome::Mined(receipt),
                Ok(None) => {}
                Err(err) => return WaitOutcome::PollFailed(err),
            }
            if Instant::now() >= deadline {
                return WaitOutcome::TimedOut;
            }
            sleep(self.config.poll_interval).await;
        }
    }
}

/// Apply the 20% gas safety margin, rounding up.
fn with_gas_margin(estimate: u64) -> u64 {
    estimate.saturating_mul(12).div_ceil(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gas_margin_rounds_up() {
        assert_eq!(with_gas_margin(100), 120);
        assert_eq!(with_gas_margin(101), 122); // 121.2 rounds up
        assert_eq!(with_gas_margin(1), 2);
        assert_eq!(with_gas_margin(0), 0);
    }

    #[test]
    fn test_config_defaults() {
        let config = SubmitterConfig::new(Address::ZERO);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.backoff, Duration::from_millis(200));
        assert_eq!(config.confirm_timeout, Duration::from_secs(120));
    }
}
