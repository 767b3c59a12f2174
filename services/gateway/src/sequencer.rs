//! Ingress coordinator
//!
//! Owns the order book. Admission, matching, and the book swap happen
//! under one synchronous mutex; signing and chain submission are handed to
//! the async path so ingress is never blocked on network I/O and the lock
//! is never held across an await.

use commitment::{BatchLog, SignError, ThresholdSigner};
use matching_engine::{match_and_batch, MatchError, OrderBook};
use std::sync::{Arc, Mutex};
use submitter::{BatchSubmitter, ChainClient, SubmitError};
use thiserror::Error;
use tracing::debug;
use types::{Batch, Order, OrderError};

/// Admission-time failures, reported to the HTTP caller
#[derive(Error, Debug)]
pub enum AdmitError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Match(#[from] MatchError),
}

/// Failures on the async sign/submit path
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("signing failed: {0}")]
    Sign(#[from] SignError),

    #[error("manifest serialization failed: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("submission failed: {0}")]
    Submit(#[from] SubmitError),
}

/// Coordinator tying the book, matcher, signer, and submitter together
pub struct Sequencer<C> {
    book: Mutex<OrderBook>,
    signer: ThresholdSigner,
    submitter: Arc<BatchSubmitter<C>>,
    batch_log: BatchLog,
    max_batch: usize,
}

impl<C: ChainClient> Sequencer<C> {
    pub fn new(signer: ThresholdSigner, submitter: BatchSubmitter<C>, max_batch: usize) -> Self {
        Self {
            book: Mutex::new(OrderBook::new()),
            signer,
            submitter: Arc::new(submitter),
            batch_log: BatchLog::new(),
            max_batch,
        }
    }

    /// Admit an order and run the matcher over the updated book.
    ///
    /// The whole critical section is synchronous: append, match, swap in
    /// the remaining orders. A produced batch is recorded in the lifecycle
    /// log and returned for the caller to seal and submit outside the lock.
    pub fn admit(&self, order: Order) -> Result<Option<Batch>, AdmitError> {
        let batch = {
            let mut book = self.book.lock().expect("order book mutex poisoned");
            book.admit(order)?;
            debug!(book_size = book.len(), "order admitted");

            let outcome = match_and_batch(book.snapshot(), self.max_batch)?;
            book.replace(outcome.remaining);
            outcome.batch
        };

        if let Some(batch) = &batch {
            self.batch_log.record(batch.root, batch.fills.len());
        }
        Ok(batch)
    }

    /// Aggregate the operator signature and submit the batch on chain.
    ///
    /// The lifecycle log transitions to settled on success and to parked
    /// when the submitter exhausts its retries.
    pub async fn seal_and_submit(&self, batch: Batch) -> Result<String, PipelineError> {
        let agg_sig = self.signer.aggregate(&batch.root)?;
        let manifest = batch.manifest_bytes()?;

        match self.submitter.submit(batch.root, manifest, agg_sig).await {
            Ok(tx_id) => {
                self.batch_log.mark_settled(&batch.root, &tx_id);
                Ok(tx_id)
            }
            Err(err) => {
                if matches!(err, SubmitError::Exhausted { .. }) {
                    self.batch_log.mark_parked(&batch.root);
                }
                Err(err.into())
            }
        }
    }

    /// Live order count, for observability.
    pub fn book_size(&self) -> usize {
        self.book.lock().expect("order book mutex poisoned").len()
    }

    /// Copy of the resting orders, for external observers.
    pub fn book_snapshot(&self) -> Vec<Order> {
        self.book
            .lock()
            .expect("order book mutex poisoned")
            .snapshot()
    }

    /// The batch submitter (and through it, the failed queue).
    pub fn submitter(&self) -> &Arc<BatchSubmitter<C>> {
        &self.submitter
    }

    /// Lifecycle history of every committed batch.
    pub fn batch_log(&self) -> &BatchLog {
        &self.batch_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, keccak256, Address, B256, U256};
    use async_trait::async_trait;
    use std::time::Duration;
    use submitter::{CallRequest, RpcError, SubmitterConfig, TxReceipt, TxSigner};
    use types::{Price, Quantity};

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    /// Always-accepting chain stub
    struct AcceptingChain;

    #[async_trait]
    impl ChainClient for AcceptingChain {
        async fn pending_nonce(&self, _account: Address) -> Result<u64, RpcError> {
            Ok(0)
        }
        async fn estimate_gas(&self, _call: &CallRequest) -> Result<u64, RpcError> {
            Ok(100_000)
        }
        async fn gas_price(&self) -> Result<U256, RpcError> {
            Ok(U256::from(1_000_000_000u64))
        }
        async fn chain_id(&self) -> Result<u64, RpcError> {
            Ok(31337)
        }
        async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, RpcError> {
            Ok(keccak256(raw))
        }
        async fn transaction_receipt(&self, _tx: B256) -> Result<Option<TxReceipt>, RpcError> {
            Ok(Some(TxReceipt {
                status: true,
                block_number: 1,
                gas_used: 90_000,
            }))
        }
    }

    fn test_sequencer() -> Sequencer<AcceptingChain> {
        let mut config =
            SubmitterConfig::new(address!("5FbDB2315678afecb367f032d93F642f64180aa3"));
        config.backoff = Duration::from_millis(1);
        config.poll_interval = Duration::from_millis(1);
        config.confirm_timeout = Duration::from_millis(20);

        let submitter =
            BatchSubmitter::new(AcceptingChain, TxSigner::from_hex(DEV_KEY).unwrap(), config);
        Sequencer::new(ThresholdSigner::mock(), submitter, 100)
    }

    fn order(maker: &str, make: &str, take: &str, price: &str, ts: i64) -> Order {
        Order {
            maker: maker.to_string(),
            taker_asset: "0xTOKEN1".to_string(),
            make_amount: Quantity::from_str(make).unwrap(),
            take_amount: Quantity::from_str(take).unwrap(),
            price: Price::from_str(price).unwrap(),
            timestamp: ts,
            signature: format!("0xsig_{maker}"),
            side: None,
            admitted_seq: 0,
        }
    }

    #[test]
    fn test_single_order_rests_without_batch() {
        let sequencer = test_sequencer();
        let batch = sequencer.admit(order("0xa", "1000", "600", "0.60", 1)).unwrap();
        assert!(batch.is_none());
        assert_eq!(sequencer.book_size(), 1);
    }

    #[test]
    fn test_invalid_order_is_rejected() {
        let sequencer = test_sequencer();
        let mut bad = order("0xa", "1000", "600", "0.60", 1);
        bad.maker = String::new();

        assert!(matches!(
            sequencer.admit(bad),
            Err(AdmitError::Order(OrderError::EmptyField { field: "maker" }))
        ));
        assert_eq!(sequencer.book_size(), 0);
    }

    #[test]
    fn test_crossing_admission_produces_batch_and_prunes_book() {
        let sequencer = test_sequencer();
        assert!(sequencer.admit(order("0xa", "500", "300", "0.60", 1)).unwrap().is_none());

        let batch = sequencer
            .admit(order("0xb", "200", "500", "0.50", 2))
            .unwrap()
            .expect("crossing orders must batch");

        assert_eq!(batch.fills.len(), 1);
        assert_eq!(batch.fills[0].quantity, "500.00000000");
        // Both sides drained completely.
        assert_eq!(sequencer.book_size(), 0);
    }

    #[tokio::test]
    async fn test_seal_and_submit_returns_transaction_id() {
        let sequencer = test_sequencer();
        sequencer.admit(order("0xa", "500", "300", "0.60", 1)).unwrap();
        let batch = sequencer
            .admit(order("0xb", "200", "500", "0.50", 2))
            .unwrap()
            .expect("crossing orders must batch");

        let tx_id = sequencer.seal_and_submit(batch).await.unwrap();
        assert!(tx_id.starts_with("0x"));
        assert_eq!(tx_id.len(), 66);
        assert_eq!(sequencer.submitter().failed_batches().count(), 0);
    }

    /// Chain stub whose gas estimation always fails
    struct RejectingChain;

    #[async_trait]
    impl ChainClient for RejectingChain {
        async fn pending_nonce(&self, _account: Address) -> Result<u64, RpcError> {
            Ok(0)
        }
        async fn estimate_gas(&self, _call: &CallRequest) -> Result<u64, RpcError> {
            Err(RpcError::Node {
                code: -32000,
                message: "execution would fail".to_string(),
            })
        }
        async fn gas_price(&self) -> Result<U256, RpcError> {
            Ok(U256::from(1_000_000_000u64))
        }
        async fn chain_id(&self) -> Result<u64, RpcError> {
            Ok(31337)
        }
        async fn send_raw_transaction(&self, _raw: &[u8]) -> Result<B256, RpcError> {
            Ok(B256::ZERO)
        }
        async fn transaction_receipt(&self, _tx: B256) -> Result<Option<TxReceipt>, RpcError> {
            Ok(None)
        }
    }

    #[test]
    fn test_committed_batch_is_logged() {
        let sequencer = test_sequencer();
        sequencer.admit(order("0xa", "500", "300", "0.60", 1)).unwrap();
        let batch = sequencer
            .admit(order("0xb", "200", "500", "0.50", 2))
            .unwrap()
            .expect("crossing orders must batch");

        assert_eq!(sequencer.batch_log().len(), 1);
        assert_eq!(sequencer.batch_log().latest_root(), Some(batch.root));
        assert_eq!(
            sequencer.batch_log().history()[0].status,
            commitment::BatchStatus::Submitted
        );
    }

    #[tokio::test]
    async fn test_settled_batch_transitions_in_log() {
        let sequencer = test_sequencer();
        sequencer.admit(order("0xa", "500", "300", "0.60", 1)).unwrap();
        let batch = sequencer
            .admit(order("0xb", "200", "500", "0.50", 2))
            .unwrap()
            .expect("crossing orders must batch");

        let tx_id = sequencer.seal_and_submit(batch).await.unwrap();

        match &sequencer.batch_log().history()[0].status {
            commitment::BatchStatus::Settled { tx_id: logged } => assert_eq!(logged, &tx_id),
            other => panic!("expected settled status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_exhausted_batch_is_parked_in_log_and_queue() {
        let mut config =
            SubmitterConfig::new(address!("5FbDB2315678afecb367f032d93F642f64180aa3"));
        config.backoff = Duration::from_millis(1);
        config.poll_interval = Duration::from_millis(1);
        config.confirm_timeout = Duration::from_millis(5);
        let submitter =
            BatchSubmitter::new(RejectingChain, TxSigner::from_hex(DEV_KEY).unwrap(), config);
        let sequencer = Sequencer::new(ThresholdSigner::mock(), submitter, 100);

        sequencer.admit(order("0xa", "500", "300", "0.60", 1)).unwrap();
        let batch = sequencer
            .admit(order("0xb", "200", "500", "0.50", 2))
            .unwrap()
            .expect("crossing orders must batch");

        let err = sequencer.seal_and_submit(batch).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Submit(SubmitError::Exhausted { .. })
        ));
        assert_eq!(sequencer.submitter().failed_batches().count(), 1);
        assert_eq!(
            sequencer.batch_log().history()[0].status,
            commitment::BatchStatus::Parked
        );
    }

    #[test]
    fn test_concurrent_admission_keeps_book_consistent() {
        use std::thread;

        let sequencer = Arc::new(test_sequencer());

        let handles: Vec<_> = (0..4u64)
            .map(|worker| {
                let sequencer = sequencer.clone();
                thread::spawn(move || {
                    for i in 0..50u64 {
                        let maker = format!("0xw{worker}o{i}");
                        // Alternate sides so the workers keep crossing.
                        let price = if i % 2 == 0 { "0.60" } else { "0.50" };
                        let ts = (worker * 1000 + i + 1) as i64;
                        sequencer
                            .admit(order(&maker, "10", "10", price, ts))
                            .expect("well-formed order must admit");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // Whatever interleaving happened, every surviving order carries a
        // usable residual and the matcher produced at least one batch.
        for resting in sequencer.book_snapshot() {
            assert!(!resting.make_amount.is_exhausted());
        }
        assert!(sequencer.batch_log().len() > 0);
    }

    #[test]
    fn test_residuals_survive_into_next_admission() {
        let sequencer = test_sequencer();
        sequencer.admit(order("0xa", "1000", "600", "0.60", 1)).unwrap();
        let batch = sequencer
            .admit(order("0xb", "200", "400", "0.50", 2))
            .unwrap()
            .expect("crossing orders must batch");

        assert_eq!(batch.fills[0].quantity, "400.00000000");
        // The bid's residual (600) stays live for the next run.
        assert_eq!(sequencer.book_size(), 1);
    }
}
