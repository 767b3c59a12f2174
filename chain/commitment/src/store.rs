//! Batch lifecycle log
//!
//! Ordered history of every committed batch. Batches are never destroyed
//! once created; they only transition from submitted to settled or parked,
//! and the log is the audit trail operators read during a dispute window.

use std::sync::Mutex;
use std::time::SystemTime;

/// Lifecycle state of a committed batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchStatus {
    /// Signed and handed to the submitter
    Submitted,
    /// Landed on chain
    Settled { tx_id: String },
    /// Exhausted retries and parked in the failed queue
    Parked,
}

/// One committed batch and its current state
#[derive(Debug, Clone)]
pub struct BatchRecord {
    pub root: [u8; 32],
    pub fill_count: usize,
    pub committed_at: SystemTime,
    pub status: BatchStatus,
}

/// Mutex-guarded, append-only history of committed batches
#[derive(Debug, Default)]
pub struct BatchLog {
    records: Mutex<Vec<BatchRecord>>,
}

impl BatchLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly committed batch as submitted.
    pub fn record(&self, root: [u8; 32], fill_count: usize) {
        let mut records = self.records.lock().expect("batch log mutex poisoned");
        records.push(BatchRecord {
            root,
            fill_count,
            committed_at: SystemTime::now(),
            status: BatchStatus::Submitted,
        });
    }

    /// Transition the newest submitted record for `root` to settled.
    ///
    /// Returns false when no submitted record with that root exists.
    pub fn mark_settled(&self, root: &[u8; 32], tx_id: &str) -> bool {
        self.transition(root, BatchStatus::Settled {
            tx_id: tx_id.to_string(),
        })
    }

    /// Transition the newest submitted record for `root` to parked.
    pub fn mark_parked(&self, root: &[u8; 32]) -> bool {
        self.transition(root, BatchStatus::Parked)
    }

    fn transition(&self, root: &[u8; 32], status: BatchStatus) -> bool {
        let mut records = self.records.lock().expect("batch log mutex poisoned");
        for record in records.iter_mut().rev() {
            if record.root == *root && record.status == BatchStatus::Submitted {
                record.status = status;
                return true;
            }
        }
        false
    }

    /// Root of the most recently committed batch.
    pub fn latest_root(&self) -> Option<[u8; 32]> {
        self.records
            .lock()
            .expect("batch log mutex poisoned")
            .last()
            .map(|record| record.root)
    }

    /// Copy of the full history, oldest first.
    pub fn history(&self) -> Vec<BatchRecord> {
        self.records
            .lock()
            .expect("batch log mutex poisoned")
            .clone()
    }

    /// Number of batches ever committed.
    pub fn len(&self) -> usize {
        self.records.lock().expect("batch log mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
