//! Failed batch queue
//!
//! Process-lifetime parking lot for batches that exhausted their retries.
//! The lock is only ever held for snapshot, append, and removal; network
//! I/O happens strictly outside it. Durable storage is a known gap.

use std::sync::Mutex;
use std::time::SystemTime;

/// A batch whose submission exhausted all retry attempts
#[derive(Debug, Clone)]
pub struct FailedBatch {
    pub root: [u8; 32],
    pub fills: Vec<u8>,
    pub sig: Vec<u8>,
    /// When the batch first exhausted its retries
    pub first_failure: SystemTime,
    /// Attempts consumed before parking
    pub attempts: u32,
}

/// Ordered, mutex-guarded queue of failed batches
#[derive(Debug, Default)]
pub struct FailedQueue {
    inner: Mutex<Vec<FailedBatch>>,
}

impl FailedQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch; returns the new queue length.
    pub fn enqueue(&self, batch: FailedBatch) -> usize {
        let mut queue = self.inner.lock().expect("failed queue mutex poisoned");
        queue.push(batch);
        queue.len()
    }

    /// Number of parked batches.
    pub fn count(&self) -> usize {
        self.inner.lock().expect("failed queue mutex poisoned").len()
    }

    /// Copy of the queue for inspection or a retry pass.
    pub fn snapshot(&self) -> Vec<FailedBatch> {
        self.inner
            .lock()
            .expect("failed queue mutex poisoned")
            .clone()
    }

    /// Remove all parked batches; returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut queue = self.inner.lock().expect("failed queue mutex poisoned");
        let count = queue.len();
        queue.clear();
        count
    }

    /// Remove entries by their snapshot indices, iterating in reverse so
    /// earlier removals do not shift later ones.
    pub(crate) fn remove_indices(&self, ascending_indices: &[usize]) {
        if ascending_indices.is_empty() {
            return;
        }
        let mut queue = self.inner.lock().expect("failed queue mutex poisoned");
        for &index in ascending_indices.iter().rev() {
            if index < queue.len() {
                queue.remove(index);
            }
        }
    }
}
