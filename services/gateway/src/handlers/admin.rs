use crate::state::AppState;
use axum::{extract::State, Json};
use commitment::BatchStatus;
use serde_json::{json, Value};
use std::time::UNIX_EPOCH;
use tracing::info;

/// GET /batches: lifecycle history of every committed batch.
pub async fn batch_history(State(state): State<AppState>) -> Json<Value> {
    let records: Vec<Value> = state
        .sequencer
        .batch_log()
        .history()
        .iter()
        .map(|record| {
            let (status, tx_id) = match &record.status {
                BatchStatus::Submitted => ("submitted", None),
                BatchStatus::Settled { tx_id } => ("settled", Some(tx_id.clone())),
                BatchStatus::Parked => ("parked", None),
            };
            json!({
                "root": hex::encode(record.root),
                "fills": record.fill_count,
                "committedAt": unix_seconds(record.committed_at),
                "status": status,
                "txId": tx_id,
            })
        })
        .collect();

    Json(json!({"batches": records}))
}

/// GET /admin/failed-batches: inspect the failed queue.
pub async fn failed_batches(State(state): State<AppState>) -> Json<Value> {
    let queue = state.sequencer.submitter().failed_batches();
    let batches: Vec<Value> = queue
        .snapshot()
        .iter()
        .map(|batch| {
            json!({
                "root": hex::encode(batch.root),
                "attempts": batch.attempts,
                "firstFailure": unix_seconds(batch.first_failure),
                "fillsSize": batch.fills.len(),
                "signatureSize": batch.sig.len(),
            })
        })
        .collect();

    Json(json!({"count": queue.count(), "batches": batches}))
}

/// POST /admin/failed-batches/retry: one retry pass over the queue.
pub async fn retry_failed(State(state): State<AppState>) -> Json<Value> {
    let report = state.sequencer.submitter().retry_failed().await;
    Json(json!({
        "succeeded": report.succeeded,
        "failed": report.failed,
        "remaining": report.remaining,
    }))
}

/// DELETE /admin/failed-batches: drop everything in the queue.
pub async fn clear_failed(State(state): State<AppState>) -> Json<Value> {
    let cleared = state.sequencer.submitter().failed_batches().clear();
    info!(cleared, "failed batch queue cleared");
    Json(json!({"cleared": cleared}))
}

fn unix_seconds(time: std::time::SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
