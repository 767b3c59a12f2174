use crate::error::AppError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::{error, info};
use types::Order;

/// POST /orders: admit an order and kick off matching.
///
/// A batch produced inside the admission critical section is sealed and
/// submitted on a spawned task so the response never waits on chain I/O.
pub async fn submit_order(
    State(state): State<AppState>,
    payload: Result<Json<Order>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(order) = payload.map_err(|_| AppError::MalformedBody)?;

    let batch = state.sequencer.admit(order)?;

    if let Some(batch) = batch {
        let sequencer = state.sequencer.clone();
        tokio::spawn(async move {
            match sequencer.seal_and_submit(batch).await {
                Ok(tx_id) => info!(tx = %tx_id, "batch settled"),
                Err(err) => error!(%err, "batch settlement failed"),
            }
        });
    }

    Ok(Json(json!({"success": true})))
}
