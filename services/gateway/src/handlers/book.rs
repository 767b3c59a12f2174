use crate::state::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// GET /book: snapshot of the resting orders, for external observers.
pub async fn book_snapshot(State(state): State<AppState>) -> Json<Value> {
    let orders = state.sequencer.book_snapshot();
    Json(json!({"count": orders.len(), "orders": orders}))
}
