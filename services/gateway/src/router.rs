use crate::handlers::{admin, book, health, orders};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/orders", post(orders::submit_order))
        .route("/health", get(health::health))
        .route("/book", get(book::book_snapshot))
        .route("/batches", get(admin::batch_history))
        .route(
            "/admin/failed-batches",
            get(admin::failed_batches).delete(admin::clear_failed),
        )
        .route("/admin/failed-batches/retry", post(admin::retry_failed))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
