//! HTTP error mapping
//!
//! Admission failures and malformed bodies surface to the caller as
//! `400 {"error": "Invalid order"}`; anything else is an opaque 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::sequencer::AdmitError;

/// Central error type for the gateway
#[derive(Debug, Error)]
pub enum AppError {
    #[error("malformed request body")]
    MalformedBody,

    #[error("invalid order: {0}")]
    InvalidOrder(types::OrderError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AdmitError> for AppError {
    fn from(err: AdmitError) -> Self {
        match err {
            AdmitError::Order(order_err) => AppError::InvalidOrder(order_err),
            AdmitError::Match(match_err) => AppError::Internal(match_err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::MalformedBody | AppError::InvalidOrder(_) => (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Invalid order"})),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal error"})),
            ),
        };
        (status, body).into_response()
    }
}
