//! Admission error taxonomy
//!
//! Errors raised while validating orders at the ingress boundary. Matching,
//! commitment, and submission errors live with their own crates.

use thiserror::Error;

/// Order validation errors; reported to the HTTP caller, never retried
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("field {field} cannot be empty")]
    EmptyField { field: &'static str },

    #[error("{field} must be a positive amount")]
    NonPositiveAmount { field: &'static str },

    #[error("timestamp must be positive, got {timestamp}")]
    InvalidTimestamp { timestamp: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrderError::EmptyField { field: "maker" };
        assert_eq!(err.to_string(), "field maker cannot be empty");

        let err = OrderError::InvalidTimestamp { timestamp: -1 };
        assert!(err.to_string().contains("-1"));
    }
}
