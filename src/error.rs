//! Error types for the cache server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache engine, its stores and the HTTP layer.
///
/// Absence of a key is never an error; lookups and removals report it through
/// `Option` and `bool` results instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backing store could not be reached or the operation timed out
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store rejected a write because the key is already taken
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Rejected cache policy or server configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Returns true if this error is the store's duplicate-key signal.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, CacheError::DuplicateKey(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::DuplicateKey(_) => StatusCode::CONFLICT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidConfig(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                CacheError::StoreUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (CacheError::DuplicateKey("k".into()), StatusCode::CONFLICT),
            (
                CacheError::InvalidRequest("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                CacheError::Internal("oops".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_is_duplicate_key() {
        assert!(CacheError::DuplicateKey("k".into()).is_duplicate_key());
        assert!(!CacheError::StoreUnavailable("down".into()).is_duplicate_key());
    }
}
