//! Error types for the search layer
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Search Error Enum ==
/// Unified error type for the search layer.
///
/// Errors are `Clone` because a single failed upstream request is handed to
/// every caller that was waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// A single attempt failed at the transport level
    #[error("Network error: {0}")]
    Network(String),

    /// A single attempt exceeded the request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Every attempt failed with a transport error or a 429
    #[error("Network error: retries exhausted after {attempts} attempts ({last_error})")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// Upstream answered with a non-retried error status
    #[error("Upstream returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Body was empty or could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SearchError {
    /// Returns true for failures that happen below the HTTP status level.
    pub fn is_transport(&self) -> bool {
        matches!(self, SearchError::Network(_) | SearchError::Timeout(_))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = match &self {
            SearchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            SearchError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            SearchError::Network(_)
            | SearchError::RetriesExhausted { .. }
            | SearchError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            SearchError::Http { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the search layer.
pub type Result<T> = std::result::Result<T, SearchError>;
