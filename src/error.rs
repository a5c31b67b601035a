//! HTTP error responses
//!
//! Maps upstream failures onto the status codes and `{"detail": ...}` bodies
//! returned to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::data::FetchError;

/// Errors surfaced by the HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// GitHub responded with a non-success status; mirrored to the client.
    /// The upstream body is never forwarded.
    #[error("GitHub API Error")]
    Upstream(StatusCode),

    /// Any other failure (500)
    #[error("{0}")]
    Internal(String),
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err.status_code() {
            Some(code) => ApiError::Upstream(code),
            None => ApiError::Internal(err.to_string()),
        }
    }
}

impl ApiError {
    /// Status code sent to the client
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Upstream(code) => *code,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = status.as_u16(), error = %self, "request failed");
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
