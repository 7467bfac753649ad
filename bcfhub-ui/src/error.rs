//! Error types for bcfhub-ui
//!
//! Validation failures, per-archive inspection failures and merge failures
//! are distinct variants so the presentation layer can tell them apart.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum HubError {
    /// Rejected before submission (400)
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Inspection service failed for one archive (502)
    #[error("Inspection of '{archive}' failed: {message}")]
    Inspection { archive: String, message: String },

    /// Merge service failed (502)
    #[error("Merge failed: {0}")]
    Merge(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Operation already outstanding (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal error (500)
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Common error: {0}")]
    Common(#[from] bcfhub_common::Error),
}

impl HubError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            HubError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            HubError::Inspection { .. } => (StatusCode::BAD_GATEWAY, "INSPECTION_FAILED"),
            HubError::Merge(_) => (StatusCode::BAD_GATEWAY, "MERGE_FAILED"),
            HubError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            HubError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            HubError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            HubError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            HubError::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
        }
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for hub operations and API handlers
pub type HubResult<T> = Result<T, HubError>;
