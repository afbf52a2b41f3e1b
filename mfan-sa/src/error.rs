//! Error types for mfan-sa
//!
//! Three tiers:
//! - [`SourceError`]: one source failed. Recovered by the coordinator, never
//!   surfaced to the client.
//! - [`PipelineError`]: a session-wide collaborator failed. Fatal for the
//!   session (500 in batch mode, one `error` event when streaming).
//! - [`ApiError`]: what an HTTP handler returns.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mfan_common::api::{ApiAuthError, ErrorBody};
use thiserror::Error;

/// Failure of a single source query
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Upstream returned status {0}")]
    Status(u16),

    #[error("Malformed payload: {0}")]
    Decode(String),

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    /// The source task panicked or was cancelled
    #[error("Source task aborted: {0}")]
    Aborted(String),
}

/// Config collaborator could not supply a policy snapshot
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Content policy unavailable: {0}")]
pub struct PolicyError(pub String);

/// Source registry could not resolve the caller's sources
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Source registry unavailable: {0}")]
pub struct RegistryError(pub String);

/// Session-fatal failure outside per-source isolation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Caller not authenticated (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Session-fatal pipeline fault (500)
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ApiAuthError> for ApiError {
    fn from(err: ApiAuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Pipeline(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PIPELINE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = match self {
            ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) | ApiError::Internal(msg) => msg,
            ApiError::Pipeline(err) => err.to_string(),
        };

        (status, Json(ErrorBody::new(error_code, message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
