//! Shared HTTP API primitives
//!
//! This module contains ONLY pure functions and shared types. The service
//! wraps them with framework-specific middleware (Axum).

pub mod auth;
pub mod types;

pub use auth::{calculate_signature, now_millis, validate_signature, validate_timestamp, ApiAuthError};
pub use types::{ErrorBody, ErrorDetail};
