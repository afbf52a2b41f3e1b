//! Authentication middleware
//!
//! Resolves the caller through the configured [`Authenticator`] and stores
//! the [`Principal`] in request extensions for handlers.
//!
//! [`Authenticator`]: crate::collaborators::Authenticator

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use mfan_common::models::Principal;
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

/// Returns 401 Unauthorized if the caller cannot be authenticated.
///
/// Applied to protected routes only; `/health` does NOT use it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (mut parts, body) = request.into_parts();

    let principal: Principal = state
        .authenticator
        .authenticate(&parts.headers)
        .await
        .map_err(|e| {
            warn!(path = %parts.uri.path(), error = %e, "Authentication failed");
            ApiError::from(e)
        })?;

    parts.extensions.insert(principal);
    Ok(next.run(Request::from_parts(parts, body)).await)
}
