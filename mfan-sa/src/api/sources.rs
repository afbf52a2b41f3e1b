//! Permitted sources listing

use axum::{extract::State, Extension, Json};
use mfan_common::models::{Principal, SourceDescriptor};

use crate::error::{ApiResult, PipelineError};
use crate::AppState;

/// GET /api/sources
///
/// Sources the caller would fan out to, in dispatch order.
pub async fn list_sources(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<SourceDescriptor>>> {
    let sources = state
        .pipeline
        .registry()
        .permitted_sources(&principal)
        .await
        .map_err(PipelineError::from)?;

    Ok(Json(sources))
}
