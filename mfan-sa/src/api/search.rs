//! Batch search endpoint

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use mfan_common::models::Principal;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::pipeline::{run_batch, BatchResponse};
use crate::AppState;

/// Query parameters shared by the batch and streaming endpoints
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    /// Attach per-source and filter diagnostics (batch only)
    #[serde(default)]
    pub debug: bool,
}

impl SearchParams {
    /// Trimmed keyword, `None` when missing or blank
    pub fn keyword(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// GET /api/search?q=<keyword>[&debug=true]
///
/// Answers once every permitted source has settled.
pub async fn search(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<BatchResponse>> {
    let keyword = params
        .keyword()
        .ok_or_else(|| ApiError::BadRequest("missing keyword".to_string()))?;

    let summary = run_batch(&state.pipeline, principal, keyword).await?;
    Ok(Json(BatchResponse::from_summary(summary, params.debug)))
}
