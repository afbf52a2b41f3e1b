//! Batch responder: run the session to completion, then answer once

use mfan_common::models::{ClassifiedResult, Principal};
use serde::Serialize;
use uuid::Uuid;

use super::session::{FilterReport, SearchPipeline, SessionSummary, SourceReport};
use crate::error::PipelineError;

/// Message attached when the caller has no permitted sources
pub const NO_SOURCES_MESSAGE: &str = "no sources";

/// Batch search response body
#[derive(Debug, Clone, Serialize)]
pub struct BatchResponse {
    pub results: Vec<ClassifiedResult>,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<BatchDebug>,
}

/// Optional diagnostics block
#[derive(Debug, Clone, Serialize)]
pub struct BatchDebug {
    pub session_id: Uuid,
    pub sources: Vec<SourceReport>,
    pub filter: FilterReport,
    pub elapsed_ms: u64,
}

impl BatchResponse {
    pub fn from_summary(summary: SessionSummary, include_debug: bool) -> Self {
        let message = summary
            .sources
            .is_empty()
            .then(|| NO_SOURCES_MESSAGE.to_string());
        let total = summary.total();

        let debug = include_debug.then(|| BatchDebug {
            session_id: summary.session_id,
            sources: summary.sources,
            filter: summary.filter,
            elapsed_ms: summary.elapsed_ms,
        });

        Self {
            results: summary.results,
            total,
            message,
            debug,
        }
    }
}

/// Drive one session until every source has settled.
pub async fn run_batch(
    pipeline: &SearchPipeline,
    principal: Principal,
    keyword: &str,
) -> Result<SessionSummary, PipelineError> {
    let mut session = pipeline.open(principal, keyword).await?;

    if !session.sources().is_empty() {
        // Every source settles before anything moves downstream
        let outcomes = session.dispatch().collect().await;
        for outcome in outcomes {
            session.process(outcome);
        }
    }

    Ok(session.finish())
}
