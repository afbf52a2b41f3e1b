//! Aggregation session
//!
//! One session per query. It resolves sources, takes the policy snapshot and
//! makes the policy decision exactly once, then turns each settled source
//! into a classified, filtered batch. Batch and streaming delivery both go
//! through [`AggregationSession::process`], so they cannot disagree on what
//! survives the filter.

use mfan_common::models::{
    ClassifiedResult, PolicyDecision, PolicySnapshot, Principal, SourceDescriptor,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::collaborators::{PolicyProvider, SourceRegistry};
use crate::error::PipelineError;
use crate::services::{filter, policy, Classifier, FanOut, FanOutCoordinator, SourceOutcome};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Init,
    Dispatching,
    Aggregating,
    Classifying,
    Filtering,
    Complete,
    Failed,
}

/// Per-source progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceState {
    Pending,
    Done,
    Failed,
}

/// Diagnostics for one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub source_name: String,
    pub status: SourceState,
    pub raw_count: usize,
    pub kept_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// Filter diagnostics for the whole session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterReport {
    pub applies: bool,
    pub reason: String,
    pub removed: usize,
}

/// One source's contribution after classification and filtering
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBatch {
    pub source: String,
    pub source_name: String,
    pub results: Vec<ClassifiedResult>,
    pub failed: bool,
}

/// Final state of a completed session
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub results: Vec<ClassifiedResult>,
    pub completed_sources: usize,
    pub failed_sources: usize,
    pub sources: Vec<SourceReport>,
    pub filter: FilterReport,
    pub elapsed_ms: u64,
}

impl SessionSummary {
    pub fn total(&self) -> usize {
        self.results.len()
    }
}

/// Everything a session needs from the outside world
#[derive(Clone)]
pub struct SearchPipeline {
    registry: Arc<dyn SourceRegistry>,
    policy: Arc<dyn PolicyProvider>,
    coordinator: FanOutCoordinator,
    classifier: Arc<Classifier>,
}

impl SearchPipeline {
    pub fn new(
        registry: Arc<dyn SourceRegistry>,
        policy: Arc<dyn PolicyProvider>,
        coordinator: FanOutCoordinator,
        classifier: Arc<Classifier>,
    ) -> Self {
        Self {
            registry,
            policy,
            coordinator,
            classifier,
        }
    }

    pub fn registry(&self) -> &Arc<dyn SourceRegistry> {
        &self.registry
    }

    /// Start a session: resolve sources, snapshot the policy and decide.
    pub async fn open(
        &self,
        principal: Principal,
        keyword: impl Into<String>,
    ) -> Result<AggregationSession, PipelineError> {
        let session_id = Uuid::new_v4();
        let keyword = keyword.into();
        let started = Instant::now();

        let sources = self.registry.permitted_sources(&principal).await?;
        let snapshot = self.policy.snapshot().await?;
        let decision = policy::evaluate(&principal, &snapshot);

        info!(
            session_id = %session_id,
            user = %principal.username,
            keyword = %keyword,
            sources = sources.len(),
            filter_applies = decision.applies,
            "Search session opened"
        );

        let reports = sources
            .iter()
            .map(|s| SourceReport {
                source: s.key.clone(),
                source_name: s.name.clone(),
                status: SourceState::Pending,
                raw_count: 0,
                kept_count: 0,
                error: None,
                elapsed_ms: 0,
            })
            .collect();

        Ok(AggregationSession {
            id: session_id,
            keyword,
            sources,
            snapshot,
            decision,
            phase: SessionPhase::Init,
            reports,
            results: Vec::new(),
            removed: 0,
            started,
            coordinator: self.coordinator.clone(),
            classifier: Arc::clone(&self.classifier),
        })
    }
}

/// Ephemeral per-query state; dropped when the response or stream ends
pub struct AggregationSession {
    id: Uuid,
    keyword: String,
    sources: Vec<SourceDescriptor>,
    snapshot: PolicySnapshot,
    decision: PolicyDecision,
    phase: SessionPhase,
    reports: Vec<SourceReport>,
    results: Vec<ClassifiedResult>,
    removed: usize,
    started: Instant,
    coordinator: FanOutCoordinator,
    classifier: Arc<Classifier>,
}

impl AggregationSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    fn transition(&mut self, to: SessionPhase) {
        if self.phase != to {
            debug!(session_id = %self.id, from = ?self.phase, to = ?to, "Session phase");
            self.phase = to;
        }
    }

    /// Launch every source query.
    pub fn dispatch(&mut self) -> FanOut {
        self.transition(SessionPhase::Dispatching);
        self.coordinator.dispatch(&self.sources, &self.keyword)
    }

    /// Classify and filter one settled source, recording its state.
    pub fn process(&mut self, outcome: SourceOutcome) -> SourceBatch {
        self.transition(SessionPhase::Aggregating);

        let (raw, error) = match outcome.result {
            Ok(items) => (items, None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        };
        let raw_count = raw.len();

        self.transition(SessionPhase::Classifying);
        let classified = self.classifier.classify_all(raw);

        self.transition(SessionPhase::Filtering);
        let filtered = filter::apply(classified, &self.decision, &self.snapshot.blocked_terms);
        self.removed += filtered.removed;

        let failed = error.is_some();
        let status = if failed {
            SourceState::Failed
        } else {
            SourceState::Done
        };

        if let Some(report) = self
            .reports
            .iter_mut()
            .find(|r| r.source == outcome.source.key && r.status == SourceState::Pending)
        {
            report.status = status;
            report.raw_count = raw_count;
            report.kept_count = filtered.kept.len();
            report.error = error;
            report.elapsed_ms = outcome.elapsed.as_millis() as u64;
        }

        debug!(
            session_id = %self.id,
            source = %outcome.source.key,
            state = ?status,
            raw_count,
            kept = filtered.kept.len(),
            "Source settled"
        );

        self.results.extend(filtered.kept.iter().cloned());

        SourceBatch {
            source: outcome.source.key,
            source_name: outcome.source.name,
            results: filtered.kept,
            failed,
        }
    }

    /// Close the session and hand back the accumulated results.
    pub fn finish(mut self) -> SessionSummary {
        self.transition(SessionPhase::Complete);

        let failed_sources = self
            .reports
            .iter()
            .filter(|r| r.status == SourceState::Failed)
            .count();
        let completed_sources = self
            .reports
            .iter()
            .filter(|r| r.status == SourceState::Done)
            .count();
        let elapsed_ms = self.started.elapsed().as_millis() as u64;

        info!(
            session_id = %self.id,
            total = self.results.len(),
            completed_sources,
            failed_sources,
            removed = self.removed,
            elapsed_ms,
            "Search session complete"
        );

        SessionSummary {
            session_id: self.id,
            results: self.results,
            completed_sources,
            failed_sources,
            sources: self.reports,
            filter: FilterReport {
                applies: self.decision.applies,
                reason: self.decision.reason,
                removed: self.removed,
            },
            elapsed_ms,
        }
    }

    /// Abandon the session after the client went away.
    pub fn abandon(mut self) {
        self.transition(SessionPhase::Failed);
        info!(session_id = %self.id, "Search session abandoned by client");
    }
}
