//! Fan-out coordinator
//!
//! Dispatches one query per source as an independent task and hands back
//! outcomes in completion order. A source that errors, times out or panics
//! becomes a failed outcome with zero items; it never affects its siblings
//! and never reaches the caller as an error.

use futures::FutureExt;
use mfan_common::models::{RawResultItem, SourceDescriptor};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::collaborators::SourceAdapter;
use crate::error::SourceError;

/// Result of querying one source
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: SourceDescriptor,
    pub result: Result<Vec<RawResultItem>, SourceError>,
    pub elapsed: Duration,
}

impl SourceOutcome {
    pub fn is_failed(&self) -> bool {
        self.result.is_err()
    }
}

/// Issues per-source queries through a [`SourceAdapter`]
#[derive(Clone)]
pub struct FanOutCoordinator {
    adapter: Arc<dyn SourceAdapter>,
    source_timeout: Duration,
}

impl FanOutCoordinator {
    pub fn new(adapter: Arc<dyn SourceAdapter>, source_timeout: Duration) -> Self {
        Self {
            adapter,
            source_timeout,
        }
    }

    /// Spawn one task per source. Must be called inside a tokio runtime.
    pub fn dispatch(&self, sources: &[SourceDescriptor], keyword: &str) -> FanOut {
        let mut tasks = JoinSet::new();

        for (index, source) in sources.iter().cloned().enumerate() {
            let adapter = Arc::clone(&self.adapter);
            let keyword = keyword.to_string();
            let timeout = self.source_timeout;

            tasks.spawn(async move {
                let start = Instant::now();
                let result = query_source(adapter, &source, &keyword, timeout).await;
                let outcome = SourceOutcome {
                    source,
                    result,
                    elapsed: start.elapsed(),
                };
                (index, outcome)
            });
        }

        debug!(sources = sources.len(), "Dispatched source queries");

        FanOut {
            tasks,
            pending: sources.iter().cloned().map(Some).collect(),
        }
    }

    /// Wait for every source to settle.
    pub async fn collect_all(&self, sources: &[SourceDescriptor], keyword: &str) -> Vec<SourceOutcome> {
        self.dispatch(sources, keyword).collect().await
    }
}

/// Query one source with timeout and panic isolation.
///
/// Admission (rate limiting) happens before the timeout starts, so a booked
/// slot is always used.
async fn query_source(
    adapter: Arc<dyn SourceAdapter>,
    source: &SourceDescriptor,
    keyword: &str,
    timeout: Duration,
) -> Result<Vec<RawResultItem>, SourceError> {
    let guarded = AssertUnwindSafe(async {
        adapter.admit(source).await;
        tokio::time::timeout(timeout, adapter.search(source, keyword)).await
    })
    .catch_unwind();

    let result = match guarded.await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(SourceError::Timeout(timeout.as_millis() as u64)),
        Err(panic) => Err(SourceError::Aborted(panic_message(panic.as_ref()))),
    };

    match &result {
        Ok(items) => debug!(source = %source.key, count = items.len(), "Source query succeeded"),
        Err(e) => warn!(source = %source.key, error = %e, "Source query failed; contributing zero results"),
    }
    result
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

/// In-flight source queries, yielding outcomes as they complete
///
/// Dropping a `FanOut` aborts queries that have not finished yet.
pub struct FanOut {
    tasks: JoinSet<(usize, SourceOutcome)>,
    pending: Vec<Option<SourceDescriptor>>,
}

impl FanOut {
    /// Number of sources that have not settled yet
    pub fn remaining(&self) -> usize {
        self.pending.iter().filter(|p| p.is_some()).count()
    }

    /// Wait for every remaining source, in completion order.
    pub async fn collect(mut self) -> Vec<SourceOutcome> {
        let mut outcomes = Vec::with_capacity(self.remaining());
        while let Some(outcome) = self.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Next settled source, in completion order. `None` once all settled.
    pub async fn next(&mut self) -> Option<SourceOutcome> {
        loop {
            match self.tasks.join_next().await {
                Some(Ok((index, outcome))) => {
                    if let Some(slot) = self.pending.get_mut(index) {
                        *slot = None;
                    }
                    return Some(outcome);
                }
                Some(Err(e)) => {
                    // Panics are caught inside the task; only cancellation lands here
                    warn!(error = %e, "Source task did not complete");
                    continue;
                }
                None => {
                    // Any source whose task vanished is reported as failed
                    let source = self.pending.iter_mut().find_map(Option::take)?;
                    warn!(source = %source.key, "Source task lost; contributing zero results");
                    return Some(SourceOutcome {
                        source,
                        result: Err(SourceError::Aborted("task lost".to_string())),
                        elapsed: Duration::ZERO,
                    });
                }
            }
        }
    }
}
