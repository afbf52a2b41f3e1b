//! Streaming responder
//!
//! One writer task per session pushes [`SearchEvent`]s into a bounded
//! channel: `start`, one `source_result` per source in completion order,
//! then `complete` (or a single `error`). When the client disconnects the
//! receiver is dropped, the writer notices the closed channel and stops;
//! unfinished source queries are abandoned.

use mfan_common::models::Principal;
use mfan_common::SearchEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::session::{SearchPipeline, SourceBatch};

/// Events buffered between the writer task and the HTTP response
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Spawn the writer task for one streaming session.
pub fn spawn_stream(
    pipeline: SearchPipeline,
    principal: Principal,
    keyword: String,
) -> mpsc::Receiver<SearchEvent> {
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(write_events(pipeline, principal, keyword, tx));
    rx
}

/// A stream that carries exactly one `error` event.
pub fn error_stream(message: impl Into<String>) -> mpsc::Receiver<SearchEvent> {
    let (tx, rx) = mpsc::channel(1);
    // Capacity 1 and a fresh receiver: this cannot fail
    let _ = tx.try_send(SearchEvent::error(message));
    rx
}

impl From<SourceBatch> for SearchEvent {
    fn from(batch: SourceBatch) -> Self {
        SearchEvent::SourceResult {
            count: batch.results.len(),
            source: batch.source,
            source_name: batch.source_name,
            results: batch.results,
            failed: batch.failed,
        }
    }
}

async fn write_events(
    pipeline: SearchPipeline,
    principal: Principal,
    keyword: String,
    tx: mpsc::Sender<SearchEvent>,
) {
    let mut session = match pipeline.open(principal, keyword).await {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "Streaming search failed before dispatch");
            let _ = tx.send(SearchEvent::error(e.to_string())).await;
            return;
        }
    };

    let start = SearchEvent::Start {
        session_id: session.id(),
        total_sources: session.sources().len(),
    };
    if tx.send(start).await.is_err() {
        session.abandon();
        return;
    }

    if !session.sources().is_empty() {
        let mut fan_out = session.dispatch();
        loop {
            let outcome = tokio::select! {
                _ = tx.closed() => {
                    session.abandon();
                    return;
                }
                outcome = fan_out.next() => outcome,
            };

            let Some(outcome) = outcome else { break };
            let event = SearchEvent::from(session.process(outcome));
            if tx.send(event).await.is_err() {
                session.abandon();
                return;
            }
        }
    }

    let summary = session.finish();
    let complete = SearchEvent::Complete {
        total: summary.total(),
        results: summary.results,
        completed_sources: summary.completed_sources,
        failed_sources: summary.failed_sources,
    };
    if tx.send(complete).await.is_err() {
        debug!("Client left before complete event");
    }
}
