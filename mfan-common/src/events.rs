//! Event types for the streaming search protocol
//!
//! Each event is serialized as one JSON object with an internal `type`
//! discriminator and sent as one `data:` frame.

use crate::models::ClassifiedResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Streaming search events, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchEvent {
    /// Session opened; sent once before any source result
    Start {
        session_id: Uuid,
        total_sources: usize,
    },

    /// One source settled; results already classified and filtered
    SourceResult {
        source: String,
        source_name: String,
        results: Vec<ClassifiedResult>,
        count: usize,
        /// Present and true only when the source failed
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        failed: bool,
    },

    /// Every source settled; concatenation of all partial lists
    Complete {
        results: Vec<ClassifiedResult>,
        total: usize,
        completed_sources: usize,
        failed_sources: usize,
    },

    /// Pipeline-wide fault; terminates the stream
    Error { error: String },
}

impl SearchEvent {
    /// Wire name of the event's `type` field
    pub fn event_type(&self) -> &'static str {
        match self {
            SearchEvent::Start { .. } => "start",
            SearchEvent::SourceResult { .. } => "source_result",
            SearchEvent::Complete { .. } => "complete",
            SearchEvent::Error { .. } => "error",
        }
    }

    /// True for events after which nothing else is sent.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchEvent::Complete { .. } | SearchEvent::Error { .. })
    }

    pub fn error(message: impl Into<String>) -> Self {
        SearchEvent::Error {
            error: message.into(),
        }
    }
}
