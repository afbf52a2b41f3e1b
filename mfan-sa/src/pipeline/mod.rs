//! Aggregation session and its two delivery adapters

pub mod batch;
pub mod session;
pub mod streaming;

pub use batch::{run_batch, BatchDebug, BatchResponse};
pub use session::{
    AggregationSession, FilterReport, SearchPipeline, SessionPhase, SessionSummary, SourceBatch,
    SourceReport, SourceState,
};
pub use streaming::{error_stream, spawn_stream};
