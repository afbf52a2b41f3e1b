//! Shared data model for the search aggregator
//!
//! Types that cross the boundary between the aggregation pipeline, the
//! external collaborators (auth, source registry, config, source adapters)
//! and the wire protocols (batch JSON, SSE events).

mod content;
mod policy;
mod principal;

pub use content::{ClassifiedResult, ConfidenceOrigin, ContentType, RawResultItem, SourceDescriptor};
pub use policy::{BlockedTerms, PolicyDecision, PolicySnapshot};
pub use principal::{Principal, Role};
