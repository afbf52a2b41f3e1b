//! Aggregation building blocks: fan-out, classification, policy, filtering

pub mod classifier;
pub mod coordinator;
pub mod filter;
pub mod policy;
pub mod rate_limiter;

pub use classifier::Classifier;
pub use coordinator::{FanOut, FanOutCoordinator, SourceOutcome};
pub use filter::FilterOutcome;
pub use rate_limiter::{Clock, RateLimiter, SystemClock};
