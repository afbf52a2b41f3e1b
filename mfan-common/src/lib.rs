//! # MediaFan Common Library
//!
//! Shared code for MediaFan services including:
//! - Search data model (principals, sources, raw and classified results)
//! - Streaming event types (SearchEvent enum)
//! - Request signature primitives and API error types
//! - Configuration loading
//! - SSE helpers

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod sse;

pub use error::{Error, Result};
pub use events::SearchEvent;
