//! HTTP API handlers

pub mod auth;
pub mod buildinfo;
pub mod health;
pub mod search;
pub mod sources;
pub mod sse;

pub use auth::auth_middleware;
pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use search::{search, SearchParams};
pub use sources::list_sources;
pub use sse::search_stream;
