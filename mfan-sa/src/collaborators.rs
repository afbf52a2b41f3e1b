//! Seams to the systems the aggregator depends on but does not own
//!
//! Each collaborator is held as `Arc<dyn Trait>` in [`crate::AppState`] so
//! tests can inject in-memory fakes. Reference implementations live in
//! [`crate::adapters`].

use async_trait::async_trait;
use axum::http::HeaderMap;
use mfan_common::api::ApiAuthError;
use mfan_common::models::{PolicySnapshot, Principal, RawResultItem, SourceDescriptor};

use crate::error::{PolicyError, RegistryError, SourceError};

/// Resolves the caller of a request
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, ApiAuthError>;
}

/// Lists the sources a principal may query
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    /// Ordered, already entitlement-filtered, enabled sources.
    async fn permitted_sources(
        &self,
        principal: &Principal,
    ) -> Result<Vec<SourceDescriptor>, RegistryError>;
}

/// Supplies the content policy snapshot for one session
#[async_trait]
pub trait PolicyProvider: Send + Sync {
    async fn snapshot(&self) -> Result<PolicySnapshot, PolicyError>;
}

/// Queries one upstream source
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Wait until `source` may be queried. Not counted against the
    /// per-source timeout.
    async fn admit(&self, _source: &SourceDescriptor) {}

    async fn search(
        &self,
        source: &SourceDescriptor,
        keyword: &str,
    ) -> Result<Vec<RawResultItem>, SourceError>;
}
