//! mfan-sa library - Search Aggregator module
//!
//! Fans a keyword search out to every source the caller may query, classifies
//! each result, applies the caller's content policy and answers either once
//! (`/api/search`) or incrementally over SSE (`/api/search/stream`).

use anyhow::Context;
use axum::Router;
use mfan_common::config::TomlConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod adapters;
pub mod api;
pub mod collaborators;
pub mod error;
pub mod pipeline;
pub mod services;

use adapters::{
    ConfigSourceRegistry, FilePolicyProvider, HttpSourceAdapter, SignedHeaderAuthenticator,
    StaticPolicyProvider,
};
use collaborators::{Authenticator, PolicyProvider};
use pipeline::SearchPipeline;
use services::{Classifier, FanOutCoordinator};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Resolves the caller of each protected request
    pub authenticator: Arc<dyn Authenticator>,
    /// Session factory with its collaborators
    pub pipeline: SearchPipeline,
}

impl AppState {
    pub fn new(authenticator: Arc<dyn Authenticator>, pipeline: SearchPipeline) -> Self {
        Self {
            authenticator,
            pipeline,
        }
    }

    /// Wire the reference collaborators from a loaded config.
    ///
    /// With a config file on disk the content policy is re-read from it for
    /// every session, so filter edits apply without a restart.
    pub fn from_config(config: &TomlConfig, config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let adapter = HttpSourceAdapter::new(&config.search)
            .context("Failed to build HTTP source adapter")?;

        let policy: Arc<dyn PolicyProvider> = match config_path {
            Some(path) => {
                info!("Content policy read per session from {}", path.display());
                Arc::new(FilePolicyProvider::new(path))
            }
            None => Arc::new(StaticPolicyProvider::new(
                config.content_filter.to_snapshot(),
            )),
        };

        let registry = Arc::new(ConfigSourceRegistry::new(
            config.sources.clone(),
            config.users.clone(),
        ));

        let coordinator = FanOutCoordinator::new(
            Arc::new(adapter),
            Duration::from_millis(config.search.source_timeout_ms),
        );

        let pipeline = SearchPipeline::new(
            registry,
            policy,
            coordinator,
            Arc::new(Classifier::new(&config.classifier)),
        );

        let authenticator =
            SignedHeaderAuthenticator::new(config.auth.clone(), config.users.clone());

        Ok(Self::new(Arc::new(authenticator), pipeline))
    }
}

/// Build application router
///
/// `/health` and `/api/buildinfo` are public; everything else requires an
/// authenticated principal.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::get;

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/search", get(api::search))
        .route("/api/search/stream", get(api::search_stream))
        .route("/api/sources", get(api::list_sources))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
