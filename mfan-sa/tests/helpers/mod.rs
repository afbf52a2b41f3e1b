//! In-memory collaborators for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, Request},
};
use mfan_common::api::auth::USER_HEADER;
use mfan_common::api::ApiAuthError;
use mfan_common::models::{PolicySnapshot, Principal, RawResultItem, SourceDescriptor};
use mfan_sa::collaborators::{Authenticator, PolicyProvider, SourceAdapter, SourceRegistry};
use mfan_sa::error::{PolicyError, RegistryError, SourceError};
use mfan_sa::pipeline::SearchPipeline;
use mfan_sa::services::{Classifier, FanOutCoordinator};
use mfan_sa::AppState;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scripted behaviour of one fake source
#[derive(Clone)]
pub enum Script {
    Items(Vec<RawResultItem>),
    Fail(SourceError),
    Panic,
    Hang,
    /// Hangs, recording when the query starts and when it is dropped
    Watched(QueryWatch),
}

/// Lifecycle flags of one hanging query
#[derive(Clone, Default)]
pub struct QueryWatch {
    started: Arc<AtomicBool>,
    released: Arc<AtomicBool>,
}

impl QueryWatch {
    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Sets the released flag when the query future is dropped
struct ReleaseOnDrop(Arc<AtomicBool>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Poll `condition` every 5ms until it holds or `within_ms` passes.
pub async fn eventually(within_ms: u64, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(within_ms);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Source adapter answering from a per-source script after an optional delay
#[derive(Default)]
pub struct FakeAdapter {
    scripts: HashMap<String, (Duration, Script)>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, script: Script) -> Self {
        self.scripts.insert(key.to_string(), (Duration::ZERO, script));
        self
    }

    pub fn with_delay(mut self, key: &str, delay_ms: u64, script: Script) -> Self {
        self.scripts
            .insert(key.to_string(), (Duration::from_millis(delay_ms), script));
        self
    }
}

#[async_trait]
impl SourceAdapter for FakeAdapter {
    async fn search(
        &self,
        source: &SourceDescriptor,
        _keyword: &str,
    ) -> Result<Vec<RawResultItem>, SourceError> {
        let (delay, script) = self
            .scripts
            .get(&source.key)
            .cloned()
            .unwrap_or((Duration::ZERO, Script::Items(Vec::new())));

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match script {
            Script::Items(items) => Ok(items
                .into_iter()
                .map(|i| i.with_source(source.key.clone()))
                .collect()),
            Script::Fail(e) => Err(e),
            Script::Panic => panic!("source {} exploded", source.key),
            Script::Hang => {
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
            Script::Watched(watch) => {
                let _release = ReleaseOnDrop(Arc::clone(&watch.released));
                watch.started.store(true, Ordering::SeqCst);
                std::future::pending::<()>().await;
                Ok(Vec::new())
            }
        }
    }
}

/// Registry returning the same list for everyone
pub struct FakeRegistry(pub Vec<SourceDescriptor>);

#[async_trait]
impl SourceRegistry for FakeRegistry {
    async fn permitted_sources(
        &self,
        _principal: &Principal,
    ) -> Result<Vec<SourceDescriptor>, RegistryError> {
        Ok(self.0.clone())
    }
}

pub struct FixedPolicy(pub PolicySnapshot);

#[async_trait]
impl PolicyProvider for FixedPolicy {
    async fn snapshot(&self) -> Result<PolicySnapshot, PolicyError> {
        Ok(self.0.clone())
    }
}

pub struct FailingPolicy;

#[async_trait]
impl PolicyProvider for FailingPolicy {
    async fn snapshot(&self) -> Result<PolicySnapshot, PolicyError> {
        Err(PolicyError("config store offline".to_string()))
    }
}

/// Authenticates the user named in the user header against a fixed table
pub struct HeaderAuthenticator(pub HashMap<String, Principal>);

#[async_trait]
impl Authenticator for HeaderAuthenticator {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, ApiAuthError> {
        let user = headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiAuthError::MissingHeader(USER_HEADER))?;

        self.0
            .get(user)
            .cloned()
            .ok_or_else(|| ApiAuthError::UnknownUser(user.to_string()))
    }
}

pub fn sources(keys: &[&str]) -> Vec<SourceDescriptor> {
    keys.iter()
        .map(|k| SourceDescriptor::new(*k, format!("Source {}", k), format!("http://{}.invalid/api", k)))
        .collect()
}

pub fn pipeline(
    adapter: FakeAdapter,
    keys: &[&str],
    policy: Arc<dyn PolicyProvider>,
) -> SearchPipeline {
    SearchPipeline::new(
        Arc::new(FakeRegistry(sources(keys))),
        policy,
        FanOutCoordinator::new(Arc::new(adapter), Duration::from_millis(300)),
        Arc::new(Classifier::default()),
    )
}

/// App state whose authenticator knows `principals` by username
pub fn app_state(pipeline: SearchPipeline, principals: &[Principal]) -> AppState {
    let table = principals
        .iter()
        .map(|p| (p.username.clone(), p.clone()))
        .collect();
    AppState::new(Arc::new(HeaderAuthenticator(table)), pipeline)
}

pub fn get_as(user: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(USER_HEADER, user)
        .body(Body::empty())
        .unwrap()
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Parse an SSE body into its `data:` payloads
pub async fn extract_events(body: Body) -> Vec<Value> {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    let text = String::from_utf8(bytes.to_vec()).expect("SSE body is UTF-8");

    text.split("\n\n")
        .filter_map(|frame| frame.strip_prefix("data: "))
        .map(|data| serde_json::from_str(data).expect("Event data is JSON"))
        .collect()
}
