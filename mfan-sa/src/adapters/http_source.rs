//! Video-CMS search API client
//!
//! Speaks the common CMS collection API:
//! `GET {api}?ac=videolist&wd={keyword}` answering
//! `{"list": [{"vod_id", "vod_name", "type_name", "vod_year", "vod_pic",
//! "vod_content", "vod_play_url", ...}]}`.
//!
//! Play URLs are `$$$`-separated groups of `#`-separated episodes; the first
//! group defines the episode list.

use async_trait::async_trait;
use mfan_common::config::SearchConfig;
use mfan_common::models::{RawResultItem, SourceDescriptor};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::collaborators::SourceAdapter;
use crate::error::SourceError;
use crate::services::RateLimiter;

/// CMS search response
#[derive(Debug, Deserialize)]
struct CmsResponse {
    #[serde(default)]
    list: Vec<CmsItem>,
}

/// CMS item; providers disagree on scalar types, so loose fields stay `Value`
#[derive(Debug, Deserialize)]
struct CmsItem {
    #[serde(default)]
    vod_id: Option<Value>,
    #[serde(default)]
    vod_name: Option<String>,
    #[serde(default)]
    type_name: Option<String>,
    #[serde(default)]
    vod_year: Option<Value>,
    #[serde(default)]
    vod_pic: Option<String>,
    #[serde(default)]
    vod_content: Option<String>,
    #[serde(default)]
    vod_play_url: Option<String>,
}

/// Source adapter for CMS-style HTTP APIs, rate limited per source
pub struct HttpSourceAdapter {
    http_client: reqwest::Client,
    rate_limiter: RateLimiter,
    timeout_ms: u64,
}

impl HttpSourceAdapter {
    pub fn new(config: &SearchConfig) -> Result<Self, SourceError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_millis(config.source_timeout_ms))
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: RateLimiter::new(Duration::from_millis(config.min_request_interval_ms)),
            timeout_ms: config.source_timeout_ms,
        })
    }
}

#[async_trait]
impl SourceAdapter for HttpSourceAdapter {
    async fn admit(&self, source: &SourceDescriptor) {
        self.rate_limiter.wait(&source.key).await;
    }

    async fn search(
        &self,
        source: &SourceDescriptor,
        keyword: &str,
    ) -> Result<Vec<RawResultItem>, SourceError> {
        tracing::debug!(source = %source.key, api = %source.api, "Querying source");

        let response = self
            .http_client
            .get(&source.api)
            .query(&[("ac", "videolist"), ("wd", keyword)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout(self.timeout_ms)
                } else {
                    SourceError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        parse_response(&source.key, &body)
    }
}

/// Parse a CMS response body into raw items tagged with `source_key`.
///
/// Items without a title are skipped.
pub fn parse_response(source_key: &str, body: &str) -> Result<Vec<RawResultItem>, SourceError> {
    let response: CmsResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Decode(e.to_string()))?;

    Ok(response
        .list
        .into_iter()
        .filter_map(|item| {
            let title = item.vod_name.map(|t| t.trim().to_string())?;
            if title.is_empty() {
                return None;
            }

            let episodes = item
                .vod_play_url
                .as_deref()
                .map(first_play_group)
                .unwrap_or_default();

            Some(RawResultItem {
                title,
                type_tag: None,
                type_name: item.type_name.filter(|t| !t.trim().is_empty()),
                episode_count: None,
                episodes,
                source: source_key.to_string(),
                id: item.vod_id.as_ref().and_then(scalar_to_string),
                year: item.vod_year.as_ref().and_then(scalar_to_string),
                poster: item.vod_pic.filter(|p| !p.is_empty()),
                description: item.vod_content.filter(|c| !c.is_empty()),
            })
        })
        .collect())
}

/// Episodes of the first `$$$` play group
fn first_play_group(play_url: &str) -> Vec<String> {
    play_url
        .split("$$$")
        .next()
        .unwrap_or_default()
        .split('#')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
