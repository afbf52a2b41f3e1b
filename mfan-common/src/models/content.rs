//! Sources, raw upstream records and classified results

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ========================================
// Sources
// ========================================

/// An upstream content index the aggregator may query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Unique source identifier
    pub key: String,
    /// Human-readable source name
    pub name: String,
    /// Base endpoint of the source's search API
    pub api: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SourceDescriptor {
    pub fn new(key: impl Into<String>, name: impl Into<String>, api: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            api: api.into(),
            enabled: true,
        }
    }
}

// ========================================
// Content classification
// ========================================

/// Closed set of coarse content categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Tv,
    Anime,
    Variety,
    Shortdrama,
    Documentary,
    Live,
}

impl ContentType {
    pub const ALL: [ContentType; 7] = [
        ContentType::Movie,
        ContentType::Tv,
        ContentType::Anime,
        ContentType::Variety,
        ContentType::Shortdrama,
        ContentType::Documentary,
        ContentType::Live,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Tv => "tv",
            ContentType::Anime => "anime",
            ContentType::Variety => "variety",
            ContentType::Shortdrama => "shortdrama",
            ContentType::Documentary => "documentary",
            ContentType::Live => "live",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    /// Parses an enum identifier, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("not a content type: {}", needle))
    }
}

/// Where a classification's confidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceOrigin {
    /// Type supplied by the upstream API
    Api,
    /// Derived by heuristic rules
    Inferred,
    /// No usable signal; default type applied
    Fallback,
}

// ========================================
// Raw upstream record
// ========================================

/// Loosely structured record returned by a source adapter
///
/// `title` is the only mandatory field. Every other field is optional and a
/// missing value means "no signal", never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawResultItem {
    pub title: String,

    /// Upstream-provided type tag (may or may not be a known [`ContentType`])
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,

    /// Descriptive category string (e.g. "国产剧", "动作片")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<String>,

    /// Key of the source that produced this item
    #[serde(default)]
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RawResultItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_type_tag(mut self, tag: impl Into<String>) -> Self {
        self.type_tag = Some(tag.into());
        self
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn with_episode_count(mut self, count: u32) -> Self {
        self.episode_count = Some(count);
        self
    }

    pub fn with_episodes<I, S>(mut self, episodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.episodes = episodes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Episode count, from the explicit count or the episode list.
    ///
    /// Returns `None` when neither yields a positive number.
    pub fn derived_episode_count(&self) -> Option<u32> {
        match self.episode_count {
            Some(n) if n > 0 => Some(n),
            _ if !self.episodes.is_empty() => Some(self.episodes.len() as u32),
            _ => None,
        }
    }
}

// ========================================
// Classified result
// ========================================

/// A raw item annotated with an inferred content type and confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedResult {
    pub title: String,

    #[serde(rename = "type")]
    pub content_type: ContentType,

    /// Heuristic certainty, always within `[0, 1]`
    pub confidence: f64,

    pub origin: ConfidenceOrigin,

    /// Key of the source that produced this item
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_count: Option<u32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub episodes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ClassifiedResult {
    /// Attach a classification to a raw item. Confidence is clamped to `[0, 1]`;
    /// NaN becomes 0.
    pub fn from_raw(
        raw: RawResultItem,
        content_type: ContentType,
        confidence: f64,
        origin: ConfidenceOrigin,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            title: raw.title,
            content_type,
            confidence,
            origin,
            source: raw.source,
            type_name: raw.type_name,
            episode_count: raw.episode_count,
            episodes: raw.episodes,
            id: raw.id,
            year: raw.year,
            poster: raw.poster,
            description: raw.description,
        }
    }
}
