//! Configuration loading and config file resolution
//!
//! # Resolution priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `MFAN_CONFIG` environment variable
//! 3. Platform config file (`<config_dir>/mfan/config.toml`, then
//!    `/etc/mfan/config.toml` on Linux)
//! 4. Compiled defaults (fallback)
//!
//! A missing file is not fatal: the service logs a warning and starts with
//! compiled defaults. A file that exists but fails to parse or validate is
//! a startup error.

use crate::models::{BlockedTerms, PolicySnapshot, Role, SourceDescriptor};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "MFAN_CONFIG";

/// Default listen address for the search aggregator
pub const DEFAULT_BIND: &str = "127.0.0.1:5730";

// ========================================
// TOML schema
// ========================================

/// Complete service configuration loaded from TOML
///
/// Every section is optional; an empty file yields compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Known users, keyed by username
    #[serde(default)]
    pub users: BTreeMap<String, UserConfig>,

    /// Upstream sources in registration order
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,

    #[serde(default)]
    pub content_filter: ContentFilterConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address (`host:port`)
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Guard timeout applied to each source query; expiry counts as a
    /// failure of that source only
    #[serde(default = "default_source_timeout_ms")]
    pub source_timeout_ms: u64,

    /// Minimum interval between two requests to the same source (0 = none)
    #[serde(default)]
    pub min_request_interval_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: default_source_timeout_ms(),
            min_request_interval_ms: 0,
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Request signing secret; empty disables signature and timestamp checks
    #[serde(default)]
    pub shared_secret: String,

    #[serde(default = "default_max_clock_skew_ms")]
    pub max_clock_skew_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            shared_secret: String::new(),
            max_clock_skew_ms: default_max_clock_skew_ms(),
        }
    }
}

impl AuthConfig {
    pub fn signatures_enabled(&self) -> bool {
        !self.shared_secret.is_empty()
    }
}

/// Per-user entry in the `[users]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_role")]
    pub role: Role,

    #[serde(default)]
    pub groups: Vec<String>,

    /// Optional allow-list of source keys (absent = every enabled source)
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            role: default_role(),
            groups: Vec::new(),
            sources: None,
        }
    }
}

/// `[content_filter]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentFilterConfig {
    /// Global switch; true turns filtering off for everyone
    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub blocked_terms: Vec<String>,

    /// Group name → filtering enabled
    #[serde(default)]
    pub groups: BTreeMap<String, bool>,
}

impl ContentFilterConfig {
    /// Immutable policy snapshot for one aggregation session.
    pub fn to_snapshot(&self) -> PolicySnapshot {
        PolicySnapshot {
            global_filter_disabled: self.disabled,
            group_policies: self.groups.clone(),
            blocked_terms: BlockedTerms::new(&self.blocked_terms),
        }
    }

    /// Read only the `[content_filter]` section from a config file.
    ///
    /// Other sections are ignored, so a partially edited file still yields
    /// a policy as long as this section parses.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[derive(Deserialize)]
        struct Partial {
            #[serde(default)]
            content_filter: ContentFilterConfig,
        }

        let content = std::fs::read_to_string(path)?;
        let partial: Partial = toml::from_str(&content)?;
        Ok(partial.content_filter)
    }
}

/// `[classifier]` section: reserved source identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_live_keys")]
    pub live_source_keys: Vec<String>,

    #[serde(default = "default_short_drama_keys")]
    pub short_drama_source_keys: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            live_source_keys: default_live_keys(),
            short_drama_source_keys: default_short_drama_keys(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_source_timeout_ms() -> u64 {
    8000
}

fn default_user_agent() -> String {
    format!("mfan/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_clock_skew_ms() -> u64 {
    30_000
}

fn default_role() -> Role {
    Role::User
}

fn default_live_keys() -> Vec<String> {
    vec!["live".to_string()]
}

fn default_short_drama_keys() -> Vec<String> {
    vec!["shortdrama".to_string()]
}

fn default_log_level() -> String {
    "info".to_string()
}

// ========================================
// Parsing and validation
// ========================================

impl TomlConfig {
    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Check cross-field constraints. Errors name the offending field.
    pub fn validate(&self) -> Result<()> {
        self.server.bind.parse::<SocketAddr>().map_err(|e| {
            Error::Config(format!("server.bind '{}' is not host:port: {}", self.server.bind, e))
        })?;

        if self.search.source_timeout_ms == 0 {
            return Err(Error::Config(
                "search.source_timeout_ms must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            if source.key.trim().is_empty() {
                return Err(Error::Config(format!("sources[{}].key must not be empty", i)));
            }
            if source.api.trim().is_empty() {
                return Err(Error::Config(format!(
                    "sources[{}].api must not be empty (key '{}')",
                    i, source.key
                )));
            }
            if !seen.insert(source.key.as_str()) {
                return Err(Error::Config(format!(
                    "sources[{}].key '{}' is a duplicate",
                    i, source.key
                )));
            }
        }

        for (name, user) in &self.users {
            if let Some(allowed) = &user.sources {
                for key in allowed.iter().filter(|k| !seen.contains(k.as_str())) {
                    warn!("users.{}.sources references unknown source '{}'", name, key);
                }
            }
        }

        Ok(())
    }
}

// ========================================
// Config file resolution
// ========================================

/// Locates the config file following the priority order above
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_arg: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_arg: Option<PathBuf>) -> Self {
        Self { cli_arg }
    }

    /// Resolve the config file path. `None` means "use compiled defaults".
    ///
    /// Explicit paths (argument or environment) are returned even when the
    /// file does not exist, so the caller can warn about them.
    pub fn resolve(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config file
        default_config_paths().into_iter().find(|p| p.exists())
    }

    /// Resolve and load the configuration.
    ///
    /// Returns the config and the path it came from (`None` for compiled
    /// defaults). A missing file falls back to defaults with a warning.
    pub fn load_or_default(&self) -> Result<(TomlConfig, Option<PathBuf>)> {
        match self.resolve() {
            Some(path) if path.exists() => {
                let config = TomlConfig::load(&path)?;
                info!("Loaded configuration from {}", path.display());
                Ok((config, Some(path)))
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using compiled defaults",
                    path.display()
                );
                Ok((TomlConfig::default(), None))
            }
            None => {
                warn!("No config file found, using compiled defaults");
                Ok((TomlConfig::default(), None))
            }
        }
    }
}

/// Platform config file candidates in lookup order
fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("mfan").join("config.toml"));
    }
    if cfg!(target_os = "linux") {
        paths.push(PathBuf::from("/etc/mfan/config.toml"));
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.server.bind, DEFAULT_BIND);
        assert_eq!(config.search.source_timeout_ms, 8000);
        assert_eq!(config.auth.max_clock_skew_ms, 30_000);
        assert!(!config.auth.signatures_enabled());
        assert!(config.sources.is_empty());
        assert_eq!(config.classifier.live_source_keys, vec!["live"]);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_content_filter_snapshot_normalises_terms() {
        let config = TomlConfig::from_toml_str(
            r#"
            [content_filter]
            blocked_terms = ["测试", " FOO ", ""]

            [content_filter.groups]
            VIP = true
            "#,
        )
        .unwrap();

        let snapshot = config.content_filter.to_snapshot();
        assert!(!snapshot.global_filter_disabled);
        assert_eq!(snapshot.group_policies.get("VIP"), Some(&true));
        assert_eq!(snapshot.blocked_terms.iter().collect::<Vec<_>>(), vec!["测试", "foo"]);
    }

    #[test]
    fn test_duplicate_source_key_rejected() {
        let err = TomlConfig::from_toml_str(
            r#"
            [[sources]]
            key = "s1"
            name = "One"
            api = "http://a"

            [[sources]]
            key = "s1"
            name = "Again"
            api = "http://b"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("sources[1].key"));
    }

    #[test]
    fn test_bad_bind_rejected() {
        let err = TomlConfig::from_toml_str("[server]\nbind = \"nowhere\"").unwrap_err();
        assert!(err.to_string().contains("server.bind"));
    }

    #[test]
    fn test_user_role_parsed() {
        let config = TomlConfig::from_toml_str(
            r#"
            [users.alice]
            role = "owner"
            groups = ["VIP"]
            "#,
        )
        .unwrap();
        let alice = &config.users["alice"];
        assert_eq!(alice.role, Role::Owner);
        assert_eq!(alice.groups, vec!["VIP"]);
        assert!(alice.sources.is_none());
    }
}
