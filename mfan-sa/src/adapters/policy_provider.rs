//! Content policy providers

use async_trait::async_trait;
use mfan_common::config::ContentFilterConfig;
use mfan_common::models::PolicySnapshot;
use std::path::PathBuf;
use tracing::debug;

use crate::collaborators::PolicyProvider;
use crate::error::PolicyError;

/// Serves a fixed snapshot
#[derive(Debug, Clone, Default)]
pub struct StaticPolicyProvider {
    snapshot: PolicySnapshot,
}

impl StaticPolicyProvider {
    pub fn new(snapshot: PolicySnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl PolicyProvider for StaticPolicyProvider {
    async fn snapshot(&self) -> Result<PolicySnapshot, PolicyError> {
        Ok(self.snapshot.clone())
    }
}

/// Re-reads `[content_filter]` from the config file for every session, so
/// edits take effect on the next search without a restart
#[derive(Debug, Clone)]
pub struct FilePolicyProvider {
    path: PathBuf,
}

impl FilePolicyProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PolicyProvider for FilePolicyProvider {
    async fn snapshot(&self) -> Result<PolicySnapshot, PolicyError> {
        let path = self.path.clone();
        let filter = tokio::task::spawn_blocking(move || ContentFilterConfig::load_from_file(&path))
            .await
            .map_err(|e| PolicyError(format!("policy reader task failed: {}", e)))?
            .map_err(|e| PolicyError(format!("{}: {}", self.path.display(), e)))?;

        debug!(path = %self.path.display(), "Content policy reloaded");
        Ok(filter.to_snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_provider_picks_up_edits() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[content_filter]\nblocked_terms = [\"one\"]").unwrap();
        let provider = FilePolicyProvider::new(file.path());

        let first = provider.snapshot().await.unwrap();
        assert_eq!(first.blocked_terms.iter().collect::<Vec<_>>(), vec!["one"]);

        std::fs::write(
            file.path(),
            "[content_filter]\ndisabled = true\nblocked_terms = [\"two\"]\n",
        )
        .unwrap();
        let second = provider.snapshot().await.unwrap();
        assert!(second.global_filter_disabled);
        assert_eq!(second.blocked_terms.iter().collect::<Vec<_>>(), vec!["two"]);
    }

    #[tokio::test]
    async fn test_file_provider_unreadable_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let provider = FilePolicyProvider::new(dir.path().join("missing.toml"));
        assert!(provider.snapshot().await.is_err());
    }

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticPolicyProvider::default();
        let snapshot = provider.snapshot().await.unwrap();
        assert!(snapshot.blocked_terms.is_empty());
    }
}
