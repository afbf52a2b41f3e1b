//! Source registry backed by `[[sources]]` and per-user allow-lists

use async_trait::async_trait;
use mfan_common::config::UserConfig;
use mfan_common::models::{Principal, SourceDescriptor};
use std::collections::BTreeMap;

use crate::collaborators::SourceRegistry;
use crate::error::RegistryError;

/// Enabled sources in configuration order, narrowed by the user's allow-list
///
/// Owners and admins always get every enabled source. Users without an
/// allow-list entry get every enabled source too.
pub struct ConfigSourceRegistry {
    sources: Vec<SourceDescriptor>,
    users: BTreeMap<String, UserConfig>,
}

impl ConfigSourceRegistry {
    pub fn new(sources: Vec<SourceDescriptor>, users: BTreeMap<String, UserConfig>) -> Self {
        Self { sources, users }
    }
}

#[async_trait]
impl SourceRegistry for ConfigSourceRegistry {
    async fn permitted_sources(
        &self,
        principal: &Principal,
    ) -> Result<Vec<SourceDescriptor>, RegistryError> {
        let allow_list = if principal.is_privileged() {
            None
        } else {
            self.users
                .get(&principal.username)
                .and_then(|u| u.sources.as_ref())
        };

        Ok(self
            .sources
            .iter()
            .filter(|s| s.enabled)
            .filter(|s| allow_list.map_or(true, |allowed| allowed.iter().any(|k| *k == s.key)))
            .cloned()
            .collect())
    }
}
