//! In-memory repository for configuration versions.

use crate::config_vault::{
    domain::{ConfigDraft, OpenCodeConfig},
    ports::{ConfigRepository, ConfigRepositoryError, ConfigRepositoryResult},
};
use crate::workspace::domain::ProjectId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory configuration repository.
///
/// Version allocation and activation happen under one write lock, which
/// gives the same atomicity as the transactional adapter.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigRepository {
    state: Arc<RwLock<HashMap<ProjectId, Vec<OpenCodeConfig>>>>,
}

impl InMemoryConfigRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl std::fmt::Display) -> ConfigRepositoryError {
    ConfigRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ConfigRepository for InMemoryConfigRepository {
    async fn create_version(&self, draft: &ConfigDraft) -> ConfigRepositoryResult<OpenCodeConfig> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        let versions = state.entry(draft.project_id()).or_default();

        let next_version = versions
            .iter()
            .map(OpenCodeConfig::version)
            .max()
            .map_or(1, |latest| latest.saturating_add(1));
        versions.iter_mut().for_each(OpenCodeConfig::deactivate);

        let config = OpenCodeConfig::activate(draft.clone(), next_version);
        versions.push(config.clone());
        Ok(config)
    }

    async fn find_active(
        &self,
        project_id: ProjectId,
    ) -> ConfigRepositoryResult<Option<OpenCodeConfig>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state
            .get(&project_id)
            .and_then(|versions| versions.iter().find(|config| config.is_active()))
            .cloned())
    }

    async fn find_version(
        &self,
        project_id: ProjectId,
        version: u32,
    ) -> ConfigRepositoryResult<Option<OpenCodeConfig>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(state
            .get(&project_id)
            .and_then(|versions| versions.iter().find(|config| config.version() == version))
            .cloned())
    }

    async fn history(&self, project_id: ProjectId) -> ConfigRepositoryResult<Vec<OpenCodeConfig>> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        let mut versions = state.get(&project_id).cloned().unwrap_or_default();
        versions.sort_by_key(|config| std::cmp::Reverse(config.version()));
        Ok(versions)
    }

    async fn delete_version(
        &self,
        project_id: ProjectId,
        version: u32,
    ) -> ConfigRepositoryResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        let versions = state
            .get_mut(&project_id)
            .ok_or(ConfigRepositoryError::VersionNotFound {
                project_id,
                version,
            })?;
        let position = versions
            .iter()
            .position(|config| config.version() == version)
            .ok_or(ConfigRepositoryError::VersionNotFound {
                project_id,
                version,
            })?;
        if versions
            .get(position)
            .is_some_and(OpenCodeConfig::is_active)
        {
            return Err(ConfigRepositoryError::ActiveVersion {
                project_id,
                version,
            });
        }
        versions.remove(position);
        Ok(())
    }
}
