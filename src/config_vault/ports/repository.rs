//! Repository port for the configuration version log.

use crate::config_vault::domain::{ConfigDraft, OpenCodeConfig};
use crate::workspace::domain::ProjectId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for configuration repository operations.
pub type ConfigRepositoryResult<T> = Result<T, ConfigRepositoryError>;

/// Configuration log persistence contract.
///
/// Implementations must never expose a state with zero or two active
/// versions for a project that has at least one version.
#[async_trait]
pub trait ConfigRepository: Send + Sync {
    /// Appends `draft` as the new active version.
    ///
    /// Allocates `max(version) + 1`, deactivates the previous active version,
    /// and inserts the new one in a single atomic step.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigRepositoryError::VersionConflict`] when a concurrent
    /// writer claimed the same version number.
    async fn create_version(&self, draft: &ConfigDraft) -> ConfigRepositoryResult<OpenCodeConfig>;

    /// Finds the active version of a project.
    async fn find_active(&self, project_id: ProjectId)
    -> ConfigRepositoryResult<Option<OpenCodeConfig>>;

    /// Finds a specific version of a project.
    async fn find_version(
        &self,
        project_id: ProjectId,
        version: u32,
    ) -> ConfigRepositoryResult<Option<OpenCodeConfig>>;

    /// Lists every version of a project, newest first.
    async fn history(&self, project_id: ProjectId) -> ConfigRepositoryResult<Vec<OpenCodeConfig>>;

    /// Deletes an inactive version.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigRepositoryError::VersionNotFound`] for unknown
    /// versions and [`ConfigRepositoryError::ActiveVersion`] when the version
    /// is active.
    async fn delete_version(&self, project_id: ProjectId, version: u32)
    -> ConfigRepositoryResult<()>;
}

/// Errors returned by configuration repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ConfigRepositoryError {
    /// Another writer allocated the same version concurrently.
    #[error("concurrent configuration update for project {0}")]
    VersionConflict(ProjectId),

    /// The requested version does not exist.
    #[error("configuration version {version} not found for project {project_id}")]
    VersionNotFound {
        /// Owning project.
        project_id: ProjectId,
        /// Requested version.
        version: u32,
    },

    /// The active version cannot be deleted.
    #[error("configuration version {version} of project {project_id} is active")]
    ActiveVersion {
        /// Owning project.
        project_id: ProjectId,
        /// Requested version.
        version: u32,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ConfigRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
