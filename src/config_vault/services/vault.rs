//! Service layer for configuration versioning and credential handling.

use crate::config_vault::{
    domain::{ConfigDraft, ConfigSettings, ConfigValidationError, Credential, OpenCodeConfig},
    ports::{
        CipherError, ConfigRepository, ConfigRepositoryError, ConfigRepositoryResult,
        CredentialCipher,
    },
};
use crate::workspace::domain::{ProjectId, UserId};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for configuration vault operations.
#[derive(Debug, Error)]
pub enum ConfigVaultError {
    /// Settings failed validation.
    #[error(transparent)]
    Validation(#[from] ConfigValidationError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ConfigRepositoryError),
    /// Encryption or decryption failed.
    #[error(transparent)]
    Cipher(#[from] CipherError),
    /// The project has no configuration yet.
    #[error("no active configuration for project {0}")]
    NoActiveConfig(ProjectId),
    /// The active configuration carries no credential.
    #[error("no API key configured for project {0}")]
    NoCredential(ProjectId),
}

/// Result type for configuration vault operations.
pub type ConfigVaultResult<T> = Result<T, ConfigVaultError>;

/// Versioned configuration service.
///
/// Every read exposed by this service returns sanitised configurations.
/// Decrypted credentials are only reachable through
/// [`super::CredentialProvider`].
#[derive(Clone)]
pub struct ConfigVaultService<R, K, C>
where
    R: ConfigRepository + ?Sized,
    K: CredentialCipher + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    cipher: Arc<K>,
    clock: Arc<C>,
}

impl<R, K, C> ConfigVaultService<R, K, C>
where
    R: ConfigRepository + ?Sized,
    K: CredentialCipher + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new configuration vault service.
    #[must_use]
    pub const fn new(repository: Arc<R>, cipher: Arc<K>, clock: Arc<C>) -> Self {
        Self {
            repository,
            cipher,
            clock,
        }
    }

    /// Validates `settings` and appends them as the new active version.
    ///
    /// A non-empty credential is encrypted with a fresh nonce. An absent or
    /// empty credential stores no blob.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigVaultError::Validation`] for invalid settings,
    /// [`ConfigVaultError::Cipher`] when encryption fails, and
    /// [`ConfigVaultError::Repository`] when persistence fails.
    pub async fn create_or_update(
        &self,
        project_id: ProjectId,
        created_by: UserId,
        settings: ConfigSettings,
        credential: Option<Credential>,
    ) -> ConfigVaultResult<OpenCodeConfig> {
        settings.validate()?;
        let encrypted_credential = credential
            .filter(|value| !value.expose().is_empty())
            .map(|value| self.cipher.encrypt(&value))
            .transpose()?;

        let draft = ConfigDraft::new(
            project_id,
            settings,
            encrypted_credential,
            created_by,
            &*self.clock,
        );
        let config = self.append(&draft).await?;
        tracing::info!(project_id = %project_id, version = config.version(), "configuration version created");
        Ok(config.sanitized())
    }

    /// Returns the active configuration without its credential.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigVaultError::NoActiveConfig`] when the project has no
    /// configuration.
    pub async fn active_config(&self, project_id: ProjectId) -> ConfigVaultResult<OpenCodeConfig> {
        self.load_active(project_id)
            .await
            .map(|config| config.sanitized())
    }

    /// Returns every version, newest first, without credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigVaultError::Repository`] when the lookup fails.
    pub async fn history(&self, project_id: ProjectId) -> ConfigVaultResult<Vec<OpenCodeConfig>> {
        let versions = self.repository.history(project_id).await?;
        Ok(versions.iter().map(OpenCodeConfig::sanitized).collect())
    }

    /// Copies `version` forward as a new active version.
    ///
    /// The old row is never reactivated, keeping the history linear.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigRepositoryError::VersionNotFound`] (wrapped in
    /// [`ConfigVaultError::Repository`]) when the version does not exist.
    pub async fn rollback(
        &self,
        project_id: ProjectId,
        version: u32,
        created_by: UserId,
    ) -> ConfigVaultResult<OpenCodeConfig> {
        let target = self
            .repository
            .find_version(project_id, version)
            .await?
            .ok_or(ConfigRepositoryError::VersionNotFound {
                project_id,
                version,
            })?;

        let draft = ConfigDraft::copy_of(&target, created_by, &*self.clock);
        let config = self.append(&draft).await?;
        tracing::info!(
            project_id = %project_id,
            from_version = version,
            version = config.version(),
            "configuration rolled back"
        );
        Ok(config.sanitized())
    }

    /// Deletes an inactive version.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigRepositoryError::ActiveVersion`] or
    /// [`ConfigRepositoryError::VersionNotFound`] wrapped in
    /// [`ConfigVaultError::Repository`].
    pub async fn delete_version(&self, project_id: ProjectId, version: u32) -> ConfigVaultResult<()> {
        self.repository.delete_version(project_id, version).await?;
        Ok(())
    }

    /// Decrypts the active version's credential.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigVaultError::NoCredential`] when the active version
    /// has no credential; decryption is never attempted on empty bytes.
    pub async fn decrypted_credential(&self, project_id: ProjectId) -> ConfigVaultResult<Credential> {
        let active = self.load_active(project_id).await?;
        let encrypted = active
            .encrypted_credential()
            .ok_or(ConfigVaultError::NoCredential(project_id))?;
        Ok(self.cipher.decrypt(encrypted)?)
    }

    pub(super) async fn load_active(&self, project_id: ProjectId) -> ConfigVaultResult<OpenCodeConfig> {
        self.repository
            .find_active(project_id)
            .await?
            .ok_or(ConfigVaultError::NoActiveConfig(project_id))
    }

    pub(super) fn decrypt(&self, config: &OpenCodeConfig) -> ConfigVaultResult<Option<Credential>> {
        config
            .encrypted_credential()
            .map(|encrypted| self.cipher.decrypt(encrypted))
            .transpose()
            .map_err(ConfigVaultError::from)
    }

    async fn append(&self, draft: &ConfigDraft) -> ConfigRepositoryResult<OpenCodeConfig> {
        match self.repository.create_version(draft).await {
            Err(ConfigRepositoryError::VersionConflict(project_id)) => {
                tracing::debug!(project_id = %project_id, "configuration version conflict, retrying");
                self.repository.create_version(draft).await
            }
            result => result,
        }
    }
}
