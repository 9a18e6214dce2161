//! Internal credential capability consumed by the execution coordinator.

use super::vault::{ConfigVaultResult, ConfigVaultService};
use crate::config_vault::{
    domain::{Credential, OpenCodeConfig},
    ports::{ConfigRepository, CredentialCipher},
};
use crate::workspace::domain::ProjectId;
use async_trait::async_trait;
use mockable::Clock;

/// Active configuration paired with its decrypted credential.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Active configuration, sanitised.
    pub config: OpenCodeConfig,
    /// Decrypted credential, or `None` when the version has none.
    pub credential: Option<Credential>,
}

/// Internal-only access to decrypted agent configuration.
///
/// Never wire this into a public read path.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Returns the active configuration with its decrypted credential.
    async fn agent_settings(&self, project_id: ProjectId) -> ConfigVaultResult<AgentSettings>;

    /// Returns the decrypted credential of the active configuration.
    async fn credential(&self, project_id: ProjectId) -> ConfigVaultResult<Credential>;
}

#[async_trait]
impl<R, K, C> CredentialProvider for ConfigVaultService<R, K, C>
where
    R: ConfigRepository + ?Sized,
    K: CredentialCipher + ?Sized,
    C: Clock + Send + Sync,
{
    async fn agent_settings(&self, project_id: ProjectId) -> ConfigVaultResult<AgentSettings> {
        let active = self.load_active(project_id).await?;
        let credential = self.decrypt(&active)?;
        Ok(AgentSettings {
            config: active.sanitized(),
            credential,
        })
    }

    async fn credential(&self, project_id: ProjectId) -> ConfigVaultResult<Credential> {
        self.decrypted_credential(project_id).await
    }
}
