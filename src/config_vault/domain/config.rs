//! Configuration version aggregate.

use super::{ConfigId, ConfigSettings, EncryptedCredential};
use crate::workspace::domain::{ProjectId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;

/// A configuration version that has not been assigned a version number.
///
/// Version numbers are allocated by the repository inside the same atomic
/// step that deactivates the previously active version.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDraft {
    id: ConfigId,
    project_id: ProjectId,
    settings: ConfigSettings,
    encrypted_credential: Option<EncryptedCredential>,
    created_by: UserId,
    created_at: DateTime<Utc>,
}

impl ConfigDraft {
    /// Creates a draft from validated settings and an optional encrypted
    /// credential.
    #[must_use]
    pub fn new(
        project_id: ProjectId,
        settings: ConfigSettings,
        encrypted_credential: Option<EncryptedCredential>,
        created_by: UserId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: ConfigId::new(),
            project_id,
            settings,
            encrypted_credential,
            created_by,
            created_at: clock.utc(),
        }
    }

    /// Creates a draft that copies an existing version forward.
    #[must_use]
    pub fn copy_of(config: &OpenCodeConfig, created_by: UserId, clock: &impl Clock) -> Self {
        Self::new(
            config.project_id,
            config.settings.clone(),
            config.encrypted_credential.clone(),
            created_by,
            clock,
        )
    }

    /// Returns the identifier the version will carry.
    #[must_use]
    pub const fn id(&self) -> ConfigId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &ConfigSettings {
        &self.settings
    }

    /// Returns the encrypted credential, if any.
    #[must_use]
    pub const fn encrypted_credential(&self) -> Option<&EncryptedCredential> {
        self.encrypted_credential.as_ref()
    }

    /// Returns the author.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// One version in a project's configuration log.
///
/// Serialisation never includes the encrypted credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenCodeConfig {
    id: ConfigId,
    project_id: ProjectId,
    version: u32,
    is_active: bool,
    #[serde(flatten)]
    settings: ConfigSettings,
    #[serde(skip)]
    encrypted_credential: Option<EncryptedCredential>,
    created_by: UserId,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted configuration version.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedConfigData {
    /// Persisted identifier.
    pub id: ConfigId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Version number within the project.
    pub version: u32,
    /// Whether this version is active.
    pub is_active: bool,
    /// Persisted settings.
    pub settings: ConfigSettings,
    /// Persisted encrypted credential.
    pub encrypted_credential: Option<EncryptedCredential>,
    /// Author.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl OpenCodeConfig {
    /// Materialises a draft as the new active version.
    #[must_use]
    pub fn activate(draft: ConfigDraft, version: u32) -> Self {
        Self {
            id: draft.id,
            project_id: draft.project_id,
            version,
            is_active: true,
            settings: draft.settings,
            encrypted_credential: draft.encrypted_credential,
            created_by: draft.created_by,
            created_at: draft.created_at,
        }
    }

    /// Reconstructs a version from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedConfigData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            version: data.version,
            is_active: data.is_active,
            settings: data.settings,
            encrypted_credential: data.encrypted_credential,
            created_by: data.created_by,
            created_at: data.created_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> ConfigId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the version number.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns whether this version is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &ConfigSettings {
        &self.settings
    }

    /// Returns the encrypted credential, if any.
    #[must_use]
    pub const fn encrypted_credential(&self) -> Option<&EncryptedCredential> {
        self.encrypted_credential.as_ref()
    }

    /// Returns the author.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Marks this version inactive.
    pub const fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Returns a copy with the encrypted credential removed.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            encrypted_credential: None,
            ..self.clone()
        }
    }
}
