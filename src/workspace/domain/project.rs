//! Project aggregate root and aggregate status.

use super::{
    ParseProjectStatusError, PodPhase, PodRef, ProjectId, UserId, WorkspaceDomainError,
    WorkspaceSpec,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of characters accepted for a project name.
pub const MAX_PROJECT_NAME_CHARS: usize = 255;

/// Aggregate project status.
///
/// Independent of the live pod phase: provisioning is eventually consistent
/// and may fail without removing the project record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Workspace provisioning has been requested.
    Initializing,
    /// Workspace was provisioned.
    Ready,
    /// Workspace provisioning or operation failed.
    Error,
    /// Project is archived and no longer schedulable.
    Archived,
}

impl ProjectStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Error => "error",
            Self::Archived => "archived",
        }
    }

    /// Returns whether moving to `target` is permitted.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Initializing, Self::Ready | Self::Error | Self::Archived)
                | (Self::Ready, Self::Error | Self::Archived)
                | (Self::Error, Self::Ready | Self::Archived)
        )
    }
}

impl TryFrom<&str> for ProjectStatus {
    type Error = ParseProjectStatusError;

    fn try_from(value: &str) -> Result<Self, ParseProjectStatusError> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "initializing" => Ok(Self::Initializing),
            "ready" => Ok(Self::Ready),
            "error" => Ok(Self::Error),
            "archived" => Ok(Self::Archived),
            _ => Err(ParseProjectStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated input for a new project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    owner_id: UserId,
    name: String,
    description: Option<String>,
}

impl NewProject {
    /// Validates the project name and captures the owner.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::EmptyProjectName`] for blank names and
    /// [`WorkspaceDomainError::ProjectNameTooLong`] for oversized names.
    pub fn new(owner_id: UserId, name: impl Into<String>) -> Result<Self, WorkspaceDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(WorkspaceDomainError::EmptyProjectName);
        }
        let length = trimmed.chars().count();
        if length > MAX_PROJECT_NAME_CHARS {
            return Err(WorkspaceDomainError::ProjectNameTooLong(length));
        }
        Ok(Self {
            owner_id,
            name: trimmed.to_owned(),
            description: None,
        })
    }

    /// Sets the optional description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Project aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    owner_id: UserId,
    name: String,
    description: Option<String>,
    pod: PodRef,
    volume_name: String,
    status: ProjectStatus,
    pod_status: Option<PodPhase>,
    pod_error: Option<String>,
    pod_created_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted project aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedProjectData {
    /// Persisted project identifier.
    pub id: ProjectId,
    /// Persisted owner.
    pub owner_id: UserId,
    /// Persisted name.
    pub name: String,
    /// Persisted description.
    pub description: Option<String>,
    /// Persisted compute resource reference.
    pub pod: PodRef,
    /// Persisted volume name.
    pub volume_name: String,
    /// Persisted aggregate status.
    pub status: ProjectStatus,
    /// Last observed pod phase.
    pub pod_status: Option<PodPhase>,
    /// Last provisioning error.
    pub pod_error: Option<String>,
    /// Timestamp of successful provisioning.
    pub pod_created_at: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a project in the `initializing` status.
    ///
    /// The workspace identities are derived from the freshly generated
    /// project identifier.
    #[must_use]
    pub fn new(input: NewProject, namespace: &str, clock: &impl Clock) -> Self {
        let id = ProjectId::new();
        let timestamp = clock.utc();
        Self {
            id,
            owner_id: input.owner_id,
            name: input.name,
            description: input.description,
            pod: PodRef::for_project(id, namespace),
            volume_name: WorkspaceSpec::volume_name_for(id),
            status: ProjectStatus::Initializing,
            pod_status: None,
            pod_error: None,
            pod_created_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a project from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedProjectData) -> Self {
        Self {
            id: data.id,
            owner_id: data.owner_id,
            name: data.name,
            description: data.description,
            pod: data.pod,
            volume_name: data.volume_name,
            status: data.status,
            pod_status: data.pod_status,
            pod_error: data.pod_error,
            pod_created_at: data.pod_created_at,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the project name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the project description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the compute resource reference.
    #[must_use]
    pub const fn pod(&self) -> &PodRef {
        &self.pod
    }

    /// Returns the persistent volume name.
    #[must_use]
    pub fn volume_name(&self) -> &str {
        &self.volume_name
    }

    /// Returns the aggregate status.
    #[must_use]
    pub const fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Returns the last observed pod phase.
    #[must_use]
    pub const fn pod_status(&self) -> Option<PodPhase> {
        self.pod_status
    }

    /// Returns the last provisioning error message.
    #[must_use]
    pub fn pod_error(&self) -> Option<&str> {
        self.pod_error.as_deref()
    }

    /// Returns when the workspace was provisioned.
    #[must_use]
    pub const fn pod_created_at(&self) -> Option<DateTime<Utc>> {
        self.pod_created_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether `user_id` owns this project.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Builds the provisioning specification for this project.
    #[must_use]
    pub fn workspace_spec(&self) -> WorkspaceSpec {
        WorkspaceSpec::new(self.id, self.pod.clone(), self.volume_name.clone())
    }

    /// Records successful provisioning.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::InvalidStatusTransition`] when the
    /// project cannot become ready from its current status.
    pub fn mark_provisioned(&mut self, clock: &impl Clock) -> Result<(), WorkspaceDomainError> {
        self.transition_to(ProjectStatus::Ready)?;
        self.pod_error = None;
        self.pod_status = Some(PodPhase::Pending);
        self.pod_created_at = Some(clock.utc());
        self.touch(clock);
        Ok(())
    }

    /// Records a provisioning failure.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::InvalidStatusTransition`] when the
    /// project cannot enter the error status from its current status.
    pub fn mark_provisioning_failed(
        &mut self,
        reason: &str,
        clock: &impl Clock,
    ) -> Result<(), WorkspaceDomainError> {
        self.transition_to(ProjectStatus::Error)?;
        self.pod_error = Some(format!("Pod creation failed: {reason}"));
        self.touch(clock);
        Ok(())
    }

    /// Records the latest observed pod phase.
    pub fn record_pod_phase(&mut self, phase: PodPhase, clock: &impl Clock) {
        self.pod_status = Some(phase);
        self.touch(clock);
    }

    /// Archives the project.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceDomainError::InvalidStatusTransition`] when the
    /// project is already archived.
    pub fn archive(&mut self, clock: &impl Clock) -> Result<(), WorkspaceDomainError> {
        self.transition_to(ProjectStatus::Archived)?;
        self.touch(clock);
        Ok(())
    }

    fn transition_to(&mut self, target: ProjectStatus) -> Result<(), WorkspaceDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(WorkspaceDomainError::InvalidStatusTransition {
                project_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
