//! Compute workspace identities, addresses, and observed phases.

use super::{ParsePodPhaseError, ProjectId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name and namespace of a project's compute resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PodRef {
    name: String,
    namespace: String,
}

impl PodRef {
    /// Creates a reference from raw parts.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Derives the deterministic compute-resource name for a project.
    ///
    /// # Examples
    ///
    /// ```
    /// use uuid::Uuid;
    /// use vibe_control::workspace::domain::{PodRef, ProjectId};
    ///
    /// let id = ProjectId::from_uuid(Uuid::parse_str("3f2a9c1e-0000-4000-8000-000000000000").unwrap());
    /// let pod = PodRef::for_project(id, "opencode");
    /// assert_eq!(pod.name(), "project-3f2a9c1e");
    /// ```
    #[must_use]
    pub fn for_project(project_id: ProjectId, namespace: impl Into<String>) -> Self {
        Self::new(format!("project-{}", project_id.short()), namespace)
    }

    /// Returns the resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the resource namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl fmt::Display for PodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Everything an orchestrator needs to provision one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSpec {
    project_id: ProjectId,
    pod: PodRef,
    volume_name: String,
}

impl WorkspaceSpec {
    /// Creates a provisioning specification.
    #[must_use]
    pub fn new(project_id: ProjectId, pod: PodRef, volume_name: impl Into<String>) -> Self {
        Self {
            project_id,
            pod,
            volume_name: volume_name.into(),
        }
    }

    /// Derives the deterministic volume name for a project.
    #[must_use]
    pub fn volume_name_for(project_id: ProjectId) -> String {
        format!("workspace-{}", project_id.short())
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
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
}

/// Network address of a running workspace.
///
/// Addresses are internal infrastructure details and must never be echoed
/// back to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceAddress(String);

impl WorkspaceAddress {
    /// Wraps a host name or IP address.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }

    /// Returns the host component.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.0
    }

    /// Builds an absolute URL for a port and path on this workspace.
    #[must_use]
    pub fn url(&self, scheme: &str, port: u16, path: &str) -> String {
        format!("{scheme}://{}:{port}{path}", self.0)
    }
}

impl fmt::Display for WorkspaceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Observed phase of a compute resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PodPhase {
    /// Accepted but not yet running.
    Pending,
    /// All containers are running.
    Running,
    /// Terminated successfully.
    Succeeded,
    /// Terminated with a failure.
    Failed,
    /// Phase could not be determined.
    Unknown,
    /// The resource does not exist.
    NotFound,
    /// The resource disappeared while being watched.
    Deleted,
}

impl PodPhase {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
            Self::NotFound => "NotFound",
            Self::Deleted => "Deleted",
        }
    }

    /// Returns `true` when the resource no longer exists.
    #[must_use]
    pub const fn is_gone(self) -> bool {
        matches!(self, Self::NotFound | Self::Deleted)
    }
}

impl TryFrom<&str> for PodPhase {
    type Error = ParsePodPhaseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim() {
            "Pending" => Ok(Self::Pending),
            "Running" => Ok(Self::Running),
            "Succeeded" => Ok(Self::Succeeded),
            "Failed" => Ok(Self::Failed),
            "Unknown" => Ok(Self::Unknown),
            "NotFound" => Ok(Self::NotFound),
            "Deleted" => Ok(Self::Deleted),
            _ => Err(ParsePodPhaseError(value.to_owned())),
        }
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
