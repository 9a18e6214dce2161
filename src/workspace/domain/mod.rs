//! Domain model for projects and their compute workspaces.

mod error;
mod ids;
mod pod;
mod project;

pub use error::{ParsePodPhaseError, ParseProjectStatusError, WorkspaceDomainError};
pub use ids::{ProjectId, UserId};
pub use pod::{PodPhase, PodRef, WorkspaceAddress, WorkspaceSpec};
pub use project::{NewProject, PersistedProjectData, Project, ProjectStatus};
