//! Error types for project validation and parsing.

use super::{ProjectId, ProjectStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating project values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkspaceDomainError {
    /// The project name is empty after trimming.
    #[error("project name must not be empty")]
    EmptyProjectName,

    /// The project name exceeds the persisted column width.
    #[error("project name is {0} characters, maximum is {max}", max = super::project::MAX_PROJECT_NAME_CHARS)]
    ProjectNameTooLong(usize),

    /// The project status transition is not permitted.
    #[error("invalid project status transition for {project_id}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Project identifier.
        project_id: ProjectId,
        /// Current status.
        from: ProjectStatus,
        /// Requested status.
        to: ProjectStatus,
    },
}

/// Error returned while parsing project statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown project status: {0}")]
pub struct ParseProjectStatusError(pub String);

/// Error returned while parsing pod phases from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown pod phase: {0}")]
pub struct ParsePodPhaseError(pub String);
