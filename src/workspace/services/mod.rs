//! Application services for project and workspace lifecycle orchestration.

mod access;
mod lifecycle;

pub use access::ProjectAccess;
pub use lifecycle::{
    CreateProjectRequest, ProvisionOutcome, WorkspaceService, WorkspaceServiceError,
    WorkspaceServiceResult, WorkspaceSettings,
};
