//! Port contracts for project persistence and workspace orchestration.

pub mod orchestrator;
pub mod repository;

pub use orchestrator::{OrchestratorError, OrchestratorResult, WorkspaceOrchestrator};
pub use repository::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult};
