//! In-memory adapters for workspace tests and local runs.

mod orchestrator;
mod project;

pub use orchestrator::InMemoryOrchestrator;
pub use project::InMemoryProjectRepository;
