//! Shared world state for control-plane BDD scenarios.

use crate::test_helpers::{Reply, TestApp};
use rstest::fixture;

/// Scenario world driving the HTTP router.
pub struct ControlPlaneWorld {
    pub app: TestApp,
    pub project_id: Option<String>,
    pub task_id: Option<String>,
    pub second_task_id: Option<String>,
    pub session_id: Option<String>,
    pub replies: Vec<Reply>,
}

impl ControlPlaneWorld {
    /// Creates a world over a fresh in-memory app.
    #[must_use]
    pub fn new() -> Self {
        Self {
            app: TestApp::new(),
            project_id: None,
            task_id: None,
            second_task_id: None,
            session_id: None,
            replies: Vec::new(),
        }
    }

    /// The scenario's project.
    pub fn project_id(&self) -> Result<&str, eyre::Report> {
        self.project_id
            .as_deref()
            .ok_or_else(|| eyre::eyre!("missing project in scenario world"))
    }

    /// The scenario's primary task.
    pub fn task_id(&self) -> Result<&str, eyre::Report> {
        self.task_id
            .as_deref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// The most recent response.
    pub fn last_reply(&self) -> Result<&Reply, eyre::Report> {
        self.replies
            .last()
            .ok_or_else(|| eyre::eyre!("no request has been made"))
    }
}

impl Default for ControlPlaneWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ControlPlaneWorld {
    ControlPlaneWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
