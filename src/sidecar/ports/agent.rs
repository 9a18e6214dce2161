//! Agent run control.

use super::SidecarResult;
use crate::session::domain::SessionId;
use crate::sidecar::domain::{RunAcknowledgement, RunRequest};
use crate::workspace::domain::WorkspaceAddress;
use async_trait::async_trait;

/// Starts and stops agent runs inside a workspace.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Asks the workspace agent to start a run.
    async fn start_run(
        &self,
        address: &WorkspaceAddress,
        request: &RunRequest,
    ) -> SidecarResult<RunAcknowledgement>;

    /// Asks the workspace agent to stop a run.
    ///
    /// An upstream 404 is reported as [`super::SidecarError::UpstreamStatus`];
    /// callers decide whether that counts as success.
    async fn stop_run(&self, address: &WorkspaceAddress, session_id: SessionId)
    -> SidecarResult<()>;
}
