//! Orchestrator port for compute workspace lifecycle operations.

use crate::workspace::domain::{PodPhase, PodRef, WorkspaceAddress, WorkspaceSpec};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Narrow contract over the container orchestrator.
///
/// Implementations bound every call with a timeout so a degraded
/// orchestrator cannot hold request handlers indefinitely.
#[async_trait]
pub trait WorkspaceOrchestrator: Send + Sync {
    /// Provisions the volume and compute resource described by `spec`.
    ///
    /// The volume is created first. If the compute resource cannot be
    /// created, the volume is removed again before the error is returned.
    async fn provision(&self, spec: &WorkspaceSpec) -> OrchestratorResult<()>;

    /// Removes the compute resource and its volume.
    ///
    /// Tearing down an absent resource succeeds.
    async fn teardown(&self, pod: &PodRef, volume_name: &str) -> OrchestratorResult<()>;

    /// Resolves the network address of a running compute resource.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotFound`] when the resource does not
    /// exist and [`OrchestratorError::NotReady`] when it exists without an
    /// assigned address.
    async fn resolve_address(&self, pod: &PodRef) -> OrchestratorResult<WorkspaceAddress>;

    /// Reports the current phase, or [`PodPhase::NotFound`] when absent.
    async fn pod_status(&self, pod: &PodRef) -> OrchestratorResult<PodPhase>;
}

/// Errors returned by orchestrator adapters.
#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// The compute resource does not exist.
    #[error("workspace {0} not found")]
    NotFound(String),

    /// The compute resource exists but has no network address yet.
    #[error("workspace {0} has no address assigned yet")]
    NotReady(String),

    /// The orchestrator could not be reached.
    #[error("orchestrator unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),

    /// The orchestrator rejected or failed the operation.
    #[error("orchestrator error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl OrchestratorError {
    /// Wraps a connectivity failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }

    /// Wraps an orchestrator-side failure.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
