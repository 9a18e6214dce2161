//! In-memory orchestrator adapter for workspace lifecycle tests.

use crate::workspace::{
    domain::{PodPhase, PodRef, WorkspaceAddress, WorkspaceSpec},
    ports::{OrchestratorError, OrchestratorResult, WorkspaceOrchestrator},
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Address handed out when pods are configured to become ready on creation.
const DEFAULT_POD_ADDRESS: &str = "10.42.0.10";

/// In-memory orchestrator adapter.
///
/// Models pod and volume lifecycles without touching a real container
/// runtime. Failures and address assignment can be injected so callers can
/// exercise partial-success and not-ready paths deterministically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrchestrator {
    state: Arc<RwLock<InMemoryOrchestratorState>>,
}

#[derive(Debug, Default)]
struct InMemoryOrchestratorState {
    pods: HashMap<String, PodRecord>,
    volumes: HashSet<String>,
    ready_on_provision: bool,
    provision_failure: Option<String>,
    teardown_failure: Option<String>,
    unavailable: bool,
}

#[derive(Debug, Clone)]
struct PodRecord {
    phase: PodPhase,
    address: Option<String>,
}

fn lock_error(err: &impl std::fmt::Display) -> OrchestratorError {
    OrchestratorError::runtime(std::io::Error::other(err.to_string()))
}

fn unavailable_error() -> OrchestratorError {
    OrchestratorError::unavailable(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "orchestrator connection refused",
    ))
}

fn key(pod: &PodRef) -> String {
    pod.to_string()
}

impl InMemoryOrchestrator {
    /// Creates an orchestrator whose pods stay pending without an address.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an orchestrator whose pods run with an address immediately.
    #[must_use]
    pub fn with_ready_pods() -> Self {
        let orchestrator = Self::default();
        if let Ok(mut state) = orchestrator.state.write() {
            state.ready_on_provision = true;
        }
        orchestrator
    }

    /// Makes every subsequent provisioning attempt fail with `reason`.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn fail_provisioning(&self, reason: impl Into<String>) -> OrchestratorResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.provision_failure = Some(reason.into());
        Ok(())
    }

    /// Makes every subsequent teardown attempt fail with `reason`.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn fail_teardown(&self, reason: impl Into<String>) -> OrchestratorResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.teardown_failure = Some(reason.into());
        Ok(())
    }

    /// Toggles whether the orchestrator behaves as unreachable.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn set_unavailable(&self, unavailable: bool) -> OrchestratorResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.unavailable = unavailable;
        Ok(())
    }

    /// Assigns a network address and marks the pod running.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotFound`] for unknown pods.
    pub fn assign_address(&self, pod: &PodRef, address: impl Into<String>) -> OrchestratorResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        let record = state
            .pods
            .get_mut(&key(pod))
            .ok_or_else(|| OrchestratorError::NotFound(pod.to_string()))?;
        record.address = Some(address.into());
        record.phase = PodPhase::Running;
        Ok(())
    }

    /// Overrides the phase reported for a pod.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotFound`] for unknown pods.
    pub fn set_phase(&self, pod: &PodRef, phase: PodPhase) -> OrchestratorResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        let record = state
            .pods
            .get_mut(&key(pod))
            .ok_or_else(|| OrchestratorError::NotFound(pod.to_string()))?;
        record.phase = phase;
        Ok(())
    }

    /// Removes a pod out-of-band, as if deleted by an operator.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn evict(&self, pod: &PodRef) -> OrchestratorResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        state.pods.remove(&key(pod));
        Ok(())
    }

    /// Returns whether a pod currently exists.
    #[must_use]
    pub fn has_pod(&self, pod: &PodRef) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.pods.contains_key(&key(pod)))
    }

    /// Returns whether a volume currently exists.
    #[must_use]
    pub fn has_volume(&self, volume_name: &str) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.volumes.contains(volume_name))
    }
}

#[async_trait]
impl WorkspaceOrchestrator for InMemoryOrchestrator {
    async fn provision(&self, spec: &WorkspaceSpec) -> OrchestratorResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        if state.unavailable {
            return Err(unavailable_error());
        }

        state.volumes.insert(spec.volume_name().to_owned());
        if let Some(reason) = state.provision_failure.clone() {
            state.volumes.remove(spec.volume_name());
            return Err(OrchestratorError::runtime(std::io::Error::other(reason)));
        }

        let record = if state.ready_on_provision {
            PodRecord {
                phase: PodPhase::Running,
                address: Some(DEFAULT_POD_ADDRESS.to_owned()),
            }
        } else {
            PodRecord {
                phase: PodPhase::Pending,
                address: None,
            }
        };
        state.pods.insert(key(spec.pod()), record);
        Ok(())
    }

    async fn teardown(&self, pod: &PodRef, volume_name: &str) -> OrchestratorResult<()> {
        let mut state = self.state.write().map_err(|err| lock_error(&err))?;
        if state.unavailable {
            return Err(unavailable_error());
        }
        if let Some(reason) = state.teardown_failure.clone() {
            return Err(OrchestratorError::runtime(std::io::Error::other(reason)));
        }
        state.pods.remove(&key(pod));
        state.volumes.remove(volume_name);
        Ok(())
    }

    async fn resolve_address(&self, pod: &PodRef) -> OrchestratorResult<WorkspaceAddress> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        if state.unavailable {
            return Err(unavailable_error());
        }
        let record = state
            .pods
            .get(&key(pod))
            .ok_or_else(|| OrchestratorError::NotFound(pod.to_string()))?;
        record
            .address
            .as_ref()
            .map(WorkspaceAddress::new)
            .ok_or_else(|| OrchestratorError::NotReady(pod.to_string()))
    }

    async fn pod_status(&self, pod: &PodRef) -> OrchestratorResult<PodPhase> {
        let state = self.state.read().map_err(|err| lock_error(&err))?;
        if state.unavailable {
            return Err(unavailable_error());
        }
        Ok(state
            .pods
            .get(&key(pod))
            .map_or(PodPhase::NotFound, |record| record.phase))
    }
}
