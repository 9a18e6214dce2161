//! Docker-backed orchestrator adapter.
//!
//! Maps the workspace model onto Docker primitives: a project's compute
//! resource is a container named after the pod, its persistent volume is a
//! named Docker volume mounted at `/workspace`, and the namespace is a
//! user-defined bridge network. The workspace address is the container's IP
//! on that network.

use crate::workspace::{
    domain::{PodPhase, PodRef, WorkspaceAddress, WorkspaceSpec},
    ports::{OrchestratorError, OrchestratorResult, WorkspaceOrchestrator},
};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerInspectResponse, ContainerStateStatusEnum, HostConfig};
use bollard::network::{CreateNetworkOptions, InspectNetworkOptions};
use bollard::volume::{CreateVolumeOptions, RemoveVolumeOptions};
use futures::TryStreamExt;
use std::collections::HashMap;
use std::time::Duration;

/// Mount point of the workspace volume inside the container.
const WORKSPACE_MOUNT: &str = "/workspace";

/// Label key identifying resources owned by the control plane.
const PROJECT_LABEL: &str = "vibe.project-id";

/// Settings for [`DockerOrchestrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerWorkspaceSettings {
    /// Image bundling the agent server and its sidecars.
    pub image: String,
    /// Requested volume size, recorded as a volume label.
    pub volume_size: String,
    /// Port of the in-pod agent API.
    pub agent_port: u16,
    /// Port of the in-pod file browser.
    pub files_port: u16,
    /// Bound applied to every Docker API call.
    pub timeout: Duration,
}

/// Orchestrator adapter over the local Docker engine.
#[derive(Debug, Clone)]
pub struct DockerOrchestrator {
    docker: Docker,
    settings: DockerWorkspaceSettings,
}

impl DockerOrchestrator {
    /// Connects to the local Docker engine using environment defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Unavailable`] when no Docker endpoint can
    /// be configured.
    pub fn connect(settings: DockerWorkspaceSettings) -> OrchestratorResult<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(OrchestratorError::unavailable)?
            .with_timeout(settings.timeout);
        Ok(Self { docker, settings })
    }

    async fn ensure_network(&self, namespace: &str) -> OrchestratorResult<()> {
        match self
            .docker
            .inspect_network(namespace, None::<InspectNetworkOptions<String>>)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_not_found(&err) => {
                let options = CreateNetworkOptions {
                    name: namespace.to_owned(),
                    driver: "bridge".to_owned(),
                    ..Default::default()
                };
                self.docker
                    .create_network(options)
                    .await
                    .map(|_| ())
                    .map_err(|create_err| map_error(create_err, namespace))
            }
            Err(err) => Err(map_error(err, namespace)),
        }
    }

    async fn create_volume(&self, spec: &WorkspaceSpec) -> OrchestratorResult<()> {
        let labels = HashMap::from([
            (PROJECT_LABEL.to_owned(), spec.project_id().to_string()),
            ("vibe.volume-size".to_owned(), self.settings.volume_size.clone()),
        ]);
        let options = CreateVolumeOptions {
            name: spec.volume_name().to_owned(),
            driver: "local".to_owned(),
            labels,
            ..Default::default()
        };
        self.docker
            .create_volume(options)
            .await
            .map(|_| ())
            .map_err(|err| map_error(err, spec.volume_name()))
    }

    /// Pulls the workspace image unless the engine already has it.
    async fn ensure_image(&self) -> OrchestratorResult<()> {
        let image = self.settings.image.as_str();
        match self.docker.inspect_image(image).await {
            Ok(_) => return Ok(()),
            Err(err) if is_not_found(&err) => {}
            Err(err) => return Err(map_image_error(err)),
        }
        tracing::info!(image, "pulling workspace image");
        let options = CreateImageOptions {
            from_image: image.to_owned(),
            ..Default::default()
        };
        self.docker
            .create_image(Some(options), None, None)
            .try_for_each(|_| async { Ok(()) })
            .await
            .map_err(map_image_error)
    }

    async fn create_and_start_container(&self, spec: &WorkspaceSpec) -> OrchestratorResult<()> {
        let pod = spec.pod();
        let config = Config {
            image: Some(self.settings.image.clone()),
            env: Some(vec![
                format!("WORKSPACE_DIR={WORKSPACE_MOUNT}"),
                format!("PROJECT_ID={}", spec.project_id()),
                format!("AGENT_PORT={}", self.settings.agent_port),
                format!("FILES_PORT={}", self.settings.files_port),
            ]),
            labels: Some(HashMap::from([(
                PROJECT_LABEL.to_owned(),
                spec.project_id().to_string(),
            )])),
            host_config: Some(HostConfig {
                binds: Some(vec![format!("{}:{WORKSPACE_MOUNT}", spec.volume_name())]),
                network_mode: Some(pod.namespace().to_owned()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: pod.name().to_owned(),
            platform: None,
        };

        self.ensure_image().await?;
        self.docker
            .create_container(Some(options), config)
            .await
            .map_err(map_image_error)?;
        self.docker
            .start_container(pod.name(), None::<StartContainerOptions<String>>)
            .await
            .map_err(|err| map_error(err, pod.name()))
    }

    async fn remove_container(&self, name: &str) -> OrchestratorResult<()> {
        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.docker.remove_container(name, Some(options)).await {
            Ok(()) => Ok(()),
            Err(err) if is_not_found(&err) => Ok(()),
            Err(err) => Err(map_error(err, name)),
        }
    }

    async fn remove_volume(&self, name: &str) -> OrchestratorResult<()> {
        match self
            .docker
            .remove_volume(name, Some(RemoveVolumeOptions { force: true }))
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if is_not_found(&err) => Ok(()),
            Err(err) => Err(map_error(err, name)),
        }
    }

    async fn inspect(&self, pod: &PodRef) -> OrchestratorResult<Option<ContainerInspectResponse>> {
        match self
            .docker
            .inspect_container(pod.name(), None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => Ok(Some(response)),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(map_error(err, pod.name())),
        }
    }
}

#[async_trait]
impl WorkspaceOrchestrator for DockerOrchestrator {
    async fn provision(&self, spec: &WorkspaceSpec) -> OrchestratorResult<()> {
        self.ensure_network(spec.pod().namespace()).await?;
        self.create_volume(spec).await?;

        if let Err(err) = self.create_and_start_container(spec).await {
            tracing::warn!(
                pod = %spec.pod(),
                error = %err,
                "workspace container creation failed, removing volume"
            );
            if let Err(cleanup_err) = self.remove_container(spec.pod().name()).await {
                tracing::error!(pod = %spec.pod(), error = %cleanup_err, "container cleanup failed");
            }
            if let Err(cleanup_err) = self.remove_volume(spec.volume_name()).await {
                tracing::error!(
                    volume = spec.volume_name(),
                    error = %cleanup_err,
                    "volume cleanup failed"
                );
            }
            return Err(err);
        }

        tracing::info!(pod = %spec.pod(), volume = spec.volume_name(), "workspace provisioned");
        Ok(())
    }

    async fn teardown(&self, pod: &PodRef, volume_name: &str) -> OrchestratorResult<()> {
        self.remove_container(pod.name()).await?;
        self.remove_volume(volume_name).await?;
        tracing::info!(pod = %pod, volume = volume_name, "workspace torn down");
        Ok(())
    }

    async fn resolve_address(&self, pod: &PodRef) -> OrchestratorResult<WorkspaceAddress> {
        let response = self
            .inspect(pod)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(pod.to_string()))?;

        response
            .network_settings
            .and_then(|settings| settings.networks)
            .and_then(|mut networks| networks.remove(pod.namespace()))
            .and_then(|endpoint| endpoint.ip_address)
            .filter(|ip| !ip.is_empty())
            .map(WorkspaceAddress::new)
            .ok_or_else(|| OrchestratorError::NotReady(pod.to_string()))
    }

    async fn pod_status(&self, pod: &PodRef) -> OrchestratorResult<PodPhase> {
        let Some(response) = self.inspect(pod).await? else {
            return Ok(PodPhase::NotFound);
        };
        let Some(state) = response.state else {
            return Ok(PodPhase::Unknown);
        };
        Ok(phase_from_state(state.status, state.exit_code))
    }
}

/// Maps Docker container state onto pod phases.
fn phase_from_state(status: Option<ContainerStateStatusEnum>, exit_code: Option<i64>) -> PodPhase {
    match status {
        Some(ContainerStateStatusEnum::CREATED | ContainerStateStatusEnum::RESTARTING) => {
            PodPhase::Pending
        }
        Some(ContainerStateStatusEnum::RUNNING | ContainerStateStatusEnum::PAUSED) => {
            PodPhase::Running
        }
        Some(ContainerStateStatusEnum::EXITED) if exit_code == Some(0) => PodPhase::Succeeded,
        Some(
            ContainerStateStatusEnum::EXITED
            | ContainerStateStatusEnum::DEAD
            | ContainerStateStatusEnum::REMOVING,
        ) => PodPhase::Failed,
        Some(ContainerStateStatusEnum::EMPTY) | None => PodPhase::Unknown,
    }
}

fn is_not_found(err: &bollard::errors::Error) -> bool {
    matches!(
        err,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

fn map_error(err: bollard::errors::Error, resource: &str) -> OrchestratorError {
    match err {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => OrchestratorError::NotFound(resource.to_owned()),
        bollard::errors::Error::DockerResponseServerError { .. } => {
            OrchestratorError::runtime(err)
        }
        _ => OrchestratorError::unavailable(err),
    }
}

/// Maps failures while preparing or using the image.
///
/// A 404 here means the image is missing, which is a runtime failure of the
/// engine rather than a missing workspace.
fn map_image_error(err: bollard::errors::Error) -> OrchestratorError {
    match err {
        bollard::errors::Error::DockerResponseServerError { .. } => OrchestratorError::runtime(err),
        _ => OrchestratorError::unavailable(err),
    }
}
