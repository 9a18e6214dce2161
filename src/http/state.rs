//! Service graph shared by every handler.

use crate::config_vault::{
    ports::{ConfigRepository, CredentialCipher},
    services::ConfigVaultService,
};
use crate::interaction::{
    ports::InteractionRepository,
    services::{BroadcastHub, ConnectionSettings, InteractionService},
};
use crate::session::{ports::SessionRepository, services::SessionLifecycleService};
use crate::sidecar::{
    ports::{AgentRunner, SidecarRelay},
    services::{CancellationRegistry, SidecarProxy},
};
use crate::task::{
    ports::TaskRepository,
    services::{ExecutionPorts, TaskAuthorizer, TaskBoardService, TaskCoordinator},
};
use crate::workspace::{
    ports::{ProjectRepository, WorkspaceOrchestrator},
    services::{WorkspaceService, WorkspaceSettings},
};
use mockable::DefaultClock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Workspace service over trait-object ports.
pub type Projects = WorkspaceService<dyn ProjectRepository, dyn WorkspaceOrchestrator, DefaultClock>;
/// Configuration vault over trait-object ports.
pub type Vault = ConfigVaultService<dyn ConfigRepository, dyn CredentialCipher, DefaultClock>;
/// Session lifecycle over a trait-object repository.
pub type Sessions = SessionLifecycleService<dyn SessionRepository, DefaultClock>;
/// Task board over trait-object repositories.
pub type Board = TaskBoardService<dyn TaskRepository, dyn SessionRepository, DefaultClock>;
/// Execution coordinator over trait-object repositories.
pub type Coordinator = TaskCoordinator<dyn TaskRepository, dyn SessionRepository, DefaultClock>;
/// Interaction service over a trait-object repository.
pub type Interactions = InteractionService<dyn InteractionRepository, DefaultClock>;

/// Adapters the server is assembled from.
pub struct AppPorts {
    /// Project store.
    pub projects: Arc<dyn ProjectRepository>,
    /// Compute orchestrator.
    pub orchestrator: Arc<dyn WorkspaceOrchestrator>,
    /// Task store.
    pub tasks: Arc<dyn TaskRepository>,
    /// Session store.
    pub sessions: Arc<dyn SessionRepository>,
    /// Interaction store.
    pub interactions: Arc<dyn InteractionRepository>,
    /// Configuration store.
    pub configs: Arc<dyn ConfigRepository>,
    /// Credential cipher.
    pub cipher: Arc<dyn CredentialCipher>,
    /// Agent run dispatch.
    pub runner: Arc<dyn AgentRunner>,
    /// File and stream relay.
    pub relay: Arc<dyn SidecarRelay>,
}

/// Tunables of the HTTP boundary.
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Workspace naming and polling.
    pub workspace: WorkspaceSettings,
    /// Interaction socket timing.
    pub connection: ConnectionSettings,
    /// Bearer secret required on internal callback routes.
    pub internal_secret: Option<String>,
    /// Cancelled on shutdown; parents every stream and bridge.
    pub shutdown: CancellationToken,
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub(crate) projects: Arc<Projects>,
    pub(crate) vault: Arc<Vault>,
    pub(crate) sessions: Arc<Sessions>,
    pub(crate) board: Arc<Board>,
    pub(crate) coordinator: Arc<Coordinator>,
    pub(crate) interactions: Arc<Interactions>,
    pub(crate) proxy: SidecarProxy,
    pub(crate) connection: ConnectionSettings,
    pub(crate) internal_secret: Option<Arc<str>>,
    pub(crate) shutdown: CancellationToken,
}

impl AppState {
    /// Wires every service over `ports`.
    #[must_use]
    pub fn assemble(ports: AppPorts, options: AppOptions) -> Self {
        let AppPorts {
            projects,
            orchestrator,
            tasks,
            sessions,
            interactions,
            configs,
            cipher,
            runner,
            relay,
        } = ports;
        let clock = Arc::new(DefaultClock);

        let workspace = Arc::new(WorkspaceService::new(
            projects,
            orchestrator,
            Arc::clone(&clock),
            options.workspace,
        ));
        let vault = Arc::new(ConfigVaultService::new(configs, cipher, Arc::clone(&clock)));
        let lifecycle = Arc::new(SessionLifecycleService::new(sessions, Arc::clone(&clock)));
        let access = Arc::new(TaskAuthorizer::new(
            tasks,
            Arc::clone(&lifecycle),
            workspace.clone(),
        ));
        let hub = Arc::new(InteractionService::new(
            interactions,
            access.clone(),
            BroadcastHub::new(),
            Arc::clone(&clock),
        ));
        let cancellations = CancellationRegistry::with_parent(&options.shutdown);
        let proxy = SidecarProxy::new(
            workspace.clone(),
            access.clone(),
            relay,
            cancellations.clone(),
        );
        let execution = ExecutionPorts {
            credentials: vault.clone(),
            runner,
            publisher: hub.clone(),
            cancellations,
        };

        Self {
            board: Arc::new(TaskBoardService::new(Arc::clone(&access), Arc::clone(&clock))),
            coordinator: Arc::new(TaskCoordinator::new(access, execution, clock)),
            projects: workspace,
            vault,
            sessions: lifecycle,
            interactions: hub,
            proxy,
            connection: options.connection,
            internal_secret: options.internal_secret.map(Arc::from),
            shutdown: options.shutdown,
        }
    }
}
