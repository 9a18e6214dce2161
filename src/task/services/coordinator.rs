//! Execution coordinator: starts, stops, and settles agent runs.

use super::access::{TaskAccess, TaskAuthorizer};
use super::error::{TaskServiceError, TaskServiceResult};
use super::prompt::render_prompt;
use crate::config_vault::services::CredentialProvider;
use crate::interaction::{
    domain::{Interaction, MessageType},
    services::{InteractionPublisher, ProducerMessage},
};
use crate::session::{
    domain::{Session, SessionId, SessionStatus},
    ports::SessionRepository,
    services::SessionServiceError,
};
use crate::sidecar::{
    domain::RunRequest,
    ports::AgentRunner,
    services::CancellationRegistry,
};
use crate::task::{
    domain::{ExecutionOutcome, Task, TaskDomainError, TaskId},
    ports::TaskRepository,
};
use crate::workspace::{
    domain::{Project, ProjectId, UserId, WorkspaceAddress},
    ports::OrchestratorError,
};
use mockable::Clock;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Collaborators the coordinator drives during an execution.
#[derive(Clone)]
pub struct ExecutionPorts {
    /// Decrypted agent configuration.
    pub credentials: Arc<dyn CredentialProvider>,
    /// Run control inside the workspace.
    pub runner: Arc<dyn AgentRunner>,
    /// Interaction fan-out for lifecycle notices.
    pub publisher: Arc<dyn InteractionPublisher>,
    /// Tokens ending output relays of stopped sessions.
    pub cancellations: CancellationRegistry,
}

/// Response to a successful execute request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionStarted {
    /// The new session.
    pub session_id: SessionId,
    /// Its initial status, always `pending`.
    pub status: SessionStatus,
}

/// Coordinates task executions across sessions, the config vault, and the
/// workspace agent.
pub struct TaskCoordinator<R, S, C>
where
    R: TaskRepository + ?Sized,
    S: SessionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    access: Arc<TaskAuthorizer<R, S, C>>,
    ports: ExecutionPorts,
    clock: Arc<C>,
}

impl<R, S, C> Clone for TaskCoordinator<R, S, C>
where
    R: TaskRepository + ?Sized,
    S: SessionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            access: Arc::clone(&self.access),
            ports: self.ports.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, S, C> TaskCoordinator<R, S, C>
where
    R: TaskRepository + ?Sized + 'static,
    S: SessionRepository + ?Sized + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a coordinator.
    #[must_use]
    pub const fn new(
        access: Arc<TaskAuthorizer<R, S, C>>,
        ports: ExecutionPorts,
        clock: Arc<C>,
    ) -> Self {
        Self {
            access,
            ports,
            clock,
        }
    }

    /// Starts executing a task.
    ///
    /// Opens a pending session under the one-active-session guard, moves the
    /// task to `in_progress`, and dispatches the run in the background. The
    /// returned session is still `pending`; the agent reports progress
    /// through [`Self::handle_session_report`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] when the task is not in `todo`,
    /// [`TaskServiceError::Session`] when another session is active, and
    /// orchestrator or config errors when the run cannot be prepared. In
    /// the last case the session is failed and the task returns to `todo`.
    pub async fn execute_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskServiceResult<ExecutionStarted> {
        let (project, mut task) = self
            .access
            .authorize_task(project_id, task_id, user_id)
            .await?;
        if !task.status().is_executable() {
            if self.access.sessions().active_for_task(task_id).await?.is_some() {
                return Err(SessionServiceError::SessionAlreadyActive(task_id).into());
            }
            return Err(TaskDomainError::NotExecutable {
                task_id,
                status: task.status(),
            }
            .into());
        }

        let prompt = render_prompt(&task)?;
        let session = self
            .access
            .sessions()
            .open_session(task_id, project.id(), prompt.clone())
            .await?;
        let session_id = session.id();

        if let Err(err) = self.begin(&mut task, session_id).await {
            self.abandon(session_id, "failed to start execution").await;
            return Err(err);
        }

        let (address, request) = match self.prepare_run(&project, session_id, prompt).await {
            Ok(prepared) => prepared,
            Err(err) => {
                tracing::warn!(task_id = %task_id, session_id = %session_id, error = %err, "run preparation failed");
                self.abandon(session_id, preparation_failure(&err)).await;
                return Err(err);
            }
        };

        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.dispatch(task_id, address, request).await;
        });

        tracing::info!(task_id = %task_id, session_id = %session_id, "execution started");
        Ok(ExecutionStarted {
            session_id,
            status: session.status(),
        })
    }

    /// Stops the active execution of a task.
    ///
    /// Asks the agent to stop, cancels the session, ends any output relay
    /// for it, and returns the task to `todo`. A workspace that is gone or
    /// has no address, and an agent that no longer knows the run, do not
    /// prevent the local cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NoActiveSession`] when nothing is running
    /// and [`TaskServiceError::Sidecar`] when the agent rejects the stop.
    pub async fn stop_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskServiceResult<()> {
        let (project, _) = self
            .access
            .authorize_task(project_id, task_id, user_id)
            .await?;
        let session = self
            .access
            .sessions()
            .active_for_task(task_id)
            .await?
            .ok_or(TaskServiceError::NoActiveSession(task_id))?;
        let session_id = session.id();

        match self.access.projects().workspace_address(&project).await {
            Ok(address) => match self.ports.runner.stop_run(&address, session_id).await {
                Ok(()) => {}
                Err(err) if err.is_not_found() => {
                    tracing::info!(session_id = %session_id, "agent no longer knows the run");
                }
                Err(err) => return Err(err.into()),
            },
            Err(OrchestratorError::NotFound(_) | OrchestratorError::NotReady(_)) => {
                tracing::warn!(session_id = %session_id, "workspace unavailable, cancelling locally");
            }
            Err(err) => return Err(err.into()),
        }

        let cancelled = self.access.sessions().cancel(session_id).await?;
        self.settle(&cancelled).await?;
        self.notify(ProducerMessage::system_notification(
            task_id,
            Some(session_id),
            "Execution stopped",
        ))
        .await;
        tracing::info!(task_id = %task_id, session_id = %session_id, "execution stopped");
        Ok(())
    }

    /// Applies a status reported by the workspace agent.
    ///
    /// A report that ends the session moves the task out of `in_progress`,
    /// ends output relays, and broadcasts a notice. Repeated reports of the
    /// current status change nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Session`] for unknown sessions and for
    /// reports that contradict the session status machine.
    pub async fn handle_session_report(
        &self,
        session_id: SessionId,
        status: SessionStatus,
        error: Option<&str>,
    ) -> TaskServiceResult<Session> {
        let (session, changed) = self
            .access
            .sessions()
            .update_status(session_id, status, error)
            .await?;
        if changed && session.status().is_terminal() {
            self.settle(&session).await?;
            let notice = match (session.status(), session.error()) {
                (SessionStatus::Completed, _) => "Execution completed".to_owned(),
                (SessionStatus::Failed, Some(reason)) => format!("Execution failed: {reason}"),
                (SessionStatus::Failed, None) => "Execution failed".to_owned(),
                _ => "Execution cancelled".to_owned(),
            };
            self.notify(ProducerMessage::system_notification(
                session.task_id(),
                Some(session_id),
                notice,
            ))
            .await;
        }
        Ok(session)
    }

    /// Records a message posted by the workspace agent.
    ///
    /// Agent responses are also appended to the session output.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::UnsupportedMessageType`] for user
    /// messages, [`TaskServiceError::SessionNotFound`] for unknown sessions,
    /// and [`TaskServiceError::Interaction`] for invalid content.
    pub async fn report_agent_message(
        &self,
        session_id: SessionId,
        message_type: MessageType,
        content: String,
        metadata: Value,
    ) -> TaskServiceResult<Interaction> {
        let session = self
            .access
            .sessions()
            .get(session_id)
            .await
            .map_err(|err| match err {
                SessionServiceError::NotFound(missing) => {
                    TaskServiceError::SessionNotFound(missing)
                }
                other => TaskServiceError::Session(other),
            })?;
        let message = match message_type {
            MessageType::AgentResponse => {
                ProducerMessage::agent_response(session.task_id(), session_id, content)
            }
            MessageType::SystemNotification => ProducerMessage::system_notification(
                session.task_id(),
                Some(session_id),
                content,
            ),
            MessageType::Error => {
                ProducerMessage::error(session.task_id(), Some(session_id), content)
            }
            MessageType::UserMessage => {
                return Err(TaskServiceError::UnsupportedMessageType(message_type));
            }
        }
        .with_metadata(metadata);

        let interaction = self.ports.publisher.publish(message).await?;
        if message_type == MessageType::AgentResponse {
            self.access
                .sessions()
                .append_output(session_id, interaction.content())
                .await?;
        }
        Ok(interaction)
    }

    async fn begin(&self, task: &mut Task, session_id: SessionId) -> TaskServiceResult<()> {
        task.begin_execution(session_id, &*self.clock)?;
        self.access.tasks().update(task).await?;
        Ok(())
    }

    async fn prepare_run(
        &self,
        project: &Project,
        session_id: SessionId,
        prompt: String,
    ) -> TaskServiceResult<(WorkspaceAddress, RunRequest)> {
        let address = self.access.projects().workspace_address(project).await?;
        let agent = self.ports.credentials.agent_settings(project.id()).await?;
        Ok((address, RunRequest::new(session_id, prompt, agent)))
    }

    async fn dispatch(&self, task_id: TaskId, address: WorkspaceAddress, request: RunRequest) {
        let session_id = request.session_id;
        match self.ports.runner.start_run(&address, &request).await {
            Ok(ack) => {
                if let Err(err) = self
                    .access
                    .sessions()
                    .mark_running(session_id, ack.remote_session_id)
                    .await
                {
                    tracing::error!(session_id = %session_id, error = %err, "failed to record run acknowledgement");
                }
            }
            Err(err) => {
                tracing::warn!(task_id = %task_id, session_id = %session_id, error = %err, "run dispatch failed");
                self.abandon(session_id, err.public_message()).await;
                self.notify(ProducerMessage::error(
                    task_id,
                    Some(session_id),
                    format!("Failed to start execution: {}", err.public_message()),
                ))
                .await;
            }
        }
    }

    /// Fails a session that never reached the agent and settles its task.
    async fn abandon(&self, session_id: SessionId, reason: &str) {
        let failed = match self.access.sessions().mark_failed(session_id, reason).await {
            Ok(session) => session,
            Err(err) => {
                tracing::info!(session_id = %session_id, error = %err, "session already settled");
                return;
            }
        };
        if let Err(err) = self.settle(&failed).await {
            tracing::error!(session_id = %session_id, error = %err, "failed to reset task after abandoned run");
        }
    }

    /// Applies a terminal session to its task and ends its relays.
    async fn settle(&self, session: &Session) -> TaskServiceResult<()> {
        self.ports.cancellations.cancel(session.id());
        let Some(outcome) = outcome_of(session.status()) else {
            return Ok(());
        };
        let mut task = self.access.load_task(session.task_id()).await?;
        if task.current_session_id() != Some(session.id()) {
            return Ok(());
        }
        if task.finish_execution(outcome, &*self.clock) {
            self.access.tasks().update(&task).await?;
            tracing::info!(task_id = %task.id(), status = %task.status(), "task settled after execution");
        }
        Ok(())
    }

    async fn notify(&self, message: ProducerMessage) {
        let task_id = message.task_id;
        if let Err(err) = self.ports.publisher.publish(message).await {
            tracing::warn!(task_id = %task_id, error = %err, "failed to publish lifecycle notice");
        }
    }
}

const fn outcome_of(status: SessionStatus) -> Option<ExecutionOutcome> {
    match status {
        SessionStatus::Completed => Some(ExecutionOutcome::Completed),
        SessionStatus::Failed => Some(ExecutionOutcome::Failed),
        SessionStatus::Cancelled => Some(ExecutionOutcome::Cancelled),
        SessionStatus::Pending | SessionStatus::Running => None,
    }
}

/// Session error text for a run that could not be prepared.
///
/// Kept free of addresses and upstream detail.
const fn preparation_failure(err: &TaskServiceError) -> &'static str {
    match err {
        TaskServiceError::Orchestrator(_) | TaskServiceError::Workspace(_) => {
            "workspace is not reachable"
        }
        TaskServiceError::Config(_) => "agent configuration is unavailable",
        TaskServiceError::Prompt(_) => "prompt could not be rendered",
        TaskServiceError::Domain(_)
        | TaskServiceError::Repository(_)
        | TaskServiceError::Session(_)
        | TaskServiceError::Sidecar(_)
        | TaskServiceError::Interaction(_)
        | TaskServiceError::TaskNotFound(_)
        | TaskServiceError::NoActiveSession(_)
        | TaskServiceError::SessionNotFound(_)
        | TaskServiceError::SessionTaskMismatch { .. }
        | TaskServiceError::UnsupportedMessageType(_) => "failed to prepare execution",
    }
}
