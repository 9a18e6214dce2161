//! Session aggregate and its status machine.

use super::{ParseSessionStatusError, SessionDomainError, SessionId};
use crate::task::domain::TaskId;
use crate::workspace::domain::ProjectId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created; the run request has not been acknowledged yet.
    Pending,
    /// The agent acknowledged the run.
    Running,
    /// The agent finished.
    Completed,
    /// Dispatch or the agent failed.
    Failed,
    /// Stopped by a user.
    Cancelled,
}

impl SessionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether the status is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns whether the session still counts as active for its task.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Returns whether moving to `target` is permitted.
    ///
    /// `pending` may fail directly when dispatch never reached the agent.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Running | Self::Failed | Self::Cancelled)
                | (Self::Running, Self::Completed | Self::Failed | Self::Cancelled)
        )
    }
}

impl TryFrom<&str> for SessionStatus {
    type Error = ParseSessionStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseSessionStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One execution attempt of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    task_id: TaskId,
    project_id: ProjectId,
    status: SessionStatus,
    prompt: String,
    output: String,
    error: Option<String>,
    remote_session_id: Option<String>,
    last_event_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    duration_ms: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedSessionData {
    /// Session identifier.
    pub id: SessionId,
    /// Task the session executes.
    pub task_id: TaskId,
    /// Project owning the task.
    pub project_id: ProjectId,
    /// Persisted status.
    pub status: SessionStatus,
    /// Prompt sent to the agent.
    pub prompt: String,
    /// Accumulated output.
    pub output: String,
    /// Failure description.
    pub error: Option<String>,
    /// Identifier assigned by the in-pod agent.
    pub remote_session_id: Option<String>,
    /// Resumable stream checkpoint.
    pub last_event_id: Option<String>,
    /// Time the agent acknowledged the run.
    pub started_at: Option<DateTime<Utc>>,
    /// Time the session reached a terminal status.
    pub completed_at: Option<DateTime<Utc>>,
    /// Run duration in milliseconds.
    pub duration_ms: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a pending session for a task.
    #[must_use]
    pub fn new(
        task_id: TaskId,
        project_id: ProjectId,
        prompt: impl Into<String>,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: SessionId::new(),
            task_id,
            project_id,
            status: SessionStatus::Pending,
            prompt: prompt.into(),
            output: String::new(),
            error: None,
            remote_session_id: None,
            last_event_id: None,
            started_at: None,
            completed_at: None,
            duration_ms: None,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a session from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedSessionData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            project_id: data.project_id,
            status: data.status,
            prompt: data.prompt,
            output: data.output,
            error: data.error,
            remote_session_id: data.remote_session_id,
            last_event_id: data.last_event_id,
            started_at: data.started_at,
            completed_at: data.completed_at,
            duration_ms: data.duration_ms,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the executed task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns the prompt.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Returns the accumulated output.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Returns the failure description.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the identifier assigned by the in-pod agent.
    #[must_use]
    pub fn remote_session_id(&self) -> Option<&str> {
        self.remote_session_id.as_deref()
    }

    /// Returns the resumable stream checkpoint.
    #[must_use]
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Returns when the agent acknowledged the run.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the session reached a terminal status.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Returns the run duration in milliseconds.
    #[must_use]
    pub const fn duration_ms(&self) -> Option<i64> {
        self.duration_ms
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the session still counts as active for its task.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns whether the session belongs to `task_id`.
    #[must_use]
    pub fn belongs_to(&self, task_id: TaskId) -> bool {
        self.task_id == task_id
    }

    /// Records the agent's acknowledgement of the run.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError::InvalidStatusTransition`] unless the
    /// session is pending.
    pub fn mark_running(
        &mut self,
        remote_session_id: Option<String>,
        clock: &impl Clock,
    ) -> Result<(), SessionDomainError> {
        self.transition_to(SessionStatus::Running, clock)?;
        if remote_session_id.is_some() {
            self.remote_session_id = remote_session_id;
        }
        Ok(())
    }

    /// Marks the session failed and records `reason`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError::InvalidStatusTransition`] for terminal
    /// sessions.
    pub fn fail(&mut self, reason: &str, clock: &impl Clock) -> Result<(), SessionDomainError> {
        self.transition_to(SessionStatus::Failed, clock)?;
        self.record_error(reason);
        Ok(())
    }

    /// Marks the session cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError::InvalidStatusTransition`] for terminal
    /// sessions.
    pub fn cancel(&mut self, clock: &impl Clock) -> Result<(), SessionDomainError> {
        self.transition_to(SessionStatus::Cancelled, clock)
    }

    /// Applies a status reported by the in-pod agent.
    ///
    /// Reporting the current status again is a no-op. A completion reported
    /// for a session that never left `pending` passes through `running`
    /// first, since the agent can finish before its acknowledgement is
    /// recorded. Returns whether the status changed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError::InvalidStatusTransition`] when the
    /// report contradicts the status machine.
    pub fn apply_report(
        &mut self,
        status: SessionStatus,
        error: Option<&str>,
        clock: &impl Clock,
    ) -> Result<bool, SessionDomainError> {
        if status == self.status {
            return Ok(false);
        }
        if status == SessionStatus::Completed && self.status == SessionStatus::Pending {
            self.transition_to(SessionStatus::Running, clock)?;
        }
        self.transition_to(status, clock)?;
        if let Some(message) = error.filter(|message| !message.trim().is_empty()) {
            self.record_error(message);
        }
        Ok(true)
    }

    /// Appends agent output.
    pub fn append_output(&mut self, chunk: &str, clock: &impl Clock) {
        self.output.push_str(chunk);
        self.touch(clock);
    }

    /// Stores the resumable stream checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError::EmptyEventId`] for blank identifiers.
    pub fn record_event_id(
        &mut self,
        event_id: &str,
        clock: &impl Clock,
    ) -> Result<(), SessionDomainError> {
        let trimmed = event_id.trim();
        if trimmed.is_empty() {
            return Err(SessionDomainError::EmptyEventId);
        }
        self.last_event_id = Some(trimmed.to_owned());
        self.touch(clock);
        Ok(())
    }

    fn record_error(&mut self, message: &str) {
        self.error = Some(message.to_owned());
        self.output.push_str(&format!("\nError: {message}\n"));
    }

    fn transition_to(
        &mut self,
        target: SessionStatus,
        clock: &impl Clock,
    ) -> Result<(), SessionDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(SessionDomainError::InvalidStatusTransition {
                session_id: self.id,
                from: self.status,
                to: target,
            });
        }
        let now = clock.utc();
        if target == SessionStatus::Running {
            self.started_at = Some(now);
        }
        if target.is_terminal() {
            self.completed_at = Some(now);
            self.duration_ms = self
                .started_at
                .map(|started| (now - started).num_milliseconds());
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
