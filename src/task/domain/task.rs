//! Task aggregate root and board column state machine.

use super::{ParseTaskPriorityError, ParseTaskStatusError, TaskDomainError, TaskId};
use crate::session::domain::SessionId;
use crate::workspace::domain::{ProjectId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of characters accepted for a task title.
pub const MAX_TITLE_CHARS: usize = 500;

/// Board column of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be worked on; the only executable status.
    Todo,
    /// An agent execution is in flight or was just stopped.
    InProgress,
    /// Awaiting automated review of the agent's work.
    AiReview,
    /// Awaiting human review.
    HumanReview,
    /// Finished.
    Done,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::AiReview => "ai_review",
            Self::HumanReview => "human_review",
            Self::Done => "done",
        }
    }

    /// Returns whether moving to `target` is in the allowed table.
    ///
    /// # Examples
    ///
    /// ```
    /// use vibe_control::task::domain::TaskStatus;
    ///
    /// assert!(TaskStatus::Todo.can_transition_to(TaskStatus::InProgress));
    /// assert!(!TaskStatus::Todo.can_transition_to(TaskStatus::Done));
    /// ```
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Todo, Self::InProgress)
                | (Self::InProgress, Self::AiReview | Self::HumanReview | Self::Todo)
                | (Self::AiReview, Self::HumanReview | Self::InProgress | Self::Done)
                | (Self::HumanReview, Self::Done | Self::InProgress)
                | (Self::Done, Self::Todo)
        )
    }

    /// Returns whether an execution may start from this status.
    #[must_use]
    pub const fn is_executable(self) -> bool {
        matches!(self, Self::Todo)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "ai_review" => Ok(Self::AiReview),
            "human_review" => Ok(Self::HumanReview),
            "done" => Ok(Self::Done),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl TaskPriority {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl TryFrom<&str> for TaskPriority {
    type Error = ParseTaskPriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParseTaskPriorityError(value.to_owned())),
        }
    }
}

/// How an execution attempt ended, as seen by the task board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The agent finished its work.
    Completed,
    /// The agent or dispatch failed.
    Failed,
    /// The execution was stopped.
    Cancelled,
}

impl ExecutionOutcome {
    /// Returns the column a task in progress moves to after this outcome.
    #[must_use]
    pub const fn next_status(self) -> TaskStatus {
        match self {
            Self::Completed => TaskStatus::AiReview,
            Self::Failed | Self::Cancelled => TaskStatus::Todo,
        }
    }
}

/// Validated input for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    project_id: ProjectId,
    created_by: UserId,
    title: String,
    description: Option<String>,
    priority: TaskPriority,
    position: i32,
}

impl NewTask {
    /// Validates the title and captures the owning project.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::TitleTooLong`].
    pub fn new(
        project_id: ProjectId,
        created_by: UserId,
        title: impl Into<String>,
    ) -> Result<Self, TaskDomainError> {
        let raw = title.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        let length = trimmed.chars().count();
        if length > MAX_TITLE_CHARS {
            return Err(TaskDomainError::TitleTooLong(length));
        }
        Ok(Self {
            project_id,
            created_by,
            title: trimmed.to_owned(),
            description: None,
            priority: TaskPriority::default(),
            position: 0,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the board position.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NegativePosition`] for negative values.
    pub fn with_position(mut self, position: i32) -> Result<Self, TaskDomainError> {
        if position < 0 {
            return Err(TaskDomainError::NegativePosition(position));
        }
        self.position = position;
        Ok(self)
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project_id: ProjectId,
    title: String,
    description: Option<String>,
    status: TaskStatus,
    position: i32,
    priority: TaskPriority,
    current_session_id: Option<SessionId>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Board column.
    pub status: TaskStatus,
    /// Ordering hint within the column.
    pub position: i32,
    /// Priority.
    pub priority: TaskPriority,
    /// Most recent session.
    pub current_session_id: Option<SessionId>,
    /// Creator.
    pub created_by: UserId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a task in the `todo` column.
    #[must_use]
    pub fn new(input: NewTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            project_id: input.project_id,
            title: input.title,
            description: input.description,
            status: TaskStatus::Todo,
            position: input.position,
            priority: input.priority,
            current_session_id: None,
            created_by: input.created_by,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            status: data.status,
            position: data.position,
            priority: data.priority,
            current_session_id: data.current_session_id,
            created_by: data.created_by,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the board column.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the ordering hint within the column.
    #[must_use]
    pub const fn position(&self) -> i32 {
        self.position
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Returns the most recent session, if any.
    #[must_use]
    pub const fn current_session_id(&self) -> Option<SessionId> {
        self.current_session_id
    }

    /// Returns the creator.
    #[must_use]
    pub const fn created_by(&self) -> UserId {
        self.created_by
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

    /// Moves the task to another column and position.
    ///
    /// Repositioning within the current column is always allowed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NegativePosition`] or
    /// [`TaskDomainError::InvalidStatusTransition`].
    pub fn move_to(
        &mut self,
        status: TaskStatus,
        position: i32,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if position < 0 {
            return Err(TaskDomainError::NegativePosition(position));
        }
        if status != self.status {
            self.transition_to(status)?;
        }
        self.position = position;
        self.touch(clock);
        Ok(())
    }

    /// Starts an execution attempt.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::NotExecutable`] unless the task is in
    /// `todo`.
    pub fn begin_execution(
        &mut self,
        session_id: SessionId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.is_executable() {
            return Err(TaskDomainError::NotExecutable {
                task_id: self.id,
                status: self.status,
            });
        }
        self.transition_to(TaskStatus::InProgress)?;
        self.current_session_id = Some(session_id);
        self.touch(clock);
        Ok(())
    }

    /// Applies the outcome of an execution attempt.
    ///
    /// Only a task still in progress moves; a task that was already moved
    /// elsewhere keeps its column. Returns whether the status changed.
    pub fn finish_execution(&mut self, outcome: ExecutionOutcome, clock: &impl Clock) -> bool {
        if self.status != TaskStatus::InProgress {
            return false;
        }
        self.status = outcome.next_status();
        self.touch(clock);
        true
    }

    fn transition_to(&mut self, target: TaskStatus) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStatusTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
