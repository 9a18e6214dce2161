//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The title exceeds the persisted column width.
    #[error("task title is {0} characters, maximum is {max}", max = super::task::MAX_TITLE_CHARS)]
    TitleTooLong(usize),

    /// Board positions are non-negative.
    #[error("task position must not be negative, got {0}")]
    NegativePosition(i32),

    /// The status transition is not in the allowed table.
    #[error("invalid task status transition for {task_id}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The task's status does not allow starting an execution.
    #[error("task {task_id} cannot be executed from status {status}")]
    NotExecutable {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        status: TaskStatus,
    },
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task priorities.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParseTaskPriorityError(pub String);
