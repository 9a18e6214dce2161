//! Domain model for the task board.
//!
//! Tasks move between board columns under a fixed transition table. Only a
//! task in `todo` may start an execution, and the outcome of an execution
//! decides which column the task lands in afterwards.

mod error;
mod ids;
mod task;

pub use error::{ParseTaskPriorityError, ParseTaskStatusError, TaskDomainError};
pub use ids::TaskId;
pub use task::{
    ExecutionOutcome, MAX_TITLE_CHARS, NewTask, PersistedTaskData, Task, TaskPriority, TaskStatus,
};
