//! Application services for the task board and task execution.

mod access;
mod board;
mod coordinator;
mod error;
mod prompt;

pub use access::{TaskAccess, TaskAuthorizer};
pub use board::{CreateTaskRequest, TaskBoardService};
pub use coordinator::{ExecutionPorts, ExecutionStarted, TaskCoordinator};
pub use error::{TaskServiceError, TaskServiceResult};
pub use prompt::render_prompt;
