//! Task board and execution coordination.
//!
//! Tasks live on a per-project board whose columns follow a fixed
//! transition table. Executing a task opens a session under the
//! one-active-session-per-task guard, moves the task to `in_progress`, and
//! dispatches a run to the project's workspace agent. Session reports from
//! the agent settle the task into review or back to `todo`.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Board, access, and execution services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
pub(crate) mod tests;
