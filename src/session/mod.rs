//! Session lifecycle management.
//!
//! A session is one execution attempt of a task. Sessions move through
//! `pending -> running -> {completed, failed}` or are cancelled while
//! still pending or running; terminal states never change again. At most
//! one session per task may be non-terminal, and that invariant is enforced
//! atomically by the repository rather than by in-process locking, so it
//! holds across replicas.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
