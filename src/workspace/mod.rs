//! Workspace lifecycle management.
//!
//! A project owns exactly one compute workspace: a pod-like runtime unit and
//! a persistent volume, both named deterministically from the project
//! identifier. This module provisions, tears down, resolves, and observes
//! those workspaces through the [`ports::WorkspaceOrchestrator`] port, and
//! persists project records through [`ports::ProjectRepository`].
//!
//! Provisioning is partial-success: a project record always exists once
//! creation is requested, and a provisioning failure is reported alongside
//! the persisted project rather than aborting the operation.
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
