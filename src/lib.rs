//! Vibe control plane: orchestration core for per-project AI coding agents.
//!
//! The crate runs the control plane that lets a user execute an AI coding
//! agent against an isolated compute workspace provisioned per project. It
//! owns the task and session state machines, the workspace lifecycle against
//! a container orchestrator, versioned encrypted agent configuration, the
//! relay into the workspace's in-pod API, and real-time interaction fan-out.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, Docker, HTTP)
//! - **Services**: Orchestration over ports, injected by construction
//!
//! # Modules
//!
//! - [`workspace`]: Project records and compute workspace lifecycle
//! - [`config_vault`]: Versioned, encrypted agent configuration
//! - [`session`]: Execution attempt records and their state machine
//! - [`task`]: Task board state machine and the execution coordinator
//! - [`sidecar`]: Relay of file operations and streams into the workspace
//! - [`interaction`]: Persisted task messages and the broadcast hub
//! - [`http`]: Axum boundary mapping service errors to responses
//! - [`postgres`]: Connection pool and schema shared by storage adapters
//! - [`settings`]: Process configuration from flags and environment
//! - [`telemetry`]: Structured logging initialisation
//! - [`ws`]: Transport-neutral WebSocket frames

pub mod config_vault;
pub mod http;
mod ids;
pub mod interaction;
pub mod postgres;
pub mod session;
pub mod settings;
pub mod sidecar;
pub mod task;
pub mod telemetry;
pub mod workspace;
pub mod ws;
