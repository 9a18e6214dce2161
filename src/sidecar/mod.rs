//! Relay into the per-project workspace's in-pod API.
//!
//! The control plane never serves files or runs the agent itself. It
//! resolves the project's workspace address and forwards a fixed set of
//! file operations, the file-change WebSocket, and the session output
//! stream to well-known in-pod ports, relaying upstream status and bodies
//! unchanged. Agent runs are started and stopped through the same client.
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
