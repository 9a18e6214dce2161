//! Per-task interaction history and live fan-out.
//!
//! Every user, agent, and system message about a task is persisted as an
//! [`domain::Interaction`] and pushed to every WebSocket connection open for
//! that task. A fresh connection first receives the full history as one
//! batch, then live traffic.
//!
//! - Domain types and wire frames in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Hub, connection loop, and producer service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
