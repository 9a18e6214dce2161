//! Application services for the interaction hub.

mod connection;
mod hub;
mod publisher;
mod service;

pub use connection::{ConnectionEnd, ConnectionSettings, serve_connection};
pub use hub::{BroadcastHub, ConnectionId};
pub use publisher::{InteractionPublisher, ProducerMessage};
pub use service::{InteractionService, InteractionServiceError, InteractionServiceResult};
