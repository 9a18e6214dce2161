//! Per-task registry of live connections.

use crate::interaction::domain::ServerFrame;
use crate::task::domain::TaskId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

/// Identifies one open connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new random connection identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type Registry = HashMap<TaskId, HashMap<ConnectionId, mpsc::Sender<ServerFrame>>>;

/// Maps each task to the outboxes of its open connections.
///
/// Mutation takes the write lock; broadcast takes the read lock only long
/// enough to snapshot the recipients, then delivers without blocking.
#[derive(Debug, Clone, Default)]
pub struct BroadcastHub {
    connections: Arc<RwLock<Registry>>,
}

impl BroadcastHub {
    /// Creates an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to a task.
    ///
    /// Registering the same connection again replaces its outbox.
    pub fn register(
        &self,
        task_id: TaskId,
        connection_id: ConnectionId,
        outbox: mpsc::Sender<ServerFrame>,
    ) {
        let mut registry = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        registry
            .entry(task_id)
            .or_default()
            .insert(connection_id, outbox);
    }

    /// Removes a connection from a task.
    ///
    /// Removing an unknown connection is a no-op.
    pub fn unregister(&self, task_id: TaskId, connection_id: ConnectionId) {
        let mut registry = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(peers) = registry.get_mut(&task_id) else {
            return;
        };
        peers.remove(&connection_id);
        if peers.is_empty() {
            registry.remove(&task_id);
        }
    }

    /// Returns how many connections are open for a task.
    #[must_use]
    pub fn connection_count(&self, task_id: TaskId) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&task_id)
            .map_or(0, HashMap::len)
    }

    /// Offers `frame` to every connection of a task.
    ///
    /// Delivery never waits on a slow peer. A connection whose outbox is
    /// full or closed is evicted: its outbox is dropped from the registry,
    /// so its loop drains what is already queued and then ends. Returns the
    /// number of connections the frame was queued for.
    #[must_use]
    pub fn broadcast(&self, task_id: TaskId, frame: &ServerFrame) -> usize {
        let recipients: Vec<(ConnectionId, mpsc::Sender<ServerFrame>)> = {
            let registry = self
                .connections
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            registry
                .get(&task_id)
                .map(|peers| {
                    peers
                        .iter()
                        .map(|(id, outbox)| (*id, outbox.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut delivered = 0;
        let mut stale = Vec::new();
        for (connection_id, outbox) in recipients {
            match outbox.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        task_id = %task_id,
                        connection_id = %connection_id,
                        "interaction outbox full, evicting connection"
                    );
                    stale.push((connection_id, outbox));
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(
                        task_id = %task_id,
                        connection_id = %connection_id,
                        "interaction outbox closed"
                    );
                    stale.push((connection_id, outbox));
                }
            }
        }
        if !stale.is_empty() {
            self.evict(task_id, &stale);
        }
        delivered
    }

    /// Drops the given outboxes unless they were re-registered meanwhile.
    fn evict(&self, task_id: TaskId, stale: &[(ConnectionId, mpsc::Sender<ServerFrame>)]) {
        let mut registry = self
            .connections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(peers) = registry.get_mut(&task_id) else {
            return;
        };
        for (connection_id, outbox) in stale {
            if peers
                .get(connection_id)
                .is_some_and(|current| current.same_channel(outbox))
            {
                peers.remove(connection_id);
            }
        }
        if peers.is_empty() {
            registry.remove(&task_id);
        }
    }
}
