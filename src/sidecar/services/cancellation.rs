//! Per-session cancellation tokens.

use crate::session::domain::SessionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

/// Tracks one cancellation token per active session.
///
/// Output relays wait on a session's token and end when it fires. The
/// coordinator fires it when the session is stopped or reaches a terminal
/// status. Tokens are children of a root token, so shutting the root down
/// ends every relay.
#[derive(Debug, Clone, Default)]
pub struct CancellationRegistry {
    root: CancellationToken,
    tokens: Arc<Mutex<HashMap<SessionId, CancellationToken>>>,
}

impl CancellationRegistry {
    /// Creates a registry with its own root token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry whose tokens are cancelled along with `root`.
    #[must_use]
    pub fn with_parent(root: &CancellationToken) -> Self {
        Self {
            root: root.child_token(),
            tokens: Arc::default(),
        }
    }

    fn tokens(&self) -> MutexGuard<'_, HashMap<SessionId, CancellationToken>> {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the token for `session_id`, creating it on first use.
    #[must_use]
    pub fn token(&self, session_id: SessionId) -> CancellationToken {
        self.tokens()
            .entry(session_id)
            .or_insert_with(|| self.root.child_token())
            .clone()
    }

    /// Fires and forgets the token for `session_id`.
    ///
    /// Sessions without a registered token are ignored.
    pub fn cancel(&self, session_id: SessionId) {
        let removed = self.tokens().remove(&session_id);
        if let Some(token) = removed {
            token.cancel();
            tracing::debug!(session_id = %session_id, "session streams cancelled");
        }
    }

    /// Returns whether a token is registered for `session_id`.
    #[must_use]
    pub fn is_tracked(&self, session_id: SessionId) -> bool {
        self.tokens().contains_key(&session_id)
    }

    /// Fires every token, including ones created later.
    pub fn shutdown(&self) {
        self.root.cancel();
        self.tokens().clear();
    }
}
