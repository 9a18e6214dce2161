//! In-memory repository for execution sessions.

use crate::session::{
    domain::{Session, SessionId, SessionStatus},
    ports::{SessionRepository, SessionRepositoryError, SessionRepositoryResult},
};
use crate::task::domain::TaskId;
use crate::workspace::domain::ProjectId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory session repository.
///
/// The active-session check and the insert share one write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    state: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl std::fmt::Display) -> SessionRepositoryError {
    SessionRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create_if_no_active(&self, session: &Session) -> SessionRepositoryResult<()> {
        let mut sessions = self.state.write().map_err(|err| lock_error(&err))?;
        if sessions.contains_key(&session.id()) {
            return Err(SessionRepositoryError::DuplicateSession(session.id()));
        }
        let task_id = session.task_id();
        if sessions
            .values()
            .any(|existing| existing.belongs_to(task_id) && existing.is_active())
        {
            return Err(SessionRepositoryError::ActiveSessionExists(task_id));
        }
        sessions.insert(session.id(), session.clone());
        Ok(())
    }

    async fn update(
        &self,
        session: &Session,
        expected: SessionStatus,
    ) -> SessionRepositoryResult<()> {
        let mut sessions = self.state.write().map_err(|err| lock_error(&err))?;
        let slot = sessions
            .get_mut(&session.id())
            .ok_or(SessionRepositoryError::NotFound(session.id()))?;
        if slot.status() != expected {
            return Err(SessionRepositoryError::StatusChanged {
                session_id: session.id(),
                expected,
            });
        }
        *slot = session.clone();
        Ok(())
    }

    async fn find_by_id(&self, id: SessionId) -> SessionRepositoryResult<Option<Session>> {
        let sessions = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(sessions.get(&id).cloned())
    }

    async fn find_active_for_task(
        &self,
        task_id: TaskId,
    ) -> SessionRepositoryResult<Option<Session>> {
        let sessions = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(sessions
            .values()
            .find(|session| session.belongs_to(task_id) && session.is_active())
            .cloned())
    }

    async fn list_for_task(&self, task_id: TaskId) -> SessionRepositoryResult<Vec<Session>> {
        let sessions = self.state.read().map_err(|err| lock_error(&err))?;
        let mut found: Vec<Session> = sessions
            .values()
            .filter(|session| session.belongs_to(task_id))
            .cloned()
            .collect();
        found.sort_by_key(|session| std::cmp::Reverse(session.created_at()));
        Ok(found)
    }

    async fn list_active(&self) -> SessionRepositoryResult<Vec<Session>> {
        let sessions = self.state.read().map_err(|err| lock_error(&err))?;
        let mut active: Vec<Session> = sessions
            .values()
            .filter(|session| session.is_active())
            .cloned()
            .collect();
        active.sort_by_key(Session::created_at);
        Ok(active)
    }

    async fn list_active_for_project(
        &self,
        project_id: ProjectId,
    ) -> SessionRepositoryResult<Vec<Session>> {
        let mut active = self.list_active().await?;
        active.retain(|session| session.project_id() == project_id);
        Ok(active)
    }
}
