//! `PostgreSQL` repository implementation for session storage.

use super::{models::SessionRow, schema::sessions};
use crate::postgres::{BackendFailure, PgPool, run_blocking};
use crate::session::{
    domain::{PersistedSessionData, Session, SessionId, SessionStatus},
    ports::{SessionRepository, SessionRepositoryError, SessionRepositoryResult},
};
use crate::task::domain::TaskId;
use crate::workspace::domain::ProjectId;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Partial unique index allowing one pending or running session per task.
const ONE_ACTIVE_PER_TASK: &str = "idx_sessions_one_active_per_task";

const ACTIVE_STATUSES: [&str; 2] = ["pending", "running"];

/// `PostgreSQL`-backed session repository.
#[derive(Debug, Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Outcome of the guarded insert transaction.
enum GuardedInsert {
    Inserted,
    ActiveExists,
}

impl BackendFailure for SessionRepositoryError {
    fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn create_if_no_active(&self, session: &Session) -> SessionRepositoryResult<()> {
        let session_id = session.id();
        let task_id = session.task_id();
        let row = to_row(session);
        run_blocking(&self.pool, move |connection| {
            let outcome = connection
                .transaction::<_, DieselError, _>(|tx| {
                    // Row lock on the task serialises concurrent executions;
                    // the partial unique index backs it up.
                    diesel::sql_query("SELECT id FROM tasks WHERE id = $1 FOR UPDATE")
                        .bind::<diesel::sql_types::Uuid, _>(task_id.into_inner())
                        .execute(tx)?;

                    let active = sessions::table
                        .filter(sessions::task_id.eq(task_id.into_inner()))
                        .filter(sessions::status.eq_any(ACTIVE_STATUSES))
                        .count()
                        .get_result::<i64>(tx)?;
                    if active > 0 {
                        return Ok(GuardedInsert::ActiveExists);
                    }

                    diesel::insert_into(sessions::table)
                        .values(&row)
                        .execute(tx)?;
                    Ok(GuardedInsert::Inserted)
                })
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
                        if info.constraint_name() == Some(ONE_ACTIVE_PER_TASK) =>
                    {
                        SessionRepositoryError::ActiveSessionExists(task_id)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        SessionRepositoryError::DuplicateSession(session_id)
                    }
                    _ => SessionRepositoryError::persistence(err),
                })?;
            match outcome {
                GuardedInsert::Inserted => Ok(()),
                GuardedInsert::ActiveExists => {
                    Err(SessionRepositoryError::ActiveSessionExists(task_id))
                }
            }
        })
        .await
    }

    async fn update(
        &self,
        session: &Session,
        expected: SessionStatus,
    ) -> SessionRepositoryResult<()> {
        let session_id = session.id();
        let row = to_row(session);
        run_blocking(&self.pool, move |connection| {
            let updated = diesel::update(
                sessions::table
                    .filter(sessions::id.eq(row.id))
                    .filter(sessions::status.eq(expected.as_str())),
            )
            .set(&row)
            .execute(connection)
            .map_err(SessionRepositoryError::persistence)?;
            if updated > 0 {
                return Ok(());
            }
            let exists = diesel::select(diesel::dsl::exists(
                sessions::table.filter(sessions::id.eq(row.id)),
            ))
            .get_result::<bool>(connection)
            .map_err(SessionRepositoryError::persistence)?;
            if exists {
                Err(SessionRepositoryError::StatusChanged {
                    session_id,
                    expected,
                })
            } else {
                Err(SessionRepositoryError::NotFound(session_id))
            }
        })
        .await
    }

    async fn find_by_id(&self, id: SessionId) -> SessionRepositoryResult<Option<Session>> {
        run_blocking(&self.pool, move |connection| {
            let row = sessions::table
                .filter(sessions::id.eq(id.into_inner()))
                .select(SessionRow::as_select())
                .first::<SessionRow>(connection)
                .optional()
                .map_err(SessionRepositoryError::persistence)?;
            row.map(row_to_session).transpose()
        })
        .await
    }

    async fn find_active_for_task(
        &self,
        task_id: TaskId,
    ) -> SessionRepositoryResult<Option<Session>> {
        run_blocking(&self.pool, move |connection| {
            let row = sessions::table
                .filter(sessions::task_id.eq(task_id.into_inner()))
                .filter(sessions::status.eq_any(ACTIVE_STATUSES))
                .select(SessionRow::as_select())
                .first::<SessionRow>(connection)
                .optional()
                .map_err(SessionRepositoryError::persistence)?;
            row.map(row_to_session).transpose()
        })
        .await
    }

    async fn list_for_task(&self, task_id: TaskId) -> SessionRepositoryResult<Vec<Session>> {
        run_blocking(&self.pool, move |connection| {
            let rows = sessions::table
                .filter(sessions::task_id.eq(task_id.into_inner()))
                .order(sessions::created_at.desc())
                .select(SessionRow::as_select())
                .load::<SessionRow>(connection)
                .map_err(SessionRepositoryError::persistence)?;
            rows.into_iter().map(row_to_session).collect()
        })
        .await
    }

    async fn list_active(&self) -> SessionRepositoryResult<Vec<Session>> {
        run_blocking(&self.pool, move |connection| {
            let rows = sessions::table
                .filter(sessions::status.eq_any(ACTIVE_STATUSES))
                .order(sessions::created_at.asc())
                .select(SessionRow::as_select())
                .load::<SessionRow>(connection)
                .map_err(SessionRepositoryError::persistence)?;
            rows.into_iter().map(row_to_session).collect()
        })
        .await
    }

    async fn list_active_for_project(
        &self,
        project_id: ProjectId,
    ) -> SessionRepositoryResult<Vec<Session>> {
        run_blocking(&self.pool, move |connection| {
            let rows = sessions::table
                .filter(sessions::project_id.eq(project_id.into_inner()))
                .filter(sessions::status.eq_any(ACTIVE_STATUSES))
                .order(sessions::created_at.asc())
                .select(SessionRow::as_select())
                .load::<SessionRow>(connection)
                .map_err(SessionRepositoryError::persistence)?;
            rows.into_iter().map(row_to_session).collect()
        })
        .await
    }
}

fn to_row(session: &Session) -> SessionRow {
    SessionRow {
        id: session.id().into_inner(),
        task_id: session.task_id().into_inner(),
        project_id: session.project_id().into_inner(),
        status: session.status().as_str().to_owned(),
        prompt: session.prompt().to_owned(),
        output: session.output().to_owned(),
        error: session.error().map(ToOwned::to_owned),
        remote_session_id: session.remote_session_id().map(ToOwned::to_owned),
        last_event_id: session.last_event_id().map(ToOwned::to_owned),
        started_at: session.started_at(),
        completed_at: session.completed_at(),
        duration_ms: session.duration_ms(),
        created_at: session.created_at(),
        updated_at: session.updated_at(),
    }
}

fn row_to_session(row: SessionRow) -> SessionRepositoryResult<Session> {
    let SessionRow {
        id,
        task_id,
        project_id,
        status: persisted_status,
        prompt,
        output,
        error,
        remote_session_id,
        last_event_id,
        started_at,
        completed_at,
        duration_ms,
        created_at,
        updated_at,
    } = row;

    let status = SessionStatus::try_from(persisted_status.as_str())
        .map_err(SessionRepositoryError::persistence)?;

    Ok(Session::from_persisted(PersistedSessionData {
        id: SessionId::from_uuid(id),
        task_id: TaskId::from_uuid(task_id),
        project_id: ProjectId::from_uuid(project_id),
        status,
        prompt,
        output,
        error,
        remote_session_id,
        last_event_id,
        started_at,
        completed_at,
        duration_ms,
        created_at,
        updated_at,
    }))
}
