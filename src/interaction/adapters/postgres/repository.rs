//! `PostgreSQL` repository implementation for interaction history.

use super::{
    models::{InteractionRow, NewInteractionRow},
    schema::interactions,
};
use crate::interaction::{
    domain::{Interaction, InteractionId, MessageType, PersistedInteractionData},
    ports::{InteractionRepository, InteractionRepositoryError, InteractionRepositoryResult},
};
use crate::postgres::{BackendFailure, PgPool, run_blocking};
use crate::session::domain::SessionId;
use crate::task::domain::TaskId;
use crate::workspace::domain::UserId;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde_json::Value;

/// `PostgreSQL`-backed interaction repository.
#[derive(Debug, Clone)]
pub struct PostgresInteractionRepository {
    pool: PgPool,
}

impl PostgresInteractionRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl BackendFailure for InteractionRepositoryError {
    fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl InteractionRepository for PostgresInteractionRepository {
    async fn append(&self, interaction: &Interaction) -> InteractionRepositoryResult<()> {
        let interaction_id = interaction.id();
        let row = to_row(interaction);
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(interactions::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        InteractionRepositoryError::DuplicateInteraction(interaction_id)
                    }
                    _ => InteractionRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn list_for_task(&self, task_id: TaskId) -> InteractionRepositoryResult<Vec<Interaction>> {
        run_blocking(&self.pool, move |connection| {
            let rows = interactions::table
                .filter(interactions::task_id.eq(task_id.into_inner()))
                .order((interactions::created_at.asc(), interactions::seq.asc()))
                .select(InteractionRow::as_select())
                .load::<InteractionRow>(connection)
                .map_err(InteractionRepositoryError::persistence)?;
            rows.into_iter().map(row_to_interaction).collect()
        })
        .await
    }

    async fn list_for_session(
        &self,
        session_id: SessionId,
    ) -> InteractionRepositoryResult<Vec<Interaction>> {
        run_blocking(&self.pool, move |connection| {
            let rows = interactions::table
                .filter(interactions::session_id.eq(session_id.into_inner()))
                .order((interactions::created_at.asc(), interactions::seq.asc()))
                .select(InteractionRow::as_select())
                .load::<InteractionRow>(connection)
                .map_err(InteractionRepositoryError::persistence)?;
            rows.into_iter().map(row_to_interaction).collect()
        })
        .await
    }

    async fn delete_for_task(&self, task_id: TaskId) -> InteractionRepositoryResult<usize> {
        run_blocking(&self.pool, move |connection| {
            let history = interactions::table.filter(interactions::task_id.eq(task_id.into_inner()));
            diesel::delete(history)
                .execute(connection)
                .map_err(InteractionRepositoryError::persistence)
        })
        .await
    }
}

fn to_row(interaction: &Interaction) -> NewInteractionRow {
    NewInteractionRow {
        id: interaction.id().into_inner(),
        task_id: interaction.task_id().into_inner(),
        session_id: interaction.session_id().map(SessionId::into_inner),
        user_id: interaction.user_id().into_inner(),
        message_type: interaction.message_type().as_str().to_owned(),
        content: interaction.content().to_owned(),
        metadata: Value::Object(interaction.metadata().clone()),
        created_at: interaction.created_at(),
    }
}

fn row_to_interaction(row: InteractionRow) -> InteractionRepositoryResult<Interaction> {
    let InteractionRow {
        id,
        task_id,
        session_id,
        user_id,
        message_type: persisted_type,
        content,
        metadata: persisted_metadata,
        created_at,
    } = row;

    let message_type = persisted_type
        .parse::<MessageType>()
        .map_err(InteractionRepositoryError::persistence)?;
    let metadata = match persisted_metadata {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    Ok(Interaction::from_persisted(PersistedInteractionData {
        id: InteractionId::from_uuid(id),
        task_id: TaskId::from_uuid(task_id),
        session_id: session_id.map(SessionId::from_uuid),
        user_id: UserId::from_uuid(user_id),
        message_type,
        content,
        metadata,
        created_at,
    }))
}
