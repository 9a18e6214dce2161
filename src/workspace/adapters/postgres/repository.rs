//! `PostgreSQL` repository implementation for project storage.

use super::{models::ProjectRow, schema::projects};
use crate::postgres::{BackendFailure, PgPool, run_blocking};
use crate::workspace::{
    domain::{PersistedProjectData, PodPhase, PodRef, Project, ProjectId, ProjectStatus, UserId},
    ports::{ProjectRepository, ProjectRepositoryError, ProjectRepositoryResult},
};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed project repository.
#[derive(Debug, Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl BackendFailure for ProjectRepositoryError {
    fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn store(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let project_id = project.id();
        let row = to_row(project);
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(projects::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ProjectRepositoryError::DuplicateProject(project_id)
                    }
                    _ => ProjectRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, project: &Project) -> ProjectRepositoryResult<()> {
        let project_id = project.id();
        let row = to_row(project);
        run_blocking(&self.pool, move |connection| {
            let updated = diesel::update(projects::table.filter(projects::id.eq(row.id)))
                .set(&row)
                .execute(connection)
                .map_err(ProjectRepositoryError::persistence)?;
            if updated == 0 {
                return Err(ProjectRepositoryError::NotFound(project_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: ProjectId) -> ProjectRepositoryResult<Option<Project>> {
        run_blocking(&self.pool, move |connection| {
            let row = projects::table
                .filter(projects::id.eq(id.into_inner()))
                .select(ProjectRow::as_select())
                .first::<ProjectRow>(connection)
                .optional()
                .map_err(ProjectRepositoryError::persistence)?;
            row.map(row_to_project).transpose()
        })
        .await
    }

    async fn list_for_owner(&self, owner_id: UserId) -> ProjectRepositoryResult<Vec<Project>> {
        run_blocking(&self.pool, move |connection| {
            let rows = projects::table
                .filter(projects::owner_id.eq(owner_id.into_inner()))
                .order(projects::created_at.desc())
                .select(ProjectRow::as_select())
                .load::<ProjectRow>(connection)
                .map_err(ProjectRepositoryError::persistence)?;
            rows.into_iter().map(row_to_project).collect()
        })
        .await
    }

    async fn delete(&self, id: ProjectId) -> ProjectRepositoryResult<()> {
        run_blocking(&self.pool, move |connection| {
            let deleted = diesel::delete(projects::table.filter(projects::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(ProjectRepositoryError::persistence)?;
            if deleted == 0 {
                return Err(ProjectRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await
    }
}

fn to_row(project: &Project) -> ProjectRow {
    ProjectRow {
        id: project.id().into_inner(),
        owner_id: project.owner_id().into_inner(),
        name: project.name().to_owned(),
        description: project.description().map(ToOwned::to_owned),
        pod_name: project.pod().name().to_owned(),
        pod_namespace: project.pod().namespace().to_owned(),
        volume_name: project.volume_name().to_owned(),
        status: project.status().as_str().to_owned(),
        pod_status: project.pod_status().map(|phase| phase.as_str().to_owned()),
        pod_error: project.pod_error().map(ToOwned::to_owned),
        pod_created_at: project.pod_created_at(),
        created_at: project.created_at(),
        updated_at: project.updated_at(),
    }
}

fn row_to_project(row: ProjectRow) -> ProjectRepositoryResult<Project> {
    let ProjectRow {
        id,
        owner_id,
        name,
        description,
        pod_name,
        pod_namespace,
        volume_name,
        status: persisted_status,
        pod_status: persisted_pod_status,
        pod_error,
        pod_created_at,
        created_at,
        updated_at,
    } = row;

    let status = ProjectStatus::try_from(persisted_status.as_str())
        .map_err(ProjectRepositoryError::persistence)?;
    let pod_status = persisted_pod_status
        .as_deref()
        .map(PodPhase::try_from)
        .transpose()
        .map_err(ProjectRepositoryError::persistence)?;

    Ok(Project::from_persisted(PersistedProjectData {
        id: ProjectId::from_uuid(id),
        owner_id: UserId::from_uuid(owner_id),
        name,
        description,
        pod: PodRef::new(pod_name, pod_namespace),
        volume_name,
        status,
        pod_status,
        pod_error,
        pod_created_at,
        created_at,
        updated_at,
    }))
}
