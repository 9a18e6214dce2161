//! Project endpoints.

use crate::http::auth::Caller;
use crate::http::error::ApiResult;
use crate::http::extract::{JsonBody, PathParams};
use crate::http::state::AppState;
use crate::workspace::domain::{Project, ProjectId};
use crate::workspace::services::CreateProjectRequest;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct CreateProjectBody {
    name: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProjectCreated {
    project: Project,
    #[serde(skip_serializing_if = "Option::is_none")]
    provisioning_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProjectList {
    projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PodStatusBody {
    pod_status: &'static str,
}

/// `POST /api/projects`
///
/// A workspace that fails to provision still yields 201; the failure is
/// recorded on the project and echoed as `provisioning_error`.
pub(crate) async fn create(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    JsonBody(body): JsonBody<CreateProjectBody>,
) -> ApiResult<(StatusCode, Json<ProjectCreated>)> {
    let mut request = CreateProjectRequest::new(user_id, body.name);
    if let Some(description) = body.description {
        request = request.with_description(description);
    }
    let outcome = state.projects.create_project(request).await?;
    let created = ProjectCreated {
        project: outcome.project,
        provisioning_error: outcome.provisioning_error.map(|err| err.to_string()),
    };
    Ok((StatusCode::CREATED, Json(created)))
}

pub(crate) async fn list(
    State(state): State<AppState>,
    Caller(user_id): Caller,
) -> ApiResult<Json<ProjectList>> {
    let projects = state.projects.list_projects(user_id).await?;
    Ok(Json(ProjectList { projects }))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(project_id): PathParams<ProjectId>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.projects.get_project(project_id, user_id).await?))
}

/// `DELETE /api/projects/{id}`: tears the workspace down, then removes the
/// project and everything it owns.
pub(crate) async fn delete(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(project_id): PathParams<ProjectId>,
) -> ApiResult<StatusCode> {
    state.projects.delete_project(project_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn status(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(project_id): PathParams<ProjectId>,
) -> ApiResult<Json<PodStatusBody>> {
    let phase = state.projects.poll_status(project_id, user_id).await?;
    Ok(Json(PodStatusBody {
        pod_status: phase.as_str(),
    }))
}
