//! Task board, execution, and per-task history endpoints.

use crate::http::auth::Caller;
use crate::http::error::ApiResult;
use crate::http::extract::{JsonBody, PathParams, QueryParams};
use crate::http::state::AppState;
use crate::interaction::domain::Interaction;
use crate::session::domain::{Session, SessionId};
use crate::task::domain::{Task, TaskId, TaskPriority, TaskStatus};
use crate::task::services::{CreateTaskRequest, ExecutionStarted};
use crate::workspace::domain::ProjectId;
use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

const LAST_EVENT_ID: &str = "last-event-id";

#[derive(Debug, Deserialize)]
pub(crate) struct CreateTaskBody {
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<TaskPriority>,
    #[serde(default)]
    position: Option<i32>,
}

impl From<CreateTaskBody> for CreateTaskRequest {
    fn from(body: CreateTaskBody) -> Self {
        let mut request = Self::new(body.title);
        if let Some(description) = body.description {
            request = request.with_description(description);
        }
        if let Some(priority) = body.priority {
            request = request.with_priority(priority);
        }
        if let Some(position) = body.position {
            request = request.with_position(position);
        }
        request
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoveTaskBody {
    status: TaskStatus,
    #[serde(default)]
    position: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OutputQuery {
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskList {
    tasks: Vec<Task>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionList {
    sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
pub(crate) struct InteractionList {
    interactions: Vec<Interaction>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClearedHistory {
    deleted: usize,
}

pub(crate) async fn create(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(project_id): PathParams<ProjectId>,
    JsonBody(body): JsonBody<CreateTaskBody>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state
        .board
        .create_task(project_id, user_id, body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub(crate) async fn list(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(project_id): PathParams<ProjectId>,
) -> ApiResult<Json<TaskList>> {
    let tasks = state.board.list_tasks(project_id, user_id).await?;
    Ok(Json(TaskList { tasks }))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, task_id)): PathParams<(ProjectId, TaskId)>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.board.get_task(project_id, task_id, user_id).await?))
}

pub(crate) async fn move_task(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, task_id)): PathParams<(ProjectId, TaskId)>,
    JsonBody(body): JsonBody<MoveTaskBody>,
) -> ApiResult<Json<Task>> {
    let task = state
        .board
        .move_task(project_id, task_id, user_id, body.status, body.position)
        .await?;
    Ok(Json(task))
}

/// `DELETE .../tasks/{task_id}`: refused with 409 while a session is active.
pub(crate) async fn delete(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, task_id)): PathParams<(ProjectId, TaskId)>,
) -> ApiResult<StatusCode> {
    state
        .board
        .delete_task(project_id, task_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST .../execute`: returns as soon as the session exists; the run is
/// dispatched in the background.
pub(crate) async fn execute(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, task_id)): PathParams<(ProjectId, TaskId)>,
) -> ApiResult<Json<ExecutionStarted>> {
    let started = state
        .coordinator
        .execute_task(project_id, task_id, user_id)
        .await?;
    Ok(Json(started))
}

pub(crate) async fn stop(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, task_id)): PathParams<(ProjectId, TaskId)>,
) -> ApiResult<StatusCode> {
    state
        .coordinator
        .stop_task(project_id, task_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn sessions(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, task_id)): PathParams<(ProjectId, TaskId)>,
) -> ApiResult<Json<SessionList>> {
    let sessions = state
        .board
        .task_sessions(project_id, task_id, user_id)
        .await?;
    Ok(Json(SessionList { sessions }))
}

pub(crate) async fn interactions(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, task_id)): PathParams<(ProjectId, TaskId)>,
) -> ApiResult<Json<InteractionList>> {
    let interactions = state
        .interactions
        .list_interactions(project_id, task_id, user_id)
        .await?;
    Ok(Json(InteractionList { interactions }))
}

pub(crate) async fn session_interactions(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, task_id, session_id)): PathParams<(ProjectId, TaskId, SessionId)>,
) -> ApiResult<Json<InteractionList>> {
    let interactions = state
        .interactions
        .session_interactions(project_id, task_id, session_id, user_id)
        .await?;
    Ok(Json(InteractionList { interactions }))
}

pub(crate) async fn clear_interactions(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, task_id)): PathParams<(ProjectId, TaskId)>,
) -> ApiResult<Json<ClearedHistory>> {
    let deleted = state
        .interactions
        .clear_history(project_id, task_id, user_id)
        .await?;
    Ok(Json(ClearedHistory { deleted }))
}

pub(crate) async fn active_sessions(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(project_id): PathParams<ProjectId>,
) -> ApiResult<Json<SessionList>> {
    let sessions = state
        .board
        .active_project_sessions(project_id, user_id)
        .await?;
    Ok(Json(SessionList { sessions }))
}

/// `GET .../output?session_id=`: relays the agent's event stream.
///
/// The session must belong to the task before anything is opened upstream.
/// The upstream status and content type pass through unchanged.
pub(crate) async fn output(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, task_id)): PathParams<(ProjectId, TaskId)>,
    QueryParams(query): QueryParams<OutputQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let last_event_id = headers
        .get(LAST_EVENT_ID)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let relayed = state
        .proxy
        .open_output(
            project_id,
            task_id,
            user_id,
            query.session_id.as_deref(),
            last_event_id,
        )
        .await?;

    let status = StatusCode::from_u16(relayed.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = relayed
        .content_type
        .as_deref()
        .and_then(|value| HeaderValue::from_str(value).ok())
        .unwrap_or_else(|| HeaderValue::from_static("text/event-stream"));
    Ok((
        status,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
        ],
        Body::from_stream(relayed.body),
    )
        .into_response())
}
