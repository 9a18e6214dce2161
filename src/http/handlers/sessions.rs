//! Internal callbacks used by the workspace agent.

use crate::http::error::ApiResult;
use crate::http::extract::{JsonBody, PathParams};
use crate::http::state::AppState;
use crate::interaction::domain::{Interaction, MessageType};
use crate::session::domain::{Session, SessionId, SessionStatus};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct ActiveSessions {
    sessions: Vec<Session>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusReport {
    status: SessionStatus,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EventCheckpoint {
    last_event_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentMessage {
    #[serde(rename = "type", alias = "message_type")]
    message_type: MessageType,
    content: String,
    #[serde(default)]
    metadata: Value,
}

pub(crate) async fn list_active(State(state): State<AppState>) -> ApiResult<Json<ActiveSessions>> {
    let sessions = state.sessions.list_active().await?;
    Ok(Json(ActiveSessions { sessions }))
}

/// `PATCH /api/sessions/{id}/status`: a terminal report settles the task.
pub(crate) async fn update_status(
    State(state): State<AppState>,
    PathParams(session_id): PathParams<SessionId>,
    JsonBody(report): JsonBody<StatusReport>,
) -> ApiResult<StatusCode> {
    state
        .coordinator
        .handle_session_report(session_id, report.status, report.error.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn update_event_id(
    State(state): State<AppState>,
    PathParams(session_id): PathParams<SessionId>,
    JsonBody(checkpoint): JsonBody<EventCheckpoint>,
) -> ApiResult<StatusCode> {
    state
        .sessions
        .update_last_event_id(session_id, &checkpoint.last_event_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn post_message(
    State(state): State<AppState>,
    PathParams(session_id): PathParams<SessionId>,
    JsonBody(message): JsonBody<AgentMessage>,
) -> ApiResult<(StatusCode, Json<Interaction>)> {
    let interaction = state
        .coordinator
        .report_agent_message(
            session_id,
            message.message_type,
            message.content,
            message.metadata,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(interaction)))
}
