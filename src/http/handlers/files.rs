//! File-browser relay.
//!
//! Each route forwards to the matching in-pod route with the caller's query
//! string and body untouched, and answers with the upstream status, content
//! type, and body.

use crate::http::auth::Caller;
use crate::http::error::{ApiError, ApiResult};
use crate::http::extract::{PathParams, QueryParams};
use crate::http::state::AppState;
use crate::sidecar::domain::{FileOperation, FileRequest, RelayResponse};
use crate::workspace::domain::ProjectId;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header, request::Parts};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PathQuery {
    #[serde(default)]
    path: Option<String>,
}

/// Inputs shared by every file route.
pub(crate) struct Relay {
    caller: Caller,
    project_id: ProjectId,
    path: Option<String>,
    query: Option<String>,
}

impl<S> FromRequestParts<S> for Relay
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        let PathParams(project_id) = PathParams::<ProjectId>::from_request_parts(parts, state).await?;
        let QueryParams(PathQuery { path }) =
            QueryParams::<PathQuery>::from_request_parts(parts, state).await?;
        let query = parts.uri.query().map(str::to_owned);
        Ok(Self {
            caller,
            project_id,
            path,
            query,
        })
    }
}

impl Relay {
    async fn send(
        self,
        state: &AppState,
        operation: FileOperation,
        content_type: Option<&str>,
        body: Bytes,
    ) -> ApiResult<Response> {
        let Caller(user_id) = self.caller;
        let mut request = FileRequest::new(operation, self.path.as_deref(), self.query, body)
            .map_err(|err| ApiError::bad_request(err.to_string()))?;
        if let Some(value) = content_type {
            request = request.with_content_type(value);
        }
        let response = state
            .proxy
            .file_operation(self.project_id, user_id, &request)
            .await?;
        Ok(relayed(response))
    }
}

fn relayed(response: RelayResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut reply = (status, response.body).into_response();
    if let Some(value) = response
        .content_type
        .as_deref()
        .and_then(|raw| HeaderValue::from_str(raw).ok())
    {
        reply.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    reply
}

fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

pub(crate) async fn tree(State(state): State<AppState>, relay: Relay) -> ApiResult<Response> {
    relay.send(&state, FileOperation::Tree, None, Bytes::new()).await
}

pub(crate) async fn content(State(state): State<AppState>, relay: Relay) -> ApiResult<Response> {
    relay
        .send(&state, FileOperation::Content, None, Bytes::new())
        .await
}

pub(crate) async fn info(State(state): State<AppState>, relay: Relay) -> ApiResult<Response> {
    relay.send(&state, FileOperation::Info, None, Bytes::new()).await
}

pub(crate) async fn delete(State(state): State<AppState>, relay: Relay) -> ApiResult<Response> {
    relay
        .send(&state, FileOperation::Delete, None, Bytes::new())
        .await
}

pub(crate) async fn write(
    State(state): State<AppState>,
    relay: Relay,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    relay
        .send(&state, FileOperation::Write, content_type(&headers), body)
        .await
}

pub(crate) async fn mkdir(
    State(state): State<AppState>,
    relay: Relay,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    relay
        .send(&state, FileOperation::Mkdir, content_type(&headers), body)
        .await
}
