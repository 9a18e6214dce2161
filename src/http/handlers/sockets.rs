//! WebSocket endpoints: the file-watch bridge and interaction sessions.
//!
//! Ownership is checked and the upstream opened before the upgrade, so
//! failures still surface as ordinary JSON errors.

use crate::http::auth::Caller;
use crate::http::error::ApiResult;
use crate::http::extract::PathParams;
use crate::http::state::AppState;
use crate::interaction::services::serve_connection;
use crate::sidecar::services::bridge;
use crate::task::domain::TaskId;
use crate::workspace::domain::ProjectId;
use crate::ws::Frame;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{Sink, SinkExt, Stream, StreamExt, future};

/// Views an axum socket as a frame sink and stream.
fn frames(
    socket: WebSocket,
) -> (
    impl Sink<Frame, Error = axum::Error> + Send + Unpin,
    impl Stream<Item = Result<Frame, axum::Error>> + Send + Unpin,
) {
    let (sink, stream) = socket.split();
    (
        sink.with(|frame: Frame| future::ready(Ok::<_, axum::Error>(Message::from(frame)))),
        stream.map(|message| message.map(Frame::from)),
    )
}

/// `GET /api/projects/{id}/files/watch`
pub(crate) async fn file_watch(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(project_id): PathParams<ProjectId>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let upstream = state.proxy.open_file_watch(project_id, user_id).await?;
    let shutdown = state.shutdown.child_token();
    Ok(ws.on_upgrade(move |socket| async move {
        let outcome = bridge(frames(socket), (upstream.sink, upstream.stream), &shutdown).await;
        tracing::debug!(project_id = %project_id, ?outcome, "file watch bridge ended");
    }))
}

/// `GET /api/tasks/{id}/interact`
pub(crate) async fn interact(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(task_id): PathParams<TaskId>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    state.interactions.authorize(task_id, user_id).await?;
    let service = state.interactions.clone();
    let settings = state.connection;
    let shutdown = state.shutdown.clone();
    Ok(ws.on_upgrade(move |socket| async move {
        let (sink, stream) = frames(socket);
        tokio::select! {
            end = serve_connection(&*service, task_id, user_id, sink, stream, settings) => {
                tracing::debug!(task_id = %task_id, ?end, "interaction session ended");
            }
            () = shutdown.cancelled() => {
                tracing::debug!(task_id = %task_id, "interaction session closed for shutdown");
            }
        }
    }))
}
