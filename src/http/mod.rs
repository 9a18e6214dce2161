//! Axum boundary of the control plane.
//!
//! Handlers stay thin: they extract the caller and inputs, call one service
//! operation, and let [`error::ApiError`] decide the status code. Routes the
//! workspace agent calls back on sit behind [`auth::require_internal_secret`].

pub mod auth;
pub mod error;
pub mod extract;
mod handlers;
pub mod state;

use axum::Router;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, patch, post};
use handlers::{config, files, projects, sessions, sockets, tasks};
use state::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const TASK: &str = "/api/projects/{id}/tasks/{task_id}";

/// Builds the full route table over `state`.
#[must_use]
pub fn router(state: AppState) -> Router {
    let internal = Router::new()
        .route("/api/sessions/active", get(sessions::list_active))
        .route("/api/sessions/{id}/status", patch(sessions::update_status))
        .route("/api/sessions/{id}/event-id", patch(sessions::update_event_id))
        .route("/api/sessions/{id}/messages", post(sessions::post_message))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_internal_secret,
        ));

    let public = Router::new()
        .route("/api/projects", post(projects::create).get(projects::list))
        .route(
            "/api/projects/{id}",
            get(projects::get).delete(projects::delete),
        )
        .route("/api/projects/{id}/status", get(projects::status))
        .route(
            "/api/projects/{id}/tasks",
            post(tasks::create).get(tasks::list),
        )
        .route(
            "/api/projects/{id}/sessions/active",
            get(tasks::active_sessions),
        )
        .route(TASK, get(tasks::get).delete(tasks::delete))
        .route(&format!("{TASK}/move"), patch(tasks::move_task))
        .route(&format!("{TASK}/execute"), post(tasks::execute))
        .route(&format!("{TASK}/stop"), post(tasks::stop))
        .route(&format!("{TASK}/output"), get(tasks::output))
        .route(&format!("{TASK}/sessions"), get(tasks::sessions))
        .route(
            &format!("{TASK}/interactions"),
            get(tasks::interactions).delete(tasks::clear_interactions),
        )
        .route(
            &format!("{TASK}/sessions/{{session_id}}/interactions"),
            get(tasks::session_interactions),
        )
        .route("/api/projects/{id}/files", delete(files::delete))
        .route("/api/projects/{id}/files/tree", get(files::tree))
        .route("/api/projects/{id}/files/content", get(files::content))
        .route("/api/projects/{id}/files/info", get(files::info))
        .route("/api/projects/{id}/files/write", post(files::write))
        .route("/api/projects/{id}/files/mkdir", post(files::mkdir))
        .route("/api/projects/{id}/files/watch", get(sockets::file_watch))
        .route("/api/tasks/{id}/interact", get(sockets::interact))
        .route(
            "/api/projects/{id}/config",
            get(config::active).post(config::create_or_update),
        )
        .route("/api/projects/{id}/config/versions", get(config::versions))
        .route(
            "/api/projects/{id}/config/rollback/{version}",
            post(config::rollback),
        )
        .route(
            "/api/projects/{id}/config/versions/{version}",
            delete(config::delete_version),
        );

    Router::new()
        .route("/healthz", get(|| async { StatusCode::OK }))
        .route("/ready", get(|| async { StatusCode::OK }))
        .merge(internal)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
