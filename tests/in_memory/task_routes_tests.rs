//! Board operations, execution, and output relay over HTTP.

use crate::test_helpers::{TestApp, id_of};
use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use rstest::{fixture, rstest};
use serde_json::json;
use vibe_control::workspace::domain::UserId;

#[fixture]
fn app() -> TestApp {
    TestApp::new()
}

fn task_uri(project_id: &str, task_id: &str, action: &str) -> String {
    format!("/api/projects/{project_id}/tasks/{task_id}/{action}")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_are_listed_in_board_order(app: TestApp) {
    let project_id = app.project().await;
    for (title, position) in [("second", 2), ("first", 1)] {
        let reply = app
            .request(Method::POST, format!("/api/projects/{project_id}/tasks"))
            .json(&json!({"title": title, "position": position, "priority": "high"}))
            .send()
            .await;
        assert_eq!(reply.status, StatusCode::CREATED);
        assert_eq!(reply.body["status"], "todo");
    }

    let reply = app
        .request(Method::GET, format!("/api/projects/{project_id}/tasks"))
        .send()
        .await;

    let titles: Vec<_> = reply.body["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .filter_map(|task| task["title"].as_str())
        .collect();
    assert_eq!(titles, ["first", "second"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_titles_are_bad_requests(app: TestApp) {
    let project_id = app.project().await;

    let reply = app
        .request(Method::POST, format!("/api/projects/{project_id}/tasks"))
        .json(&json!({"title": "   "}))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn moves_outside_the_transition_table_are_rejected(app: TestApp) {
    let project_id = app.project().await;
    let task_id = app.task(&project_id, "Review me").await;

    let skipped = app
        .request(Method::PATCH, task_uri(&project_id, &task_id, "move"))
        .json(&json!({"status": "done"}))
        .send()
        .await;
    let allowed = app
        .request(Method::PATCH, task_uri(&project_id, &task_id, "move"))
        .json(&json!({"status": "in_progress", "position": 3}))
        .send()
        .await;

    assert_eq!(skipped.status, StatusCode::BAD_REQUEST);
    assert_eq!(allowed.status, StatusCode::OK);
    assert_eq!(allowed.body["status"], "in_progress");
    assert_eq!(allowed.body["position"], 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execution_returns_the_pending_session(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;

    let reply = app
        .request(Method::POST, task_uri(&project_id, &task_id, "execute"))
        .send()
        .await;
    let task = app
        .request(Method::GET, format!("/api/projects/{project_id}/tasks/{task_id}"))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "pending");
    assert_eq!(task.body["status"], "in_progress");
    assert_eq!(task.body["current_session_id"], reply.body["session_id"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn simultaneous_executions_have_one_winner(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let uri = task_uri(&project_id, &task_id, "execute");

    let (first, second) = tokio::join!(
        app.request(Method::POST, &uri).send(),
        app.request(Method::POST, &uri).send()
    );

    let mut statuses = [first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
    let sessions = app
        .request(Method::GET, task_uri(&project_id, &task_id, "sessions"))
        .send()
        .await;
    assert_eq!(sessions.body["sessions"].as_array().map(Vec::len), Some(1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_cannot_execute(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;

    let reply = app
        .request(Method::POST, task_uri(&project_id, &task_id, "execute"))
        .as_user(UserId::new())
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(app.sidecar.runs().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stopping_an_idle_task_is_a_client_error(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;

    let reply = app
        .request(Method::POST, task_uri(&project_id, &task_id, "stop"))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error(), "task is not running");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stopping_cancels_the_session_and_resets_the_task(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;

    let reply = app
        .request(Method::POST, task_uri(&project_id, &task_id, "stop"))
        .send()
        .await;
    let task = app
        .request(Method::GET, format!("/api/projects/{project_id}/tasks/{task_id}"))
        .send()
        .await;
    let sessions = app
        .request(Method::GET, task_uri(&project_id, &task_id, "sessions"))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::NO_CONTENT);
    assert_eq!(task.body["status"], "todo");
    assert_eq!(sessions.body["sessions"][0]["id"], session_id.as_str());
    assert_eq!(sessions.body["sessions"][0]["status"], "cancelled");
    assert_eq!(app.sidecar.stops().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn output_is_relayed_as_an_event_stream(app: TestApp) {
    app.sidecar
        .serve_output(vec![Bytes::from_static(b"data: hello\n\n")], false);
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;

    let reply = app
        .request(
            Method::GET,
            format!(
                "{}?session_id={session_id}",
                task_uri(&project_id, &task_id, "output")
            ),
        )
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        reply.headers.get(header::CONTENT_TYPE).map(|value| value.as_bytes()),
        Some(&b"text/event-stream"[..])
    );
    assert_eq!(reply.bytes, Bytes::from_static(b"data: hello\n\n"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn output_needs_a_session_id(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;

    let reply = app
        .request(Method::GET, task_uri(&project_id, &task_id, "output"))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(app.sidecar.stream_opens().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn sessions_of_other_tasks_never_reach_upstream(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let other_id = app.task(&project_id, "Another task").await;
    let session_id = app.execute(&project_id, &task_id).await;

    let reply = app
        .request(
            Method::GET,
            format!(
                "{}?session_id={session_id}",
                task_uri(&project_id, &other_id, "output")
            ),
        )
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(app.sidecar.stream_opens().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn execution_without_configuration_is_reported(app: TestApp) {
    let project_id = app.project().await;
    let task_id = app.task(&project_id, "Unconfigured").await;

    let reply = app
        .request(Method::POST, task_uri(&project_id, &task_id, "execute"))
        .send()
        .await;
    let task = app
        .request(Method::GET, format!("/api/projects/{project_id}/tasks/{task_id}"))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.error(), "config not found");
    assert_eq!(task.body["status"], "todo");
    assert_eq!(id_of(&task.body), task_id);
}

async fn post_agent_message(app: &TestApp, session_id: &str, content: &str) {
    let reply = app
        .callback(Method::POST, format!("/api/sessions/{session_id}/messages"))
        .json(&json!({"type": "agent_response", "content": content}))
        .send()
        .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn session_history_only_holds_that_session(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;
    post_agent_message(&app, &session_id, "Build fixed").await;

    let reply = app
        .request(
            Method::GET,
            task_uri(
                &project_id,
                &task_id,
                &format!("sessions/{session_id}/interactions"),
            ),
        )
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    let interactions = reply.body["interactions"]
        .as_array()
        .expect("interactions array");
    assert!(
        interactions
            .iter()
            .all(|interaction| interaction["session_id"] == session_id.as_str())
    );
    assert!(
        interactions
            .iter()
            .any(|interaction| interaction["content"] == "Build fixed")
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn session_history_of_another_task_is_rejected(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let other_id = app.task(&project_id, "Another task").await;
    let session_id = app.execute(&project_id, &task_id).await;

    let reply = app
        .request(
            Method::GET,
            task_uri(
                &project_id,
                &other_id,
                &format!("sessions/{session_id}/interactions"),
            ),
        )
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clearing_history_empties_the_task_log(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;
    post_agent_message(&app, &session_id, "Build fixed").await;

    let stranger = app
        .request(Method::DELETE, task_uri(&project_id, &task_id, "interactions"))
        .as_user(UserId::new())
        .send()
        .await;
    let cleared = app
        .request(Method::DELETE, task_uri(&project_id, &task_id, "interactions"))
        .send()
        .await;
    let listed = app
        .request(Method::GET, task_uri(&project_id, &task_id, "interactions"))
        .send()
        .await;

    assert_eq!(stranger.status, StatusCode::FORBIDDEN);
    assert_eq!(cleared.status, StatusCode::OK);
    assert!(cleared.body["deleted"].as_u64().unwrap_or_default() >= 1);
    assert_eq!(listed.body["interactions"], json!([]));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn active_sessions_are_listed_per_project(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;
    let elsewhere = app.project().await;

    let mine = app
        .request(Method::GET, format!("/api/projects/{project_id}/sessions/active"))
        .send()
        .await;
    let empty = app
        .request(Method::GET, format!("/api/projects/{elsewhere}/sessions/active"))
        .send()
        .await;
    let stranger = app
        .request(Method::GET, format!("/api/projects/{project_id}/sessions/active"))
        .as_user(UserId::new())
        .send()
        .await;

    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body["sessions"][0]["id"], session_id.as_str());
    assert_eq!(mine.body["sessions"].as_array().map(Vec::len), Some(1));
    assert_eq!(empty.body["sessions"], json!([]));
    assert_eq!(stranger.status, StatusCode::FORBIDDEN);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn running_tasks_cannot_be_deleted_until_stopped(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    app.execute(&project_id, &task_id).await;
    let task_path = format!("/api/projects/{project_id}/tasks/{task_id}");

    let refused = app.request(Method::DELETE, &task_path).send().await;
    app.request(Method::POST, task_uri(&project_id, &task_id, "stop"))
        .send()
        .await;
    let deleted = app.request(Method::DELETE, &task_path).send().await;
    let missing = app.request(Method::GET, &task_path).send().await;

    assert_eq!(refused.status, StatusCode::CONFLICT);
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_cannot_delete_tasks(app: TestApp) {
    let project_id = app.project().await;
    let task_id = app.task(&project_id, "Keep me").await;
    let task_path = format!("/api/projects/{project_id}/tasks/{task_id}");

    let reply = app
        .request(Method::DELETE, &task_path)
        .as_user(UserId::new())
        .send()
        .await;
    let kept = app.request(Method::GET, &task_path).send().await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(kept.status, StatusCode::OK);
}
