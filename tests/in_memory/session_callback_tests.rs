//! Internal callbacks the workspace agent makes while a run is live.

use crate::test_helpers::{TestApp, eventually};
use axum::http::{Method, StatusCode};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use vibe_control::session::domain::SessionId;

#[fixture]
fn app() -> TestApp {
    TestApp::new()
}

async fn task_status(app: &TestApp, project_id: &str, task_id: &str) -> Value {
    app.request(
        Method::GET,
        format!("/api/projects/{project_id}/tasks/{task_id}"),
    )
    .send()
    .await
    .body["status"]
        .clone()
}

#[rstest]
#[case(None)]
#[case(Some("wrong-secret"))]
#[tokio::test(flavor = "multi_thread")]
async fn callbacks_require_the_shared_secret(app: TestApp, #[case] token: Option<&str>) {
    let mut call = app.request(Method::GET, "/api/sessions/active").anonymous();
    if let Some(token) = token {
        call = call.bearer(token);
    }

    let reply = call.send().await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.error(), "missing or invalid bearer token");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn active_sessions_are_listed(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;

    let reply = app
        .callback(Method::GET, "/api/sessions/active")
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    let ids: Vec<_> = reply.body["sessions"]
        .as_array()
        .expect("sessions array")
        .iter()
        .filter_map(|session| session["id"].as_str())
        .collect();
    assert_eq!(ids, [session_id.as_str()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completion_reports_move_the_task_to_ai_review(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;
    eventually(|| async { app.sidecar.runs().len() == 1 }).await;

    let running = app
        .callback(Method::PATCH, format!("/api/sessions/{session_id}/status"))
        .json(&json!({"status": "running"}))
        .send()
        .await;
    let completed = app
        .callback(Method::PATCH, format!("/api/sessions/{session_id}/status"))
        .json(&json!({"status": "completed"}))
        .send()
        .await;

    assert_eq!(running.status, StatusCode::NO_CONTENT);
    assert_eq!(completed.status, StatusCode::NO_CONTENT);
    assert_eq!(task_status(&app, &project_id, &task_id).await, "ai_review");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn contradictory_reports_are_rejected(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;
    let uri = format!("/api/sessions/{session_id}/status");
    app.callback(Method::PATCH, &uri)
        .json(&json!({"status": "failed", "error": "boom"}))
        .send()
        .await;

    let reply = app
        .callback(Method::PATCH, &uri)
        .json(&json!({"status": "running"}))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(task_status(&app, &project_id, &task_id).await, "todo");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_sessions_are_not_found(app: TestApp) {
    let missing = SessionId::new();

    let status = app
        .callback(Method::PATCH, format!("/api/sessions/{missing}/status"))
        .json(&json!({"status": "completed"}))
        .send()
        .await;
    let event = app
        .callback(Method::PATCH, format!("/api/sessions/{missing}/event-id"))
        .json(&json!({"last_event_id": "evt-1"}))
        .send()
        .await;

    assert_eq!(status.status, StatusCode::NOT_FOUND);
    assert_eq!(event.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn event_checkpoints_feed_output_resumption(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;

    let stored = app
        .callback(Method::PATCH, format!("/api/sessions/{session_id}/event-id"))
        .json(&json!({"last_event_id": "evt-7"}))
        .send()
        .await;
    let output = app
        .request(
            Method::GET,
            format!("/api/projects/{project_id}/tasks/{task_id}/output?session_id={session_id}"),
        )
        .send()
        .await;

    assert_eq!(stored.status, StatusCode::NO_CONTENT);
    assert_eq!(output.status, StatusCode::OK);
    let opens = app.sidecar.stream_opens();
    let [(_, resumed_from)] = opens.as_slice() else {
        panic!("expected one stream open, got {opens:?}");
    };
    assert_eq!(resumed_from.as_deref(), Some("evt-7"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn agent_messages_are_stored_as_interactions(app: TestApp) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;

    let posted = app
        .callback(Method::POST, format!("/api/sessions/{session_id}/messages"))
        .json(&json!({
            "type": "agent_response",
            "content": "Build fixed",
            "metadata": {"files": 2}
        }))
        .send()
        .await;
    let listed = app
        .request(
            Method::GET,
            format!("/api/projects/{project_id}/tasks/{task_id}/interactions"),
        )
        .send()
        .await;

    assert_eq!(posted.status, StatusCode::CREATED);
    assert_eq!(posted.body["message_type"], "agent_response");
    assert_eq!(posted.body["session_id"], session_id.as_str());
    let contents: Vec<_> = listed.body["interactions"]
        .as_array()
        .expect("interactions array")
        .iter()
        .filter_map(|interaction| interaction["content"].as_str())
        .collect();
    assert!(contents.contains(&"Build fixed"));
}

#[rstest]
#[case(json!({"type": "user_message", "content": "spoofed"}))]
#[case(json!({"type": "agent_response", "content": "  "}))]
#[case(json!({"type": "agent_response", "content": "x", "metadata": [1, 2]}))]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_agent_messages_are_rejected(app: TestApp, #[case] body: Value) {
    let (project_id, task_id) = app.ready_task().await;
    let session_id = app.execute(&project_id, &task_id).await;

    let reply = app
        .callback(Method::POST, format!("/api/sessions/{session_id}/messages"))
        .json(&body)
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}
