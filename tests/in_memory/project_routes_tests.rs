//! Project lifecycle over HTTP.

use crate::test_helpers::{TestApp, id_of};
use axum::http::{Method, StatusCode};
use rstest::{fixture, rstest};
use serde_json::json;
use vibe_control::workspace::{adapters::memory::InMemoryOrchestrator, domain::UserId};

#[fixture]
fn app() -> TestApp {
    TestApp::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_projects_are_listed_for_their_owner(app: TestApp) {
    let project_id = app.project().await;

    let mine = app.request(Method::GET, "/api/projects").send().await;
    let theirs = app
        .request(Method::GET, "/api/projects")
        .as_user(UserId::new())
        .send()
        .await;

    assert_eq!(mine.status, StatusCode::OK);
    let listed: Vec<_> = mine.body["projects"]
        .as_array()
        .expect("projects array")
        .iter()
        .map(id_of)
        .collect();
    assert_eq!(listed, [project_id]);
    assert_eq!(theirs.body["projects"], json!([]));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn requests_without_a_caller_are_unauthorized(app: TestApp) {
    let reply = app
        .request(Method::GET, "/api/projects")
        .anonymous()
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.error(), "user not authenticated");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_are_forbidden(app: TestApp) {
    let project_id = app.project().await;

    let reply = app
        .request(Method::GET, format!("/api/projects/{project_id}"))
        .as_user(UserId::new())
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.error(), "access denied");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_identifiers_are_bad_requests(app: TestApp) {
    let reply = app
        .request(Method::GET, "/api/projects/not-a-uuid")
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(!reply.error().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_bodies_are_bad_requests(app: TestApp) {
    let reply = app
        .request(Method::POST, "/api/projects")
        .raw("application/json", b"{\"name\":")
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn pod_status_reports_the_observed_phase(app: TestApp) {
    let project_id = app.project().await;

    let reply = app
        .request(Method::GET, format!("/api/projects/{project_id}/status"))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["pod_status"], "Running");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn provisioning_failures_still_create_the_project() {
    let orchestrator = InMemoryOrchestrator::new();
    orchestrator
        .fail_provisioning("quota exceeded")
        .expect("orchestrator accepts failure injection");
    let app = TestApp::with_orchestrator(orchestrator);

    let reply = app
        .request(Method::POST, "/api/projects")
        .json(&json!({"name": "doomed"}))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["project"]["name"], "doomed");
    assert!(
        reply.body["provisioning_error"]
            .as_str()
            .is_some_and(|error| error.contains("quota exceeded"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_projects_are_gone_with_their_tasks(app: TestApp) {
    let project_id = app.project().await;
    let task_id = app.task(&project_id, "Doomed task").await;

    let deleted = app
        .request(Method::DELETE, format!("/api/projects/{project_id}"))
        .send()
        .await;
    let project = app
        .request(Method::GET, format!("/api/projects/{project_id}"))
        .send()
        .await;
    let task = app
        .request(
            Method::GET,
            format!("/api/projects/{project_id}/tasks/{task_id}"),
        )
        .send()
        .await;

    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(project.status, StatusCode::NOT_FOUND);
    assert_eq!(task.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[case("/healthz")]
#[case("/ready")]
#[tokio::test(flavor = "multi_thread")]
async fn health_endpoints_answer_without_identity(app: TestApp, #[case] path: &str) {
    let reply = app.request(Method::GET, path).anonymous().send().await;

    assert_eq!(reply.status, StatusCode::OK);
}
