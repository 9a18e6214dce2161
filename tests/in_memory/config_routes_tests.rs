//! Versioned configuration over HTTP.

use crate::test_helpers::TestApp;
use axum::http::{Method, StatusCode};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

#[fixture]
fn app() -> TestApp {
    TestApp::new()
}

fn versions(reply: &Value) -> Vec<(u64, bool)> {
    reply
        .as_array()
        .expect("versions array")
        .iter()
        .map(|config| {
            (
                config["version"].as_u64().expect("numeric version"),
                config["is_active"].as_bool().expect("boolean flag"),
            )
        })
        .collect()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_configuration_is_not_found(app: TestApp) {
    let project_id = app.project().await;

    let reply = app
        .request(Method::GET, format!("/api/projects/{project_id}/config"))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.error(), "config not found");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_configuration_never_echoes_the_key(app: TestApp) {
    let project_id = app.project().await;
    app.configure(&project_id).await;

    let reply = app
        .request(Method::GET, format!("/api/projects/{project_id}/config"))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["model_name"], "gpt-4o-mini");
    assert_eq!(reply.body["version"], 1);
    assert!(!String::from_utf8_lossy(&reply.bytes).contains("sk-test-key"));
}

#[rstest]
#[case(json!({"model_provider": "acme", "model_name": "x"}))]
#[case(json!({"model_provider": "openai", "model_name": "gpt-4o-mini", "temperature": 3.5}))]
#[case(json!({"model_provider": "openai", "model_name": "gpt-4o-mini", "max_tokens": 0}))]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_settings_are_rejected(app: TestApp, #[case] body: Value) {
    let project_id = app.project().await;

    let reply = app
        .request(Method::POST, format!("/api/projects/{project_id}/config"))
        .json(&body)
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rollback_copies_an_old_version_forward(app: TestApp) {
    let project_id = app.project().await;
    app.configure(&project_id).await;
    app.configure(&project_id).await;

    let rolled = app
        .request(
            Method::POST,
            format!("/api/projects/{project_id}/config/rollback/1"),
        )
        .send()
        .await;
    let listed = app
        .request(
            Method::GET,
            format!("/api/projects/{project_id}/config/versions"),
        )
        .send()
        .await;

    assert_eq!(rolled.status, StatusCode::CREATED);
    assert_eq!(rolled.body["version"], 3);
    assert_eq!(versions(&listed.body), [(3, true), (2, false), (1, false)]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rollback_to_an_unknown_version_is_not_found(app: TestApp) {
    let project_id = app.project().await;
    app.configure(&project_id).await;

    let reply = app
        .request(
            Method::POST,
            format!("/api/projects/{project_id}/config/rollback/9"),
        )
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_inactive_versions_can_be_deleted(app: TestApp) {
    let project_id = app.project().await;
    app.configure(&project_id).await;
    app.configure(&project_id).await;
    let uri = |version: u32| format!("/api/projects/{project_id}/config/versions/{version}");

    let active = app.request(Method::DELETE, uri(2)).send().await;
    let inactive = app.request(Method::DELETE, uri(1)).send().await;
    let missing = app.request(Method::DELETE, uri(1)).send().await;

    assert_eq!(active.status, StatusCode::BAD_REQUEST);
    assert_eq!(inactive.status, StatusCode::NO_CONTENT);
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_cannot_read_configuration(app: TestApp) {
    let project_id = app.project().await;
    app.configure(&project_id).await;

    let reply = app
        .request(Method::GET, format!("/api/projects/{project_id}/config"))
        .as_user(vibe_control::workspace::domain::UserId::new())
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}
