//! File-browser relay over HTTP.

use crate::test_helpers::TestApp;
use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use rstest::{fixture, rstest};
use vibe_control::sidecar::domain::{FileOperation, RelayResponse};
use vibe_control::workspace::domain::UserId;

#[fixture]
fn app() -> TestApp {
    TestApp::new()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn upstream_status_and_body_pass_through(app: TestApp) {
    app.sidecar.respond_to_files(RelayResponse {
        status: 404,
        content_type: Some("application/json".to_owned()),
        body: Bytes::from_static(br#"{"error":"no such file"}"#),
    });
    let project_id = app.project().await;

    let reply = app
        .request(
            Method::GET,
            format!("/api/projects/{project_id}/files/content?path=src%2Fmain.rs"),
        )
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.bytes, Bytes::from_static(br#"{"error":"no such file"}"#));
    assert_eq!(
        reply.headers.get(header::CONTENT_TYPE).map(|value| value.as_bytes()),
        Some(&b"application/json"[..])
    );
    let forwarded = app.sidecar.forwards();
    let [request] = forwarded.as_slice() else {
        panic!("expected one forwarded request, got {forwarded:?}");
    };
    assert_eq!(request.operation(), FileOperation::Content);
    assert_eq!(request.query(), Some("path=src%2Fmain.rs"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn writes_forward_body_and_content_type(app: TestApp) {
    let project_id = app.project().await;

    let reply = app
        .request(
            Method::POST,
            format!("/api/projects/{project_id}/files/write?path=notes.txt"),
        )
        .raw("text/plain", b"hello")
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::OK);
    let forwarded = app.sidecar.forwards();
    let [request] = forwarded.as_slice() else {
        panic!("expected one forwarded request, got {forwarded:?}");
    };
    assert_eq!(request.operation(), FileOperation::Write);
    assert_eq!(request.body(), &Bytes::from_static(b"hello"));
    assert_eq!(request.content_type(), Some("text/plain"));
}

#[rstest]
#[case(Method::GET, "files/content")]
#[case(Method::GET, "files/info")]
#[case(Method::DELETE, "files")]
#[tokio::test(flavor = "multi_thread")]
async fn path_bound_operations_need_a_path(
    app: TestApp,
    #[case] method: Method,
    #[case] route: &str,
) {
    let project_id = app.project().await;

    let reply = app
        .request(method, format!("/api/projects/{project_id}/{route}"))
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(app.sidecar.forwards().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn strangers_cannot_browse_files(app: TestApp) {
    let project_id = app.project().await;

    let reply = app
        .request(Method::GET, format!("/api/projects/{project_id}/files/tree"))
        .as_user(UserId::new())
        .send()
        .await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert!(app.sidecar.forwards().is_empty());
}
