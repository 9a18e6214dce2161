//! Domain tests for file requests and run bodies.

use crate::config_vault::{
    domain::{ConfigDraft, ConfigSettings, Credential, ModelProvider, OpenCodeConfig},
    services::AgentSettings,
};
use crate::session::domain::SessionId;
use crate::sidecar::domain::{FileOperation, FileRequest, FileRequestError, RequestMethod, RunRequest};
use crate::workspace::domain::{ProjectId, UserId};
use axum::body::Bytes;
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[case(FileOperation::Tree, RequestMethod::Get, "/files/tree")]
#[case(FileOperation::Content, RequestMethod::Get, "/files/content")]
#[case(FileOperation::Info, RequestMethod::Get, "/files/info")]
#[case(FileOperation::Write, RequestMethod::Post, "/files/write")]
#[case(FileOperation::Delete, RequestMethod::Delete, "/files")]
#[case(FileOperation::Mkdir, RequestMethod::Post, "/files/mkdir")]
fn operations_map_to_upstream_routes(
    #[case] operation: FileOperation,
    #[case] method: RequestMethod,
    #[case] path: &str,
) {
    assert_eq!(operation.method(), method);
    assert_eq!(operation.upstream_path(), path);
}

#[rstest]
#[case(FileOperation::Content, None)]
#[case(FileOperation::Info, Some(""))]
#[case(FileOperation::Delete, Some("   "))]
fn path_operations_require_a_path(#[case] operation: FileOperation, #[case] path: Option<&str>) {
    let err = FileRequest::new(operation, path, None, Bytes::new())
        .expect_err("path is required");

    assert_eq!(err, FileRequestError::MissingPath(operation));
}

#[rstest]
#[case(FileOperation::Write)]
#[case(FileOperation::Mkdir)]
fn body_operations_require_a_body(#[case] operation: FileOperation) {
    let err = FileRequest::new(operation, None, None, Bytes::new()).expect_err("body is required");

    assert_eq!(err, FileRequestError::MissingBody(operation));
}

#[rstest]
fn tree_listing_needs_no_input() {
    let request = FileRequest::new(FileOperation::Tree, None, Some(String::new()), Bytes::new())
        .expect("tree has no required input");

    assert_eq!(request.query(), None);
    assert_eq!(request.path_and_query(), "/files/tree");
}

#[rstest]
fn query_strings_are_forwarded_verbatim() {
    let request = FileRequest::new(
        FileOperation::Content,
        Some("src/main.rs"),
        Some("path=src%2Fmain.rs&raw=1".to_owned()),
        Bytes::new(),
    )
    .expect("path is present");

    assert_eq!(request.path_and_query(), "/files/content?path=src%2Fmain.rs&raw=1");
}

fn agent_settings(credential: Option<&str>) -> AgentSettings {
    let mut settings = ConfigSettings::new(ModelProvider::OpenAi, "gpt-4o");
    settings.system_prompt = Some("Be terse.".to_owned());
    let draft = ConfigDraft::new(ProjectId::new(), settings, None, UserId::new(), &DefaultClock);
    AgentSettings {
        config: OpenCodeConfig::activate(draft, 1),
        credential: credential.map(Credential::new),
    }
}

#[rstest]
fn run_body_carries_model_and_key() {
    let session_id = SessionId::new();
    let request = RunRequest::new(session_id, "Task: x".to_owned(), agent_settings(Some("sk-1")));

    let body = serde_json::to_value(&request).expect("request serialises");

    assert_eq!(body["session_id"], session_id.to_string());
    assert_eq!(body["model_config"]["provider"], "openai");
    assert_eq!(body["model_config"]["model"], "gpt-4o");
    assert_eq!(body["model_config"]["api_key"], "sk-1");
    assert_eq!(body["system_prompt"], "Be terse.");
    assert!(body["model_config"].get("model_version").is_none());
}

#[rstest]
fn run_debug_output_hides_the_key() {
    let request = RunRequest::new(
        SessionId::new(),
        "Task: x".to_owned(),
        agent_settings(Some("sk-very-secret")),
    );

    let rendered = format!("{request:?}");

    assert!(!rendered.contains("sk-very-secret"));
    assert!(rendered.contains("<redacted>"));
}
