//! Shared HTTP harness for integration and behaviour tests.
//!
//! [`TestApp`] assembles the full router over in-memory adapters and
//! drives it with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use vibe_control::config_vault::adapters::{aes::AesGcmCipher, memory::InMemoryConfigRepository};
use vibe_control::http::{
    self,
    auth::USER_ID_HEADER,
    state::{AppOptions, AppPorts, AppState},
};
use vibe_control::interaction::{
    adapters::memory::InMemoryInteractionRepository, services::ConnectionSettings,
};
use vibe_control::session::adapters::memory::InMemorySessionRepository;
use vibe_control::sidecar::adapters::memory::InMemorySidecar;
use vibe_control::task::adapters::memory::InMemoryTaskRepository;
use vibe_control::workspace::{
    adapters::memory::{InMemoryOrchestrator, InMemoryProjectRepository},
    domain::UserId,
    services::WorkspaceSettings,
};

/// Bearer secret guarding the internal callback routes.
pub const INTERNAL_SECRET: &str = "callback-secret";

/// The router plus handles on the adapters behind it.
pub struct TestApp {
    pub router: Router,
    pub sidecar: Arc<InMemorySidecar>,
    pub orchestrator: Arc<InMemoryOrchestrator>,
    pub owner: UserId,
    pub shutdown: CancellationToken,
}

impl TestApp {
    /// An app whose workspaces become ready immediately.
    pub fn new() -> Self {
        Self::with_orchestrator(InMemoryOrchestrator::with_ready_pods())
    }

    /// An app over a preconfigured orchestrator.
    pub fn with_orchestrator(orchestrator: InMemoryOrchestrator) -> Self {
        let orchestrator = Arc::new(orchestrator);
        let sidecar = Arc::new(InMemorySidecar::new());
        let shutdown = CancellationToken::new();
        let cipher = AesGcmCipher::from_key_bytes(&[9_u8; 32]).expect("32-byte key");
        let ports = AppPorts {
            projects: Arc::new(InMemoryProjectRepository::new()),
            orchestrator: orchestrator.clone(),
            tasks: Arc::new(InMemoryTaskRepository::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            interactions: Arc::new(InMemoryInteractionRepository::new()),
            configs: Arc::new(InMemoryConfigRepository::new()),
            cipher: Arc::new(cipher),
            runner: sidecar.clone(),
            relay: sidecar.clone(),
        };
        let options = AppOptions {
            workspace: WorkspaceSettings {
                namespace: "opencode".to_owned(),
                poll_interval: Duration::from_millis(5),
            },
            connection: ConnectionSettings::default(),
            internal_secret: Some(INTERNAL_SECRET.to_owned()),
            shutdown: shutdown.clone(),
        };
        Self {
            router: http::router(AppState::assemble(ports, options)),
            sidecar,
            orchestrator,
            owner: UserId::new(),
            shutdown,
        }
    }

    /// Starts a request as the project owner.
    pub fn request(&self, method: Method, uri: impl Into<String>) -> Call<'_> {
        Call {
            app: self,
            method,
            uri: uri.into(),
            user: Some(self.owner),
            bearer: None,
            content_type: None,
            body: Bytes::new(),
        }
    }

    /// Starts an internal callback carrying the shared secret.
    pub fn callback(&self, method: Method, uri: impl Into<String>) -> Call<'_> {
        let mut call = self.request(method, uri).anonymous();
        call.bearer = Some(INTERNAL_SECRET.to_owned());
        call
    }

    /// Creates a project and returns its identifier.
    pub async fn project(&self) -> String {
        let reply = self
            .request(Method::POST, "/api/projects")
            .json(&json!({"name": "demo", "description": "integration"}))
            .send()
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
        id_of(&reply.body["project"])
    }

    /// Stores an active configuration with a credential.
    pub async fn configure(&self, project_id: &str) {
        let reply = self
            .request(Method::POST, format!("/api/projects/{project_id}/config"))
            .json(&json!({
                "model_provider": "openai",
                "model_name": "gpt-4o-mini",
                "api_key": "sk-test-key"
            }))
            .send()
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
    }

    /// Creates a task and returns its identifier.
    pub async fn task(&self, project_id: &str, title: &str) -> String {
        let reply = self
            .request(Method::POST, format!("/api/projects/{project_id}/tasks"))
            .json(&json!({"title": title, "description": "Make it work"}))
            .send()
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{:?}", reply.body);
        id_of(&reply.body)
    }

    /// A configured project with one `todo` task.
    pub async fn ready_task(&self) -> (String, String) {
        let project_id = self.project().await;
        self.configure(&project_id).await;
        let task_id = self.task(&project_id, "Fix the build").await;
        (project_id, task_id)
    }

    /// Starts an execution and returns the session identifier.
    pub async fn execute(&self, project_id: &str, task_id: &str) -> String {
        let reply = self
            .request(
                Method::POST,
                format!("/api/projects/{project_id}/tasks/{task_id}/execute"),
            )
            .send()
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{:?}", reply.body);
        reply.body["session_id"]
            .as_str()
            .expect("session_id is a string")
            .to_owned()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A request under construction.
pub struct Call<'a> {
    app: &'a TestApp,
    method: Method,
    uri: String,
    user: Option<UserId>,
    bearer: Option<String>,
    content_type: Option<String>,
    body: Bytes,
}

impl Call<'_> {
    /// Sends the request as `user` instead of the owner.
    pub const fn as_user(mut self, user: UserId) -> Self {
        self.user = Some(user);
        self
    }

    /// Sends the request without a caller identity.
    pub const fn anonymous(mut self) -> Self {
        self.user = None;
        self
    }

    /// Replaces the bearer token.
    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_owned());
        self
    }

    /// Attaches a JSON body.
    pub fn json(mut self, value: &Value) -> Self {
        self.content_type = Some("application/json".to_owned());
        self.body = Bytes::from(value.to_string());
        self
    }

    /// Attaches a raw body.
    pub fn raw(mut self, content_type: &str, body: &'static [u8]) -> Self {
        self.content_type = Some(content_type.to_owned());
        self.body = Bytes::from_static(body);
        self
    }

    /// Runs the request through the router.
    pub async fn send(self) -> Reply {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(user) = self.user {
            builder = builder.header(USER_ID_HEADER, user.to_string());
        }
        if let Some(token) = self.bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(content_type) = self.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(self.body)).expect("request builds");
        let response = self
            .app
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body is readable");
        Reply {
            status,
            headers,
            body: decode(&bytes),
            bytes,
        }
    }
}

/// A collected response.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub bytes: Bytes,
}

impl Reply {
    /// The `error` message of a JSON error body.
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

fn decode(bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// The `id` field of a JSON object.
pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id is a string").to_owned()
}

/// Polls `check` until it holds.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..400 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition was never met");
}
