//! HTTP and WebSocket client for the in-pod API.
//!
//! Requests go to the agent port for run control and session streams and
//! to the file-browser port for file operations. Every call carries the
//! shared bearer secret when one is configured.

use crate::session::domain::SessionId;
use crate::sidecar::{
    domain::{FileRequest, RelayResponse, RequestMethod, RunAcknowledgement, RunRequest},
    ports::{
        AgentRunner, RelayedStream, SidecarError, SidecarRelay, SidecarResult, UpstreamSocket,
    },
};
use crate::workspace::domain::WorkspaceAddress;
use crate::ws::Frame;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt, future};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tokio_tungstenite::tungstenite::{
    self, client::IntoClientRequest, http::HeaderValue, http::header::AUTHORIZATION,
};

/// Upstream error bodies are cut to this many characters.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Settings for [`HttpSidecarClient`].
#[derive(Clone, PartialEq, Eq)]
pub struct HttpSidecarSettings {
    /// Port of the in-pod agent API.
    pub agent_port: u16,
    /// Port of the in-pod file browser.
    pub files_port: u16,
    /// Bearer secret shared with the workspace, if any.
    pub shared_secret: Option<String>,
    /// Bound on connection setup and non-streaming calls.
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpSidecarSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSidecarSettings")
            .field("agent_port", &self.agent_port)
            .field("files_port", &self.files_port)
            .field("shared_secret", &self.shared_secret.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Sidecar adapter backed by `reqwest` and `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct HttpSidecarClient {
    client: reqwest::Client,
    settings: HttpSidecarSettings,
}

impl HttpSidecarClient {
    /// Builds a client with the configured connect timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarError::Protocol`] when the TLS backend cannot be
    /// initialised.
    pub fn new(settings: HttpSidecarSettings) -> SidecarResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.timeout)
            .build()
            .map_err(SidecarError::protocol)?;
        Ok(Self { client, settings })
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match self.settings.shared_secret.as_deref() {
            Some(secret) => builder.bearer_auth(secret),
            None => builder,
        }
    }

    async fn expect_success(response: reqwest::Response) -> SidecarResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(SidecarError::UpstreamStatus {
            status: status.as_u16(),
            body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        })
    }
}

fn map_transport(err: reqwest::Error) -> SidecarError {
    if err.is_decode() || err.is_builder() {
        SidecarError::protocol(err)
    } else {
        SidecarError::unreachable(err)
    }
}

fn content_type(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

const fn to_reqwest(method: RequestMethod) -> reqwest::Method {
    match method {
        RequestMethod::Get => reqwest::Method::GET,
        RequestMethod::Post => reqwest::Method::POST,
        RequestMethod::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl AgentRunner for HttpSidecarClient {
    async fn start_run(
        &self,
        address: &WorkspaceAddress,
        request: &RunRequest,
    ) -> SidecarResult<RunAcknowledgement> {
        let url = address.url("http", self.settings.agent_port, "/sessions");
        let response = self
            .request(reqwest::Method::POST, url)
            .timeout(self.settings.timeout)
            .json(request)
            .send()
            .await
            .map_err(map_transport)?;
        let accepted = Self::expect_success(response).await?;
        let body = accepted.bytes().await.map_err(map_transport)?;
        if body.is_empty() {
            return Ok(RunAcknowledgement::default());
        }
        serde_json::from_slice(&body).map_err(SidecarError::protocol)
    }

    async fn stop_run(
        &self,
        address: &WorkspaceAddress,
        session_id: SessionId,
    ) -> SidecarResult<()> {
        let path = format!("/sessions/{session_id}/stop");
        let url = address.url("http", self.settings.agent_port, &path);
        let response = self
            .request(reqwest::Method::POST, url)
            .timeout(self.settings.timeout)
            .send()
            .await
            .map_err(map_transport)?;
        Self::expect_success(response).await.map(|_| ())
    }
}

#[async_trait]
impl SidecarRelay for HttpSidecarClient {
    async fn forward(
        &self,
        address: &WorkspaceAddress,
        request: &FileRequest,
    ) -> SidecarResult<RelayResponse> {
        let url = address.url("http", self.settings.files_port, &request.path_and_query());
        let mut builder = self
            .request(to_reqwest(request.operation().method()), url)
            .timeout(self.settings.timeout);
        if !request.body().is_empty() {
            builder = builder.body(request.body().clone());
        }
        if let Some(value) = request.content_type() {
            builder = builder.header(CONTENT_TYPE, value);
        }

        let response = builder.send().await.map_err(map_transport)?;
        let status = response.status().as_u16();
        let upstream_type = content_type(&response);
        let body = response.bytes().await.map_err(map_transport)?;
        Ok(RelayResponse {
            status,
            content_type: upstream_type,
            body,
        })
    }

    async fn open_output_stream(
        &self,
        address: &WorkspaceAddress,
        session_id: SessionId,
        last_event_id: Option<String>,
    ) -> SidecarResult<RelayedStream> {
        let path = format!("/sessions/{session_id}/stream");
        let url = address.url("http", self.settings.agent_port, &path);
        let mut builder = self
            .request(reqwest::Method::GET, url)
            .header(ACCEPT, "text/event-stream");
        if let Some(checkpoint) = last_event_id {
            builder = builder.header("Last-Event-ID", checkpoint);
        }

        let response = tokio::time::timeout(self.settings.timeout, builder.send())
            .await
            .map_err(SidecarError::unreachable)?
            .map_err(map_transport)?;
        let status = response.status().as_u16();
        let upstream_type = content_type(&response);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(SidecarError::unreachable))
            .boxed();
        Ok(RelayedStream {
            status,
            content_type: upstream_type,
            body,
        })
    }

    async fn open_file_watch(&self, address: &WorkspaceAddress) -> SidecarResult<UpstreamSocket> {
        let url = address.url("ws", self.settings.files_port, "/files/watch");
        let mut request = url.into_client_request().map_err(SidecarError::protocol)?;
        if let Some(secret) = self.settings.shared_secret.as_deref() {
            let value =
                HeaderValue::from_str(&format!("Bearer {secret}")).map_err(SidecarError::protocol)?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let (socket, _) = tokio::time::timeout(
            self.settings.timeout,
            tokio_tungstenite::connect_async(request),
        )
        .await
        .map_err(SidecarError::unreachable)?
        .map_err(SidecarError::unreachable)?;
        let (sink, stream) = socket.split();

        let sink = sink
            .sink_map_err(SidecarError::unreachable)
            .with(|frame: Frame| future::ready(Ok::<_, SidecarError>(tungstenite::Message::from(frame))));
        let stream = stream
            .map(|message| message.map(Frame::from).map_err(SidecarError::unreachable))
            .boxed();
        Ok(UpstreamSocket {
            sink: Box::pin(sink),
            stream,
        })
    }
}
