//! File and stream relay.

use super::{SidecarError, SidecarResult};
use crate::session::domain::SessionId;
use crate::sidecar::domain::{FileRequest, RelayResponse};
use crate::workspace::domain::WorkspaceAddress;
use crate::ws::Frame;
use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use futures::Sink;
use std::pin::Pin;

/// Chunked upstream body.
pub type ByteStream = BoxStream<'static, SidecarResult<Bytes>>;

/// Frames received from an upstream socket.
pub type FrameStream = BoxStream<'static, SidecarResult<Frame>>;

/// Frames sent to an upstream socket.
pub type FrameSink = Pin<Box<dyn Sink<Frame, Error = SidecarError> + Send>>;

/// Streaming upstream response whose body is relayed unchanged.
pub struct RelayedStream {
    /// Upstream status code.
    pub status: u16,
    /// Upstream content type.
    pub content_type: Option<String>,
    /// Upstream body chunks.
    pub body: ByteStream,
}

impl std::fmt::Debug for RelayedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayedStream")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Both halves of an upstream WebSocket.
pub struct UpstreamSocket {
    /// Outbound half.
    pub sink: FrameSink,
    /// Inbound half.
    pub stream: FrameStream,
}

impl std::fmt::Debug for UpstreamSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamSocket").finish_non_exhaustive()
    }
}

/// Forwards file operations and streams to a workspace.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SidecarRelay: Send + Sync {
    /// Forwards one file operation and returns the upstream response.
    async fn forward(
        &self,
        address: &WorkspaceAddress,
        request: &FileRequest,
    ) -> SidecarResult<RelayResponse>;

    /// Opens the event stream of one agent session.
    ///
    /// `last_event_id` is forwarded so the agent can resume after it.
    async fn open_output_stream(
        &self,
        address: &WorkspaceAddress,
        session_id: SessionId,
        last_event_id: Option<String>,
    ) -> SidecarResult<RelayedStream>;

    /// Opens the file-change WebSocket.
    async fn open_file_watch(&self, address: &WorkspaceAddress) -> SidecarResult<UpstreamSocket>;
}
