//! Scriptable in-memory stand-in for the in-pod API.

use crate::session::domain::SessionId;
use crate::sidecar::{
    domain::{FileRequest, RelayResponse, RunAcknowledgement, RunRequest},
    ports::{
        AgentRunner, RelayedStream, SidecarError, SidecarRelay, SidecarResult, UpstreamSocket,
    },
};
use crate::workspace::domain::WorkspaceAddress;
use crate::ws::Frame;
use async_trait::async_trait;
use axum::body::Bytes;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt, stream};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Far end of a file-watch socket opened against [`InMemorySidecar`].
#[derive(Debug)]
pub struct WatchPeer {
    /// Pushes frames towards the connected client.
    pub to_client: mpsc::UnboundedSender<Frame>,
    /// Receives frames the client sent upstream.
    pub from_client: mpsc::UnboundedReceiver<Frame>,
}

/// In-memory sidecar that records every call.
///
/// Responses and failures are scripted up front so callers can exercise
/// relay, stop, and dispatch paths without a workspace.
#[derive(Debug, Clone, Default)]
pub struct InMemorySidecar {
    state: Arc<Mutex<InMemorySidecarState>>,
}

#[derive(Debug, Default)]
struct InMemorySidecarState {
    runs: Vec<(WorkspaceAddress, RunRequest)>,
    stops: Vec<SessionId>,
    forwards: Vec<FileRequest>,
    stream_opens: Vec<(SessionId, Option<String>)>,
    run_failure: Option<SidecarError>,
    stop_failure: Option<SidecarError>,
    remote_session_id: Option<String>,
    file_response: Option<RelayResponse>,
    output_chunks: Vec<Bytes>,
    hold_output_open: bool,
    watch_peers: Vec<WatchPeer>,
}

impl InMemorySidecar {
    /// Creates a sidecar that accepts every call.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemorySidecarState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every subsequent run request fail with `error`.
    pub fn fail_runs(&self, error: SidecarError) {
        self.state().run_failure = Some(error);
    }

    /// Makes every subsequent stop request fail with `error`.
    pub fn fail_stops(&self, error: SidecarError) {
        self.state().stop_failure = Some(error);
    }

    /// Sets the identifier returned in run acknowledgements.
    pub fn acknowledge_with(&self, remote_session_id: impl Into<String>) {
        self.state().remote_session_id = Some(remote_session_id.into());
    }

    /// Sets the response returned for file operations.
    pub fn respond_to_files(&self, response: RelayResponse) {
        self.state().file_response = Some(response);
    }

    /// Sets the chunks served on output streams.
    ///
    /// With `hold_open`, the stream stays pending after the last chunk
    /// instead of ending.
    pub fn serve_output(&self, chunks: Vec<Bytes>, hold_open: bool) {
        let mut state = self.state();
        state.output_chunks = chunks;
        state.hold_output_open = hold_open;
    }

    /// Returns recorded run requests.
    #[must_use]
    pub fn runs(&self) -> Vec<RunRequest> {
        self.state()
            .runs
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Returns the addresses runs were sent to.
    #[must_use]
    pub fn run_addresses(&self) -> Vec<WorkspaceAddress> {
        self.state()
            .runs
            .iter()
            .map(|(address, _)| address.clone())
            .collect()
    }

    /// Returns recorded stop requests.
    #[must_use]
    pub fn stops(&self) -> Vec<SessionId> {
        self.state().stops.clone()
    }

    /// Returns recorded file operations.
    #[must_use]
    pub fn forwards(&self) -> Vec<FileRequest> {
        self.state().forwards.clone()
    }

    /// Returns recorded output stream openings with their checkpoints.
    #[must_use]
    pub fn stream_opens(&self) -> Vec<(SessionId, Option<String>)> {
        self.state().stream_opens.clone()
    }

    /// Takes the far end of the oldest unclaimed file-watch socket.
    #[must_use]
    pub fn take_watch_peer(&self) -> Option<WatchPeer> {
        let mut state = self.state();
        if state.watch_peers.is_empty() {
            None
        } else {
            Some(state.watch_peers.remove(0))
        }
    }
}

#[async_trait]
impl AgentRunner for InMemorySidecar {
    async fn start_run(
        &self,
        address: &WorkspaceAddress,
        request: &RunRequest,
    ) -> SidecarResult<RunAcknowledgement> {
        let mut state = self.state();
        state.runs.push((address.clone(), request.clone()));
        if let Some(error) = state.run_failure.clone() {
            return Err(error);
        }
        Ok(RunAcknowledgement {
            remote_session_id: state.remote_session_id.clone(),
        })
    }

    async fn stop_run(
        &self,
        _address: &WorkspaceAddress,
        session_id: SessionId,
    ) -> SidecarResult<()> {
        let mut state = self.state();
        state.stops.push(session_id);
        state.stop_failure.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl SidecarRelay for InMemorySidecar {
    async fn forward(
        &self,
        _address: &WorkspaceAddress,
        request: &FileRequest,
    ) -> SidecarResult<RelayResponse> {
        let mut state = self.state();
        state.forwards.push(request.clone());
        Ok(state.file_response.clone().unwrap_or_else(|| RelayResponse {
            status: 200,
            content_type: Some("application/json".to_owned()),
            body: Bytes::from_static(b"{}"),
        }))
    }

    async fn open_output_stream(
        &self,
        _address: &WorkspaceAddress,
        session_id: SessionId,
        last_event_id: Option<String>,
    ) -> SidecarResult<RelayedStream> {
        let mut state = self.state();
        state.stream_opens.push((session_id, last_event_id));
        let chunks = stream::iter(state.output_chunks.clone().into_iter().map(Ok));
        let body = if state.hold_output_open {
            chunks.chain(stream::pending()).boxed()
        } else {
            chunks.boxed()
        };
        Ok(RelayedStream {
            status: 200,
            content_type: Some("text/event-stream".to_owned()),
            body,
        })
    }

    async fn open_file_watch(&self, _address: &WorkspaceAddress) -> SidecarResult<UpstreamSocket> {
        let (to_client, client_inbox) = mpsc::unbounded();
        let (client_outbox, from_client) = mpsc::unbounded();
        self.state().watch_peers.push(WatchPeer {
            to_client,
            from_client,
        });
        Ok(UpstreamSocket {
            sink: Box::pin(client_outbox.sink_map_err(SidecarError::unreachable)),
            stream: client_inbox.map(Ok).boxed(),
        })
    }
}
