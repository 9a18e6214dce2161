//! Read/write loop of one interaction connection.

use super::hub::ConnectionId;
use super::service::{InteractionService, InteractionServiceError};
use crate::interaction::{
    domain::{ClientCommand, Interaction, InteractionId, MessageFrame, ServerFrame},
    ports::InteractionRepository,
};
use crate::task::domain::TaskId;
use crate::workspace::domain::UserId;
use crate::ws::Frame;
use axum::body::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use mockable::Clock;
use std::collections::HashSet;
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

/// Timing and buffering of interaction connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionSettings {
    /// Interval between server pings.
    pub heartbeat: Duration,
    /// Idle time after which a silent client is dropped.
    pub read_timeout: Duration,
    /// Frames buffered per connection before broadcasts are dropped.
    pub outbox_capacity: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_secs(30),
            read_timeout: Duration::from_secs(300),
            outbox_capacity: 64,
        }
    }
}

/// Why a connection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEnd {
    /// The client closed the socket.
    ClientClosed,
    /// The client stayed silent past the read deadline.
    ReadTimeout,
    /// Writing to the client failed.
    SendFailed,
    /// Reading from the client failed.
    ReceiveFailed,
    /// History could not be loaded.
    HistoryUnavailable,
    /// The hub evicted the connection because its outbox was full.
    Evicted,
}

/// Serves one interaction connection until it ends.
///
/// The connection is registered with the hub before history is loaded, so
/// no broadcast can fall between the two. History goes out as a single
/// batch first; live frames already contained in it are skipped.
pub async fn serve_connection<R, C, K, S, E1, E2>(
    service: &InteractionService<R, C>,
    task_id: TaskId,
    user_id: UserId,
    mut sink: K,
    mut stream: S,
    settings: ConnectionSettings,
) -> ConnectionEnd
where
    R: InteractionRepository + ?Sized,
    C: Clock + Send + Sync,
    K: Sink<Frame, Error = E1> + Unpin,
    S: Stream<Item = Result<Frame, E2>> + Unpin,
    E1: Display,
    E2: Display,
{
    let connection_id = ConnectionId::new();
    let (outbox, mut inbox) = mpsc::channel(settings.outbox_capacity.max(1));
    service.hub().register(task_id, connection_id, outbox);
    tracing::info!(task_id = %task_id, connection_id = %connection_id, "interaction connection opened");

    let mut connection = Connection {
        service,
        task_id,
        user_id,
        sink: &mut sink,
    };
    let end = connection.run(&mut stream, &mut inbox, settings).await;

    service.hub().unregister(task_id, connection_id);
    if let Err(err) = sink.close().await {
        tracing::debug!(error = %err, "interaction socket did not close cleanly");
    }
    tracing::info!(
        task_id = %task_id,
        connection_id = %connection_id,
        reason = ?end,
        "interaction connection closed"
    );
    end
}

struct Connection<'a, R, C, K>
where
    R: InteractionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    service: &'a InteractionService<R, C>,
    task_id: TaskId,
    user_id: UserId,
    sink: &'a mut K,
}

impl<R, C, K, E1> Connection<'_, R, C, K>
where
    R: InteractionRepository + ?Sized,
    C: Clock + Send + Sync,
    K: Sink<Frame, Error = E1> + Unpin,
    E1: Display,
{
    async fn run<S, E2>(
        &mut self,
        stream: &mut S,
        inbox: &mut mpsc::Receiver<ServerFrame>,
        settings: ConnectionSettings,
    ) -> ConnectionEnd
    where
        S: Stream<Item = Result<Frame, E2>> + Unpin,
        E2: Display,
    {
        let history = match self.service.history(self.task_id).await {
            Ok(history) => history,
            Err(err) => {
                tracing::error!(task_id = %self.task_id, error = %err, "failed to load interaction history");
                self.send_error("failed to load history").await;
                return ConnectionEnd::HistoryUnavailable;
            }
        };
        let mut replayed: HashSet<InteractionId> = history.iter().map(Interaction::id).collect();
        if !self.deliver(&ServerFrame::history(&history)).await {
            return ConnectionEnd::SendFailed;
        }

        let mut heartbeat =
            tokio::time::interval_at(Instant::now() + settings.heartbeat, settings.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = tokio::time::sleep(settings.read_timeout);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                queued = inbox.recv() => {
                    let Some(frame) = queued else {
                        return ConnectionEnd::Evicted;
                    };
                    if frame.interaction_id().is_some_and(|id| replayed.remove(&id)) {
                        continue;
                    }
                    if !self.deliver(&frame).await {
                        return ConnectionEnd::SendFailed;
                    }
                }
                _ = heartbeat.tick() => {
                    if let Err(err) = self.sink.send(Frame::Ping(Bytes::new())).await {
                        tracing::debug!(error = %err, "heartbeat failed");
                        return ConnectionEnd::SendFailed;
                    }
                }
                () = &mut deadline => return ConnectionEnd::ReadTimeout,
                inbound = stream.next() => {
                    deadline.as_mut().reset(Instant::now() + settings.read_timeout);
                    if let Some(end) = self.on_inbound(inbound).await {
                        return end;
                    }
                }
            }
        }
    }

    /// Handles one read from the client. Returns the end reason when the
    /// connection should close.
    async fn on_inbound<E2: Display>(
        &mut self,
        inbound: Option<Result<Frame, E2>>,
    ) -> Option<ConnectionEnd> {
        let delivered = match inbound {
            Some(Ok(Frame::Text(text))) => self.handle_text(&text).await,
            Some(Ok(Frame::Binary(_))) => self.send_error("binary frames are not supported").await,
            Some(Ok(Frame::Ping(_) | Frame::Pong(_))) => true,
            Some(Ok(Frame::Close)) | None => return Some(ConnectionEnd::ClientClosed),
            Some(Err(err)) => {
                tracing::debug!(error = %err, "interaction socket read failed");
                return Some(ConnectionEnd::ReceiveFailed);
            }
        };
        (!delivered).then_some(ConnectionEnd::SendFailed)
    }

    /// Acts on one text frame. Returns `false` when the client is gone.
    async fn handle_text(&mut self, text: &str) -> bool {
        match ClientCommand::parse(text) {
            ClientCommand::UserMessage { content, metadata } => {
                match self
                    .service
                    .post_user_message(self.task_id, self.user_id, content, metadata)
                    .await
                {
                    // The hub echoes the stored message back through the outbox.
                    Ok(_) => true,
                    Err(InteractionServiceError::Domain(err)) => {
                        self.send_error(&err.to_string()).await
                    }
                    Err(err) => {
                        tracing::error!(task_id = %self.task_id, error = %err, "failed to store user message");
                        self.send_error("failed to save message").await
                    }
                }
            }
            ClientCommand::Unsupported(kind) => {
                self.send_error(&format!("unsupported message type: {kind}"))
                    .await
            }
            ClientCommand::Malformed => self.send_error("invalid message frame").await,
        }
    }

    async fn send_error(&mut self, message: &str) -> bool {
        let frame = MessageFrame::error(message, self.service.clock().utc());
        self.deliver(&ServerFrame::Message(frame)).await
    }

    async fn deliver(&mut self, frame: &ServerFrame) -> bool {
        let text = match frame.to_text() {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "failed to encode interaction frame");
                return true;
            }
        };
        match self.sink.send(Frame::Text(text)).await {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "interaction socket write failed");
                false
            }
        }
    }
}
