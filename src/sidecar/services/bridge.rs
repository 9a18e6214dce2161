//! Bidirectional frame relay between a client socket and an upstream one.

use crate::ws::Frame;
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::fmt::Display;
use tokio_util::sync::CancellationToken;

/// Why one direction of a bridge stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpExit {
    /// The source ended or sent a close frame.
    SourceClosed,
    /// Reading from the source failed.
    SourceFailed,
    /// Writing to the sink failed.
    SinkFailed,
    /// The other direction stopped, or the caller cancelled.
    Cancelled,
}

/// How both directions of a bridge ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOutcome {
    /// Client to upstream direction.
    pub to_upstream: PumpExit,
    /// Upstream to client direction.
    pub to_client: PumpExit,
}

/// Copies frames from `source` into `sink` until either side ends or
/// `token` fires, then fires `token` and closes `sink`.
async fn pump<S, K, SE, KE>(mut source: S, mut sink: K, token: CancellationToken) -> PumpExit
where
    S: Stream<Item = Result<Frame, SE>> + Unpin,
    K: Sink<Frame, Error = KE> + Unpin,
    SE: Display,
    KE: Display,
{
    let exit = loop {
        tokio::select! {
            () = token.cancelled() => break PumpExit::Cancelled,
            next = source.next() => match next {
                Some(Ok(frame)) => {
                    let closing = frame.is_close();
                    if let Err(err) = sink.send(frame).await {
                        tracing::debug!(error = %err, "bridge sink rejected frame");
                        break PumpExit::SinkFailed;
                    }
                    if closing {
                        break PumpExit::SourceClosed;
                    }
                }
                Some(Err(err)) => {
                    tracing::debug!(error = %err, "bridge source failed");
                    break PumpExit::SourceFailed;
                }
                None => break PumpExit::SourceClosed,
            },
        }
    };

    token.cancel();
    if let Err(err) = sink.close().await {
        tracing::debug!(error = %err, "bridge sink did not close cleanly");
    }
    exit
}

/// Relays frames both ways until one side closes.
///
/// Each direction runs as its own pump. Whichever stops first fires a
/// shared token so the other stops too, and both sinks are closed before
/// this returns. Cancelling `cancel` tears the bridge down from outside.
pub async fn bridge<CK, CS, UK, US, E1, E2, E3, E4>(
    client: (CK, CS),
    upstream: (UK, US),
    cancel: &CancellationToken,
) -> BridgeOutcome
where
    CK: Sink<Frame, Error = E1> + Unpin,
    CS: Stream<Item = Result<Frame, E2>> + Unpin,
    UK: Sink<Frame, Error = E3> + Unpin,
    US: Stream<Item = Result<Frame, E4>> + Unpin,
    E1: Display,
    E2: Display,
    E3: Display,
    E4: Display,
{
    let (client_sink, client_stream) = client;
    let (upstream_sink, upstream_stream) = upstream;
    let token = cancel.child_token();

    let (to_upstream, to_client) = tokio::join!(
        pump(client_stream, upstream_sink, token.clone()),
        pump(upstream_stream, client_sink, token),
    );
    BridgeOutcome {
        to_upstream,
        to_client,
    }
}
