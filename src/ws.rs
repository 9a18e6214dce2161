//! Transport-neutral WebSocket frames.
//!
//! Both the interaction hub and the sidecar bridge operate on [`Frame`]
//! values so their pumps can be driven by any stream/sink pair. The HTTP
//! boundary converts from axum messages and the sidecar adapter converts
//! from `tokio-tungstenite` messages.

use axum::body::Bytes;

/// A single WebSocket frame stripped of transport-specific framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text payload.
    Text(String),
    /// Binary payload.
    Binary(Bytes),
    /// Ping control frame.
    Ping(Bytes),
    /// Pong control frame.
    Pong(Bytes),
    /// Close control frame.
    Close,
}

impl Frame {
    /// Returns `true` for close frames.
    #[must_use]
    pub const fn is_close(&self) -> bool {
        matches!(self, Self::Close)
    }

    /// Builds a text frame from anything string-like.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

impl From<axum::extract::ws::Message> for Frame {
    fn from(message: axum::extract::ws::Message) -> Self {
        use axum::extract::ws::Message;
        match message {
            Message::Text(text) => Self::Text(text.as_str().to_owned()),
            Message::Binary(data) => Self::Binary(data),
            Message::Ping(data) => Self::Ping(data),
            Message::Pong(data) => Self::Pong(data),
            Message::Close(_) => Self::Close,
        }
    }
}

impl From<Frame> for axum::extract::ws::Message {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Text(text) => Self::Text(text.into()),
            Frame::Binary(data) => Self::Binary(data),
            Frame::Ping(data) => Self::Ping(data),
            Frame::Pong(data) => Self::Pong(data),
            Frame::Close => Self::Close(None),
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Message> for Frame {
    fn from(message: tokio_tungstenite::tungstenite::Message) -> Self {
        use tokio_tungstenite::tungstenite::Message;
        match message {
            Message::Text(text) => Self::Text(text),
            Message::Binary(data) => Self::Binary(Bytes::from(data)),
            Message::Ping(data) => Self::Ping(Bytes::from(data)),
            Message::Pong(data) => Self::Pong(Bytes::from(data)),
            // Raw frames never surface when reading.
            Message::Close(_) | Message::Frame(_) => Self::Close,
        }
    }
}

impl From<Frame> for tokio_tungstenite::tungstenite::Message {
    fn from(frame: Frame) -> Self {
        match frame {
            Frame::Text(text) => Self::Text(text),
            Frame::Binary(data) => Self::Binary(data.to_vec()),
            Frame::Ping(data) => Self::Ping(data.to_vec()),
            Frame::Pong(data) => Self::Pong(data.to_vec()),
            Frame::Close => Self::Close(None),
        }
    }
}
