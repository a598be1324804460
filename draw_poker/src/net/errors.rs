//! Network error types for the message codec and the transports.

use std::io;

use thiserror::Error;

/// Errors that can occur while decoding or encoding a protocol message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame payload wasn't valid UTF-8 text
    #[error("frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Frame payload wasn't a JSON object with the expected field types
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame was well-formed but its set of fields matches no message
    #[error("unrecognized message shape: {0}")]
    UnrecognizedShape(String),
}

/// Errors raised by a transport while opening or using a connection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection closed")]
    Closed,

    #[error("unknown peer: {0}")]
    UnknownPeer(String),

    #[error("no free port in {first}..={last}")]
    NoFreePort { first: u16, last: u16 },
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
