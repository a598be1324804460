//! Transports move opaque frames between two processes. The router only
//! ever sees a [`Channel`]: a sink it writes frames into and a source it
//! reads frames out of.

use async_trait::async_trait;

use super::errors::TransportError;

pub mod memory;
pub mod stream;
pub mod websocket;

#[async_trait]
pub trait FrameSink: Send {
    /// Send one frame. Frames arrive in the order they were sent.
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError>;

    /// Close the connection. Closing twice is a no-op.
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` once the peer closed the connection.
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

/// One open connection, split into its two directions.
pub struct Channel {
    /// Human readable name of the other end, for logs.
    pub peer: String,
    pub sink: Box<dyn FrameSink>,
    pub source: Box<dyn FrameSource>,
}

impl Channel {
    pub fn new(
        peer: impl Into<String>,
        sink: impl FrameSink + 'static,
        source: impl FrameSource + 'static,
    ) -> Self {
        Self {
            peer: peer.into(),
            sink: Box::new(sink),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn split(self) -> (String, Box<dyn FrameSink>, Box<dyn FrameSource>) {
        (self.peer, self.sink, self.source)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").field("peer", &self.peer).finish()
    }
}
