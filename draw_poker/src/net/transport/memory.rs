//! In-process channels for tests and for embedding a client next to a host.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{Channel, FrameSink, FrameSource};
use crate::net::errors::TransportError;

pub struct MemorySink {
    sender: Option<mpsc::UnboundedSender<Vec<u8>>>,
}

pub struct MemorySource {
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let sender = self.sender.as_ref().ok_or(TransportError::Closed)?;
        sender.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sender = None;
        Ok(())
    }
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.receiver.recv().await)
    }
}

/// Two channels wired to each other.
#[must_use]
pub fn pair(left: &str, right: &str) -> (Channel, Channel) {
    let (left_tx, right_rx) = mpsc::unbounded_channel();
    let (right_tx, left_rx) = mpsc::unbounded_channel();
    let left_channel = Channel::new(
        right,
        MemorySink {
            sender: Some(left_tx),
        },
        MemorySource { receiver: left_rx },
    );
    let right_channel = Channel::new(
        left,
        MemorySink {
            sender: Some(right_tx),
        },
        MemorySource { receiver: right_rx },
    );
    (left_channel, right_channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_delivers_both_ways() {
        let (mut a, mut b) = pair("a", "b");
        assert_eq!(a.peer, "b");
        a.sink.send(b"ping".to_vec()).await.unwrap();
        assert_eq!(b.source.recv().await.unwrap(), Some(b"ping".to_vec()));
        b.sink.send(b"pong".to_vec()).await.unwrap();
        assert_eq!(a.source.recv().await.unwrap(), Some(b"pong".to_vec()));
    }

    #[tokio::test]
    async fn test_close_ends_the_other_side() {
        let (mut a, mut b) = pair("a", "b");
        a.sink.close().await.unwrap();
        assert_eq!(b.source.recv().await.unwrap(), None);
        assert!(matches!(
            a.sink.send(Vec::new()).await,
            Err(TransportError::Closed)
        ));
    }
}
