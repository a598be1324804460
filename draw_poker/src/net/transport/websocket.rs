//! Text-message connections over WebSocket.
//!
//! The host listens on the first free port at or above a base port, so
//! several hosts can share a machine without configuration.

use async_trait::async_trait;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use log::{debug, info};
use std::{
    io,
    net::{SocketAddr, UdpSocket},
};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, accept_async_with_config, connect_async_with_config,
    tungstenite::{Message, protocol::WebSocketConfig},
};

use super::{Channel, FrameSink, FrameSource};
use crate::net::{errors::TransportError, framing::MAX_FRAME_SIZE};

/// Where port probing starts when nothing else is configured.
pub const DEFAULT_BASE_PORT: u16 = 8000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WsSettings {
    /// Largest message accepted from the other side.
    pub max_message_size: usize,
}

impl Default for WsSettings {
    fn default() -> Self {
        Self {
            max_message_size: MAX_FRAME_SIZE,
        }
    }
}

impl WsSettings {
    fn config(self) -> WebSocketConfig {
        WebSocketConfig::default()
            .max_message_size(Some(self.max_message_size))
            .max_frame_size(Some(self.max_message_size))
    }
}

pub struct WsSink<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
    closed: bool,
}

pub struct WsSource<S> {
    stream: SplitStream<WebSocketStream<S>>,
}

#[async_trait]
impl<S> FrameSink for WsSink<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let text = String::from_utf8(frame)
            .map_err(|err| TransportError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))?;
        self.sink.send(Message::text(text)).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if !self.closed {
            self.closed = true;
            self.sink.close().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S> FrameSource for WsSource<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        while let Some(msg) = self.stream.next().await {
            match msg? {
                Message::Text(text) => return Ok(Some(text.as_bytes().to_vec())),
                Message::Binary(bytes) => return Ok(Some(bytes.to_vec())),
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
        Ok(None)
    }
}

fn channel<S>(stream: WebSocketStream<S>, peer: String) -> Channel
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let (sink, stream) = stream.split();
    Channel::new(
        peer,
        WsSink {
            sink,
            closed: false,
        },
        WsSource { stream },
    )
}

pub struct WsListener {
    listener: TcpListener,
    port: u16,
    settings: WsSettings,
}

impl WsListener {
    /// Bind `host` on `base_port`, moving up one port at a time while the
    /// port is taken. Port 0 asks the OS for any free port.
    pub async fn bind_probing(
        host: &str,
        base_port: u16,
        settings: WsSettings,
    ) -> Result<Self, TransportError> {
        if base_port == 0 {
            return Self::bind_exact(host, 0, settings).await;
        }
        for port in base_port..=u16::MAX {
            match Self::bind_exact(host, port, settings).await {
                Ok(listener) => return Ok(listener),
                Err(TransportError::Bind { source, .. })
                    if matches!(
                        source.kind(),
                        io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied
                    ) =>
                {
                    debug!("Port {port} unavailable, trying the next one");
                }
                Err(err) => return Err(err),
            }
        }
        Err(TransportError::NoFreePort {
            first: base_port,
            last: u16::MAX,
        })
    }

    async fn bind_exact(
        host: &str,
        port: u16,
        settings: WsSettings,
    ) -> Result<Self, TransportError> {
        let addr = format!("{host}:{port}");
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        let port = listener.local_addr()?.port();
        info!("WebSocket listener bound to port {port}");
        Ok(Self {
            listener,
            port,
            settings,
        })
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn settings(&self) -> WsSettings {
        self.settings
    }

    /// Accept a raw TCP connection without running the handshake, so the
    /// accept loop never waits on a slow client.
    pub async fn accept_stream(&self) -> Result<(TcpStream, SocketAddr), TransportError> {
        Ok(self.listener.accept().await?)
    }

    /// Run the server side of the WebSocket handshake.
    pub async fn upgrade(
        stream: TcpStream,
        addr: SocketAddr,
        settings: WsSettings,
    ) -> Result<Channel, TransportError> {
        let ws = accept_async_with_config(stream, Some(settings.config())).await?;
        debug!("WebSocket handshake with {addr} complete");
        Ok(channel(ws, addr.to_string()))
    }

    pub async fn accept(&self) -> Result<Channel, TransportError> {
        let (stream, addr) = self.accept_stream().await?;
        Self::upgrade(stream, addr, self.settings).await
    }
}

/// Connect to a host given as `host[:port]`.
pub async fn connect(addr: &str, settings: WsSettings) -> Result<Channel, TransportError> {
    let url = if addr.starts_with("ws://") || addr.starts_with("wss://") {
        addr.to_string()
    } else {
        format!("ws://{addr}")
    };
    let (ws, _): (WebSocketStream<MaybeTlsStream<TcpStream>>, _) =
        connect_async_with_config(url.as_str(), Some(settings.config()), false)
            .await
            .map_err(|err| match err {
                tokio_tungstenite::tungstenite::Error::Io(source) => TransportError::Connect {
                    addr: addr.to_string(),
                    source,
                },
                other => TransportError::WebSocket(other),
            })?;
    info!("Connected to {url}");
    Ok(channel(ws, addr.to_string()))
}

/// Best guess at this machine's LAN address, for telling players where to
/// connect. Falls back to `localhost`.
#[must_use]
pub fn local_ip() -> String {
    let lookup = || -> io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_broadcast(true)?;
        socket.connect("10.255.255.255:1")?;
        Ok(socket.local_addr()?.ip().to_string())
    };
    lookup().unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_probing_skips_taken_port() {
        let first = WsListener::bind_probing("127.0.0.1", 0, WsSettings::default())
            .await
            .unwrap();
        let taken = first.port();
        let second = WsListener::bind_probing("127.0.0.1", taken, WsSettings::default())
            .await
            .unwrap();
        assert!(second.port() > taken);
    }

    #[tokio::test]
    async fn test_oversized_message_is_rejected() {
        let settings = WsSettings {
            max_message_size: 64,
        };
        let listener = WsListener::bind_probing("127.0.0.1", 0, settings)
            .await
            .unwrap();
        let port = listener.port();
        let server = tokio::spawn(async move {
            let mut channel = listener.accept().await.unwrap();
            channel.source.recv().await
        });

        let mut client = connect(&format!("127.0.0.1:{port}"), WsSettings::default())
            .await
            .unwrap();
        client.sink.send(vec![b'x'; 1024]).await.unwrap();

        assert!(server.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_message_within_limit_arrives() {
        let listener = WsListener::bind_probing("127.0.0.1", 0, WsSettings::default())
            .await
            .unwrap();
        let port = listener.port();
        let server = tokio::spawn(async move {
            let mut channel = listener.accept().await.unwrap();
            channel.source.recv().await
        });

        let mut client = connect(&format!("127.0.0.1:{port}"), WsSettings::default())
            .await
            .unwrap();
        client.sink.send(b"{\"action\":\"deal\"}".to_vec()).await.unwrap();

        assert_eq!(
            server.await.unwrap().unwrap(),
            Some(br#"{"action":"deal"}"#.to_vec())
        );
    }

    #[test]
    fn test_local_ip_is_never_empty() {
        assert!(!local_ip().is_empty());
    }
}
