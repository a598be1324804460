//! Byte-stream connections over TCP.
//!
//! Peers are usually picked by name from a directory of previously paired
//! hosts rather than typed in as addresses.

use async_trait::async_trait;
use log::{debug, info};
use std::{collections::BTreeMap, net::SocketAddr};
use tokio::{
    io::AsyncWriteExt,
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
};

use super::{Channel, FrameSink, FrameSource};
use crate::net::{
    errors::TransportError,
    framing::{FrameReader, Framing, MAX_FRAME_SIZE, write_frame},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StreamSettings {
    pub framing: Framing,
    pub max_frame_size: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            framing: Framing::NulTerminated,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

pub struct StreamSink {
    writer: Option<OwnedWriteHalf>,
    settings: StreamSettings,
}

pub struct StreamSource {
    reader: FrameReader<OwnedReadHalf>,
}

#[async_trait]
impl FrameSink for StreamSink {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::Closed)?;
        write_frame(
            writer,
            self.settings.framing,
            self.settings.max_frame_size,
            &frame,
        )
        .await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut writer) = self.writer.take() {
            writer.shutdown().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl FrameSource for StreamSource {
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.reader.read_frame().await?)
    }
}

fn channel(stream: TcpStream, peer: String, settings: StreamSettings) -> Channel {
    let (read_half, write_half) = stream.into_split();
    Channel::new(
        peer,
        StreamSink {
            writer: Some(write_half),
            settings,
        },
        StreamSource {
            reader: FrameReader::new(read_half, settings.framing, settings.max_frame_size),
        },
    )
}

pub struct StreamListener {
    listener: TcpListener,
    settings: StreamSettings,
}

impl StreamListener {
    /// Listen on `host:port`, or on an ephemeral port when `port` is `None`.
    pub async fn bind(
        host: &str,
        port: Option<u16>,
        settings: StreamSettings,
    ) -> Result<Self, TransportError> {
        let addr = format!("{host}:{}", port.unwrap_or(0));
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| TransportError::Bind { addr, source })?;
        info!("Stream listener bound to {}", listener.local_addr()?);
        Ok(Self { listener, settings })
    }

    pub async fn accept(&self) -> Result<Channel, TransportError> {
        let (stream, addr) = self.listener.accept().await?;
        debug!("Accepted stream connection from {addr}");
        Ok(channel(stream, addr.to_string(), self.settings))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }
}

pub async fn connect(addr: &str, settings: StreamSettings) -> Result<Channel, TransportError> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|source| TransportError::Connect {
            addr: addr.to_string(),
            source,
        })?;
    info!("Connected to {addr}");
    Ok(channel(stream, addr.to_string(), settings))
}

/// Previously paired peers, by name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PeerDirectory {
    peers: BTreeMap<String, String>,
}

impl PeerDirectory {
    /// Parse a comma separated list of `name=address` pairs. Blank entries
    /// are skipped.
    pub fn parse(list: &str) -> Result<Self, String> {
        let mut directory = Self::default();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, addr) = entry
                .split_once('=')
                .ok_or_else(|| format!("peer entry '{entry}' is not name=address"))?;
            let (name, addr) = (name.trim(), addr.trim());
            if name.is_empty() || addr.is_empty() {
                return Err(format!("peer entry '{entry}' is not name=address"));
            }
            directory.insert(name, addr);
        }
        Ok(directory)
    }

    pub fn insert(&mut self, name: &str, addr: &str) {
        self.peers.insert(name.to_string(), addr.to_string());
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.peers.keys().map(String::as_str)
    }

    #[must_use]
    pub fn address(&self, name: &str) -> Option<&str> {
        self.peers.get(name).map(String::as_str)
    }

    pub async fn connect_named(
        &self,
        name: &str,
        settings: StreamSettings,
    ) -> Result<Channel, TransportError> {
        let addr = self
            .address(name)
            .ok_or_else(|| TransportError::UnknownPeer(name.to_string()))?;
        let mut channel = connect(addr, settings).await?;
        channel.peer = name.to_string();
        Ok(channel)
    }
}
