//! Accepting participants and handing them to the router.

use crate::{
    config::{HostTransport, ServerConfig},
    metrics,
};
use draw_poker::{
    RouterError, RouterHandle,
    net::errors::TransportError,
    transport::{Channel, stream::StreamListener, websocket::WsListener},
};
use log::{debug, warn};

/// The host's listening socket, whichever transport it speaks.
pub enum HostListener {
    WebSocket(WsListener),
    Stream(StreamListener),
}

impl HostListener {
    pub async fn bind(config: &ServerConfig) -> Result<Self, TransportError> {
        match config.transport {
            HostTransport::WebSocket => Ok(Self::WebSocket(
                WsListener::bind_probing(&config.host, config.port, config.ws_settings()).await?,
            )),
            HostTransport::Stream => Ok(Self::Stream(
                StreamListener::bind(&config.host, Some(config.port), config.stream_settings())
                    .await?,
            )),
        }
    }

    pub fn port(&self) -> Result<u16, TransportError> {
        match self {
            Self::WebSocket(listener) => Ok(listener.port()),
            Self::Stream(listener) => Ok(listener.local_addr()?.port()),
        }
    }

    /// Accept connections until the router goes away.
    ///
    /// WebSocket handshakes run in their own task so a slow client can't
    /// hold up the next accept.
    pub async fn serve(self, router: RouterHandle) {
        loop {
            let handle = router.clone();
            match &self {
                Self::WebSocket(listener) => match listener.accept_stream().await {
                    Ok((stream, addr)) => {
                        let settings = listener.settings();
                        tokio::spawn(async move {
                            match WsListener::upgrade(stream, addr, settings).await {
                                Ok(channel) => admit(&handle, channel).await,
                                Err(err) => {
                                    metrics::connections_rejected_total("handshake");
                                    warn!("WebSocket handshake with {addr} failed: {err}");
                                }
                            }
                        });
                    }
                    Err(err) => warn!("Accept failed: {err}"),
                },
                Self::Stream(listener) => match listener.accept().await {
                    Ok(channel) => {
                        tokio::spawn(async move { admit(&handle, channel).await });
                    }
                    Err(err) => warn!("Accept failed: {err}"),
                },
            }
            if router.is_closed() {
                debug!("Router stopped, no longer accepting");
                return;
            }
        }
    }
}

async fn admit(router: &RouterHandle, channel: Channel) {
    let peer = channel.peer.clone();
    match router.add_connection(channel).await {
        Ok(id) => {
            metrics::connections_total();
            debug!("{peer} admitted as {id}");
        }
        Err(RouterError::CapacityReached { max }) => {
            metrics::connections_rejected_total("capacity");
            warn!("Turned away {peer}: all {max} client slots are taken");
        }
        Err(err) => warn!("Could not admit {peer}: {err}"),
    }
}
