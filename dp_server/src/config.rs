//! Server configuration management.
//!
//! Consolidates command line flags and environment variables into one
//! validated configuration. Flags win over the environment, which wins over
//! the defaults.

use draw_poker::{
    DealPolicy, GameSettings, MAX_PLAYERS, RouterSettings,
    net::framing::{Framing, MAX_FRAME_SIZE},
    router::{DEFAULT_MAX_CLIENTS, DEFAULT_QUEUE_CAPACITY},
    transport::{
        stream::StreamSettings,
        websocket::{DEFAULT_BASE_PORT, WsSettings},
    },
};
use std::{net::SocketAddr, str::FromStr};

/// Which transport the host listens with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HostTransport {
    WebSocket,
    Stream,
}

impl FromStr for HostTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ws" | "websocket" => Ok(Self::WebSocket),
            "stream" | "tcp" => Ok(Self::Stream),
            other => Err(format!("unknown transport '{other}'")),
        }
    }
}

/// Values given on the command line. Anything left `None` falls back to the
/// environment.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub transport: Option<HostTransport>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub players: Option<usize>,
    pub headless: bool,
    pub host_deals: bool,
    pub metrics_bind: Option<SocketAddr>,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub transport: HostTransport,
    /// Interface to listen on
    pub host: String,
    /// First port to try for WebSocket, exact port for streams
    pub port: u16,
    pub framing: Framing,
    pub max_frame_size: usize,
    /// Seated players (including the host's own seat) to wait for before
    /// starting a game
    pub players: usize,
    /// Run without a local seat
    pub headless: bool,
    pub deal_policy: DealPolicy,
    pub max_clients: u16,
    pub queue_capacity: usize,
    /// Prometheus scrape endpoint, if any
    pub metrics_bind: Option<SocketAddr>,
}

impl ServerConfig {
    /// Load configuration from the command line and environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_env(cli: CliOverrides) -> Result<Self, ConfigError> {
        let transport = match cli.transport {
            Some(transport) => transport,
            None => parse_env("DP_TRANSPORT")?.unwrap_or(HostTransport::WebSocket),
        };
        let host = cli
            .host
            .or_else(|| std::env::var("DP_HOST").ok())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match cli.port {
            Some(port) => port,
            None => parse_env("DP_PORT")?.unwrap_or(DEFAULT_BASE_PORT),
        };
        let players = match cli.players {
            Some(players) => players,
            None => parse_env("DP_PLAYERS")?.unwrap_or(2),
        };
        let metrics_bind = match cli.metrics_bind {
            Some(addr) => Some(addr),
            None => parse_env("DP_METRICS_BIND")?,
        };
        let host_deals = cli.host_deals || parse_env("DP_HOST_DEALS")?.unwrap_or(false);

        Ok(ServerConfig {
            transport,
            host,
            port,
            framing: parse_env("DP_FRAMING")?.unwrap_or(Framing::NulTerminated),
            max_frame_size: parse_env("DP_MAX_FRAME_SIZE")?.unwrap_or(MAX_FRAME_SIZE),
            players,
            headless: cli.headless || parse_env("DP_HEADLESS")?.unwrap_or(false),
            deal_policy: if host_deals {
                DealPolicy::HostOnly
            } else {
                DealPolicy::Anyone
            },
            max_clients: parse_env("DP_MAX_CLIENTS")?.unwrap_or(DEFAULT_MAX_CLIENTS),
            queue_capacity: parse_env("DP_QUEUE_CAPACITY")?.unwrap_or(DEFAULT_QUEUE_CAPACITY),
            metrics_bind,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let min_players = if self.headless { 1 } else { 2 };
        if self.players < min_players {
            return Err(ConfigError::Invalid {
                var: "DP_PLAYERS".to_string(),
                reason: format!("Must be at least {min_players}"),
            });
        }

        if self.players > MAX_PLAYERS {
            return Err(ConfigError::Invalid {
                var: "DP_PLAYERS".to_string(),
                reason: format!("Must be at most {MAX_PLAYERS} (max players with 52-card deck)"),
            });
        }

        if usize::from(self.max_clients) <= self.players {
            return Err(ConfigError::Invalid {
                var: "DP_MAX_CLIENTS".to_string(),
                reason: format!("Must be greater than the player count ({})", self.players),
            });
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                var: "DP_QUEUE_CAPACITY".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.max_frame_size == 0 {
            return Err(ConfigError::Invalid {
                var: "DP_MAX_FRAME_SIZE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingRequired {
                var: "DP_HOST".to_string(),
                hint: "Set an interface to listen on, such as 0.0.0.0".to_string(),
            });
        }

        Ok(())
    }

    /// Remote connections needed before a game starts.
    #[must_use]
    pub fn remote_players(&self) -> usize {
        if self.headless {
            self.players
        } else {
            self.players - 1
        }
    }

    #[must_use]
    pub fn router_settings(&self) -> RouterSettings {
        RouterSettings {
            max_clients: self.max_clients,
            queue_capacity: self.queue_capacity,
            game: GameSettings {
                deal_policy: self.deal_policy,
            },
        }
    }

    #[must_use]
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            framing: self.framing,
            max_frame_size: self.max_frame_size,
        }
    }

    #[must_use]
    pub fn ws_settings(&self) -> WsSettings {
        WsSettings {
            max_message_size: self.max_frame_size,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse an optional environment variable, rejecting values that
/// are set but malformed
fn parse_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.parse().map(Some).map_err(|e| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{value}': {e}"),
        }),
        Err(_) => Ok(None),
    }
}
