//! Router actor message types.

use thiserror::Error;
use tokio::sync::oneshot;

use super::session::{ConnectionKey, Role};
use crate::{
    game::{GameError, Phase, entities::{ClientId, Score}},
    net::{
        errors::ProtocolError,
        messages::{Action, ServerMessage},
        transport::Channel,
    },
};

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("no client with ID {0}")]
    UnknownDestination(ClientId),
    #[error("all {max} client IDs are taken")]
    CapacityReached { max: u16 },
    #[error("only the authority can do that")]
    NotAuthority,
    #[error("this process has no seat")]
    NoLocalSeat,
    #[error("no game in progress")]
    NoGame,
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("router is closed")]
    Closed,
}

/// Messages that can be sent to a Router
#[derive(Debug)]
pub enum RouterMessage {
    /// Register a freshly opened connection
    AddConnection {
        channel: Channel,
        response: oneshot::Sender<Result<ClientId, RouterError>>,
    },

    /// A connection closed or failed
    RemoveConnection { key: ConnectionKey, reason: String },

    /// A frame arrived on a connection
    Dispatch { key: ConnectionKey, frame: Vec<u8> },

    /// Send a message to one client
    Send {
        message: ServerMessage,
        to: ClientId,
        response: oneshot::Sender<Result<(), RouterError>>,
    },

    /// Send a message to every client but the authority
    SendAll { message: ServerMessage },

    /// An action from this process's own player
    Submit {
        action: Action,
        response: oneshot::Sender<Result<(), RouterError>>,
    },

    /// Seat every connected client in a new game
    StartGame {
        response: oneshot::Sender<Result<(), RouterError>>,
    },

    /// Number of open connections to other processes
    Connected { response: oneshot::Sender<usize> },

    /// Current session state
    Snapshot {
        response: oneshot::Sender<SessionSnapshot>,
    },

    /// Close every connection and stop
    Shutdown,
}

/// Notifications for the presentation layer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionEvent {
    /// A message for this process's own player.
    Message(ServerMessage),
    /// The authority told this participant who it is.
    AssignedId(ClientId),
    /// A connection was accepted and assigned `id`.
    Connected { id: ClientId, connected: usize },
    /// A client's connection ended. Its seat, if any, is gone.
    PeerLost { id: ClientId, connected: usize },
    /// The connection to the authority ended. The session was reset.
    AuthorityLost,
    /// Something worth showing a user that isn't a game message.
    Notice(String),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionSnapshot {
    pub role: Role,
    pub own_id: Option<ClientId>,
    pub clients: Vec<ClientId>,
    pub scores: Vec<(ClientId, Score)>,
    pub phase: Option<Phase>,
}
