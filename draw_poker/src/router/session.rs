//! Per-process session state: who this process is, who it's connected to,
//! and the game in progress.

use std::{collections::BTreeMap, fmt};
use tokio::{sync::mpsc, task::AbortHandle};

use super::messages::RouterError;
use crate::game::{GameSettings, Poker, entities::ClientId};

/// Default size of the client ID space.
pub const DEFAULT_MAX_CLIENTS: u16 = 1000;

/// Default outbound frames buffered per connection.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// What this process is in the session. Fixed for the life of a router.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// Runs the engine. Unless headless, it also seats a local player.
    Authority { headless: bool },
    /// Connects to an authority and plays through it.
    Participant,
}

impl Role {
    #[must_use]
    pub fn is_authority(self) -> bool {
        matches!(self, Self::Authority { .. })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Authority { headless: true } => "headless authority",
            Self::Authority { headless: false } => "authority",
            Self::Participant => "participant",
        };
        write!(f, "{repr}")
    }
}

/// Identifies one accepted connection. Keys are never reused, unlike client
/// IDs, so a late frame from a dead connection can't be mistaken for one
/// from whoever took over its ID.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ConnectionKey(pub u64);

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Aborts a connection's reader task once its route is gone.
#[derive(Debug)]
pub struct ReaderGuard(pub AbortHandle);

impl Drop for ReaderGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Where messages for a client ID go.
#[derive(Debug)]
pub enum Route {
    /// The authority's own engine (ID 0 on the authority).
    Engine,
    /// The presentation layer of this process.
    Local,
    /// A connection to another process. Dropping the route closes the
    /// connection once queued frames are flushed.
    Remote {
        key: ConnectionKey,
        peer: String,
        queue: mpsc::Sender<Vec<u8>>,
        reader: ReaderGuard,
    },
}

#[derive(Debug)]
pub struct ClientTable {
    entries: BTreeMap<ClientId, Route>,
    max_clients: u16,
}

impl ClientTable {
    #[must_use]
    pub fn new(max_clients: u16) -> Self {
        Self {
            entries: BTreeMap::new(),
            max_clients,
        }
    }

    /// Smallest unused ID below the table's capacity.
    #[must_use]
    pub fn next_free(&self) -> Option<ClientId> {
        (0..self.max_clients)
            .map(ClientId)
            .find(|id| !self.entries.contains_key(id))
    }

    pub fn allocate(&mut self, route: Route) -> Result<ClientId, RouterError> {
        let id = self.next_free().ok_or(RouterError::CapacityReached {
            max: self.max_clients,
        })?;
        self.entries.insert(id, route);
        Ok(id)
    }

    pub fn remove(&mut self, id: ClientId) -> Option<Route> {
        self.entries.remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: ClientId) -> Option<&Route> {
        self.entries.get(&id)
    }

    #[must_use]
    pub fn id_of(&self, key: ConnectionKey) -> Option<ClientId> {
        self.entries.iter().find_map(|(id, route)| match route {
            Route::Remote { key: k, .. } if *k == key => Some(*id),
            _ => None,
        })
    }

    /// ID 0 always belongs to the authority: the engine on the authority
    /// itself, the host connection on a participant.
    #[must_use]
    pub fn is_authority(&self, id: ClientId) -> bool {
        id.is_authority() && self.entries.contains_key(&id)
    }

    /// Whether messages for `id` stay inside this process.
    #[must_use]
    pub fn is_loopback(&self, id: ClientId) -> bool {
        matches!(self.entries.get(&id), Some(Route::Engine | Route::Local))
    }

    pub fn ids(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.entries.keys().copied()
    }

    /// Number of open connections to other processes.
    #[must_use]
    pub fn remote_count(&self) -> usize {
        self.entries
            .values()
            .filter(|route| matches!(route, Route::Remote { .. }))
            .count()
    }

    #[must_use]
    pub fn max_clients(&self) -> u16 {
        self.max_clients
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RouterSettings {
    pub max_clients: u16,
    pub queue_capacity: usize,
    pub game: GameSettings,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            max_clients: DEFAULT_MAX_CLIENTS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            game: GameSettings::default(),
        }
    }
}

/// Everything that is thrown away when the session resets.
#[derive(Debug)]
pub struct Session {
    pub role: Role,
    /// This process's seat. `None` on a headless authority and on a
    /// participant that hasn't been assigned an ID yet.
    pub own_id: Option<ClientId>,
    pub table: ClientTable,
    pub game: Option<Poker>,
}

impl Session {
    #[must_use]
    pub fn new(role: Role, max_clients: u16) -> Self {
        let mut table = ClientTable::new(max_clients);
        let mut own_id = None;
        if let Role::Authority { headless } = role {
            // A fresh table always has room for the first two IDs.
            let _ = table.allocate(Route::Engine);
            if !headless {
                own_id = table.allocate(Route::Local).ok();
            }
        }
        Self {
            role,
            own_id,
            table,
            game: None,
        }
    }
}
