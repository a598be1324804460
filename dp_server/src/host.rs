//! The host's side of a session: starting games and playing its own seat.

use crate::{config::ServerConfig, logging, metrics};
use draw_poker::{
    RouterHandle, SessionEvent,
    entities::hand_to_string,
    messages::{Action, ServerMessage},
};
use log::{error, info};
use tokio::sync::mpsc::UnboundedReceiver;

/// Counts of what the host has done so far.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HostStats {
    pub games_started: u32,
    pub rounds_scored: u32,
    /// Hands the host's own seat kept without swapping.
    pub stood_pat: u32,
}

/// Reacts to session events: starts a game when the table fills, plays the
/// host's own seat, and keeps metrics current.
pub struct HostSession {
    router: RouterHandle,
    /// Remote connections needed before a game starts
    needed: usize,
    headless: bool,
    connected: usize,
    started: bool,
    stats: HostStats,
}

impl HostSession {
    #[must_use]
    pub fn new(router: RouterHandle, config: &ServerConfig) -> Self {
        Self {
            router,
            needed: config.remote_players(),
            headless: config.headless,
            connected: 0,
            started: false,
            stats: HostStats::default(),
        }
    }

    /// Whether a game was started since the table last filled.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    #[must_use]
    pub fn connected(&self) -> usize {
        self.connected
    }

    #[must_use]
    pub fn stats(&self) -> HostStats {
        self.stats
    }

    /// Handle events until the router goes away.
    pub async fn run(mut self, mut events: UnboundedReceiver<SessionEvent>) -> HostStats {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        self.stats
    }

    pub async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected { id, connected } => {
                self.connected = connected;
                logging::log_connection_event("joined", id, connected);
                metrics::connected_clients(connected);
                if !self.started && connected >= self.needed {
                    self.start_game().await;
                }
            }
            SessionEvent::PeerLost { id, connected } => {
                self.connected = connected;
                logging::log_connection_event("left", id, connected);
                metrics::connected_clients(connected);
                metrics::peers_lost_total();
                if connected < self.needed {
                    // The current game plays on without them. A new game
                    // starts once the table fills again.
                    self.started = false;
                }
            }
            SessionEvent::Message(message) => self.play_own_seat(message).await,
            SessionEvent::Notice(notice) => info!("{notice}"),
            SessionEvent::AssignedId(_) | SessionEvent::AuthorityLost => {}
        }
    }

    async fn start_game(&mut self) {
        let players = self.connected + usize::from(!self.headless);
        match self.router.start_game().await {
            Ok(()) => {
                self.started = true;
                self.stats.games_started += 1;
                metrics::games_started_total();
                logging::log_game_start(players, Ok(()));
            }
            Err(err) => logging::log_game_start(players, Err(&err.to_string())),
        }
    }

    /// The host's own seat always stands pat.
    async fn play_own_seat(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Start { hand, .. } | ServerMessage::Hand { hand } => {
                info!("Host dealt {}", hand_to_string(&hand));
                match self.router.submit(Action::Swap { hand }).await {
                    Ok(()) => self.stats.stood_pat += 1,
                    Err(err) => error!("Host could not stand pat: {err}"),
                }
            }
            ServerMessage::Reveal { hs, won } => {
                let scores: Vec<_> = hs.iter().map(|(id, score, _)| (*id, *score)).collect();
                for (id, _, hand) in &hs {
                    info!("{id}: {}", hand_to_string(hand));
                }
                self.stats.rounds_scored += 1;
                logging::log_round_scored(&won, &scores);
                metrics::rounds_scored_total(won.len());
            }
            ServerMessage::SwapAck { .. } | ServerMessage::AssignId { .. } => {}
        }
    }
}
