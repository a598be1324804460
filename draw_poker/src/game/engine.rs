//! Five-card draw round logic.
//!
//! The engine is a plain state machine. It never talks to the network; every
//! operation returns the messages it wants delivered as [`Envelope`]s and the
//! router decides how to get them there.

use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::{
    entities::{Card, ClientId, DECK_SIZE, Deck, HAND_SIZE, PokerPlayer, Score},
    functional::{Strength, argmin, strength},
};
use crate::net::messages::{Action, ServerMessage};

/// Five initial cards plus at most five replacements per seat must come out
/// of one deck.
pub const MAX_PLAYERS: usize = DECK_SIZE / (2 * HAND_SIZE);

#[derive(Debug, Eq, Error, PartialEq)]
pub enum GameError {
    #[error("player {0} is not seated")]
    UnknownPlayer(ClientId),
    #[error("player {0} already swapped this hand")]
    AlreadySwapped(ClientId),
    #[error("player {0} may not deal")]
    DealNotPermitted(ClientId),
    #[error("need 1+ players")]
    NotEnoughPlayers,
    #[error("at most {max} players can sit, got {requested}")]
    TooManyPlayers { max: usize, requested: usize },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Hands are out and nobody has swapped yet.
    Dealt,
    /// Some but not all players have swapped.
    AwaitingSwaps,
    /// Everyone swapped and the round was scored. Only a deal moves on.
    Scored,
}

/// Who may ask for a new deal.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DealPolicy {
    #[default]
    Anyone,
    /// Only the lowest seated ID, i.e. the host's own seat when it plays.
    HostOnly,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GameSettings {
    pub deal_policy: DealPolicy,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Recipient {
    Player(ClientId),
    Everyone,
}

/// A message the engine wants delivered.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Envelope {
    pub to: Recipient,
    pub message: ServerMessage,
}

impl Envelope {
    #[must_use]
    pub fn to_player(id: ClientId, message: ServerMessage) -> Self {
        Self {
            to: Recipient::Player(id),
            message,
        }
    }

    #[must_use]
    pub fn to_everyone(message: ServerMessage) -> Self {
        Self {
            to: Recipient::Everyone,
            message,
        }
    }
}

#[derive(Debug)]
pub struct Poker {
    settings: GameSettings,
    deck: Deck,
    muck: Vec<Card>,
    players: BTreeMap<ClientId, PokerPlayer>,
    phase: Phase,
}

impl Poker {
    /// Seat `player_ids` and deal everyone a hand from a freshly shuffled
    /// deck. Returns one `Start` per player.
    pub fn new(
        player_ids: &[ClientId],
        settings: GameSettings,
    ) -> Result<(Self, Vec<Envelope>), GameError> {
        Self::with_deck(player_ids, settings, Deck::new())
    }

    /// Like [`Poker::new`], but the first hands and every swap draw from
    /// `deck`. Players are dealt five cards each in ascending ID order.
    pub fn with_deck(
        player_ids: &[ClientId],
        settings: GameSettings,
        mut deck: Deck,
    ) -> Result<(Self, Vec<Envelope>), GameError> {
        let ids: BTreeSet<ClientId> = player_ids.iter().copied().collect();
        if ids.is_empty() {
            return Err(GameError::NotEnoughPlayers);
        }
        if ids.len() > MAX_PLAYERS {
            return Err(GameError::TooManyPlayers {
                max: MAX_PLAYERS,
                requested: ids.len(),
            });
        }

        let mut players = BTreeMap::new();
        for id in ids {
            let mut seat = PokerPlayer::new(id);
            seat.reset_hand(&mut deck);
            players.insert(id, seat);
        }

        let game = Self {
            settings,
            deck,
            muck: Vec::new(),
            players,
            phase: Phase::Dealt,
        };
        info!("Game started with {} players", game.players.len());

        let init = game.scores();
        let envelopes = game
            .players
            .values()
            .map(|seat| {
                Envelope::to_player(
                    seat.player.id,
                    ServerMessage::Start {
                        hand: seat.player.hand.clone(),
                        init: init.clone(),
                    },
                )
            })
            .collect();
        Ok((game, envelopes))
    }

    pub fn handle(&mut self, sender: ClientId, action: Action) -> Result<Vec<Envelope>, GameError> {
        match action {
            Action::Swap { hand } => self.swap(sender, &hand),
            Action::Deal => self.deal(sender),
        }
    }

    /// Swap the cards flagged `selected` in `hand`. The sender's own view of
    /// their hand is only used to pick cards; cards they don't hold are
    /// ignored.
    pub fn swap(&mut self, sender: ClientId, hand: &[Card]) -> Result<Vec<Envelope>, GameError> {
        let seat = self
            .players
            .get_mut(&sender)
            .ok_or(GameError::UnknownPlayer(sender))?;
        if seat.swapped {
            return Err(GameError::AlreadySwapped(sender));
        }

        let selected: Vec<Card> = hand.iter().copied().filter(|card| card.selected).collect();
        let discarded = seat.swap(&mut self.deck, &selected);
        debug!("Player {sender} swapped {} card(s)", discarded.len());
        self.muck.extend(discarded);

        if self.all_swapped() {
            return Ok(vec![self.score_round()]);
        }

        self.phase = Phase::AwaitingSwaps;
        let hand = self.players[&sender].player.hand.clone();
        Ok(vec![Envelope::to_player(
            sender,
            ServerMessage::SwapAck {
                hand,
                swapped: true,
            },
        )])
    }

    /// Collect every hand, reshuffle a full deck, and deal again.
    pub fn deal(&mut self, sender: ClientId) -> Result<Vec<Envelope>, GameError> {
        if !self.players.contains_key(&sender) {
            return Err(GameError::UnknownPlayer(sender));
        }
        if self.settings.deal_policy == DealPolicy::HostOnly && Some(sender) != self.host() {
            return Err(GameError::DealNotPermitted(sender));
        }

        self.deck = Deck::new();
        self.muck.clear();
        for seat in self.players.values_mut() {
            seat.reset_hand(&mut self.deck);
        }
        self.phase = Phase::Dealt;
        info!("Player {sender} dealt a new hand");

        Ok(self
            .players
            .values()
            .map(|seat| {
                Envelope::to_player(
                    seat.player.id,
                    ServerMessage::Hand {
                        hand: seat.player.hand.clone(),
                    },
                )
            })
            .collect())
    }

    /// Drop a departed player's seat. If everyone left has already swapped,
    /// the round is scored right away.
    pub fn remove_player(&mut self, id: ClientId) -> Vec<Envelope> {
        let Some(seat) = self.players.remove(&id) else {
            return Vec::new();
        };
        self.muck.extend(seat.player.hand);
        info!("Player {id} left the game");

        if self.phase == Phase::AwaitingSwaps && !self.players.is_empty() && self.all_swapped() {
            vec![self.score_round()]
        } else {
            Vec::new()
        }
    }

    fn all_swapped(&self) -> bool {
        self.players.values().all(|seat| seat.swapped)
    }

    fn host(&self) -> Option<ClientId> {
        self.players.keys().next().copied()
    }

    fn score_round(&mut self) -> Envelope {
        let ids: Vec<ClientId> = self.players.keys().copied().collect();
        let strengths: Vec<Strength> = self
            .players
            .values()
            .map(|seat| strength(&seat.player.hand))
            .collect();
        let won: Vec<ClientId> = argmin(&strengths).into_iter().map(|idx| ids[idx]).collect();
        for id in &won {
            if let Some(seat) = self.players.get_mut(id) {
                seat.player.win();
            }
        }
        self.phase = Phase::Scored;
        info!(
            "Round scored, won by {}",
            won.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        );

        let hs = self
            .players
            .values()
            .map(|seat| (seat.player.id, seat.player.score, seat.player.hand.clone()))
            .collect();
        Envelope::to_everyone(ServerMessage::Reveal { hs, won })
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn players(&self) -> impl Iterator<Item = &PokerPlayer> {
        self.players.values()
    }

    #[must_use]
    pub fn player(&self, id: ClientId) -> Option<&PokerPlayer> {
        self.players.get(&id)
    }

    #[must_use]
    pub fn scores(&self) -> Vec<(ClientId, Score)> {
        self.players
            .values()
            .map(|seat| (seat.player.id, seat.player.score))
            .collect()
    }

    #[must_use]
    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    #[must_use]
    pub fn muck_len(&self) -> usize {
        self.muck.len()
    }
}
