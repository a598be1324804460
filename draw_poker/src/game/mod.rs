//! Five-card draw: cards, hand evaluation, and the round state machine.

pub mod engine;
pub mod entities;
pub mod functional;

pub use engine::{
    DealPolicy, Envelope, GameError, GameSettings, MAX_PLAYERS, Phase, Poker, Recipient,
};
