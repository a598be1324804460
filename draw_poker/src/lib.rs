//! # Draw Poker
//!
//! A networked five-card draw poker game for small groups.
//!
//! One process is the *authority*: it runs the game engine and routes
//! messages to everyone else. Other processes are *participants* that
//! connect to it over WebSocket or a raw TCP stream. A round goes:
//!
//! - **Dealt**: every seated player holds five cards
//! - **AwaitingSwaps**: players swap any number of cards, once each
//! - **Scored**: after the last swap every hand is revealed and the best
//!   hand (ties share) scores a point
//!
//! Anyone may then deal again.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, hand evaluation, and the round state machine
//! - [`net`]: Message codec, framing, and transports
//! - [`router`]: Connection table and message routing actor
//!
//! ## Example
//!
//! ```
//! use draw_poker::{ClientId, GameSettings, Poker};
//!
//! let (game, starts) = Poker::new(&[ClientId(1), ClientId(2)], GameSettings::default()).unwrap();
//! assert_eq!(starts.len(), 2);
//! assert_eq!(game.deck_len(), 42);
//! ```

/// Networking components for authority/participant communication.
pub mod net;
pub use net::{messages, transport};

/// Core game logic and entities.
pub mod game;
pub use game::{
    DealPolicy, Envelope, GameError, GameSettings, MAX_PLAYERS, Phase, Poker, Recipient,
    entities::{self, ClientId},
    functional,
};

/// Session management and message routing.
pub mod router;
pub use router::{Role, Router, RouterError, RouterHandle, RouterSettings, SessionEvent};
