//! Connection router: the one place that knows who is connected.
//!
//! This module implements:
//! - Router: async actor owning the client table, this process's ID, and
//!   the game in progress
//! - RouterHandle: cloneable front end used by listeners and the UI
//! - SessionEvent: what the presentation layer is told
//!
//! ## Architecture
//!
//! The router runs in its own Tokio task and drains an mpsc inbox, so every
//! change to the session happens one message at a time. Each connection gets
//! a reader task feeding frames into the inbox and a writer task draining a
//! bounded outbound queue. On the authority, client requests are handed to
//! the engine and its replies are routed back out; on a participant, server
//! messages are passed up as events.
//!
//! ## Example
//!
//! ```no_run
//! use draw_poker::router::{Role, Router, RouterSettings};
//!
//! #[tokio::main]
//! async fn main() {
//!     let (router, handle, mut events) =
//!         Router::new(Role::Authority { headless: false }, RouterSettings::default());
//!     tokio::spawn(router.run());
//!
//!     handle.start_game().await.unwrap();
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//! }
//! ```

pub mod actor;
pub mod messages;
pub mod session;

pub use actor::{Router, RouterHandle};
pub use messages::{RouterError, RouterMessage, SessionEvent, SessionSnapshot};
pub use session::{
    ClientTable, ConnectionKey, DEFAULT_MAX_CLIENTS, DEFAULT_QUEUE_CAPACITY, Role, Route,
    RouterSettings, Session,
};
