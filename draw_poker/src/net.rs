//! Networking layer between the authority and its participants.
//!
//! Messages are JSON text, one per frame. Frames travel over either a
//! WebSocket connection or a raw TCP byte stream with explicit framing.

/// Codec and transport error types.
pub mod errors;

/// Frame boundaries for byte-stream transports.
pub mod framing;

/// Protocol message types and the JSON codec.
pub mod messages;

/// Connection transports behind a common frame interface.
pub mod transport;
