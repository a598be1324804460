//! Internal modules for the poker client.
//!
//! Command parsing and the player's view of the table, used by the
//! dp_client binary.

pub mod commands;
pub mod view;
