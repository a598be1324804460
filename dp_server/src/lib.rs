//! Internal modules for the poker host.
//!
//! Configuration, the host session loop, the listener, logging and metrics,
//! used by the dp_server binary.

pub mod config;
pub mod host;
pub mod listener;
pub mod logging;
pub mod metrics;
