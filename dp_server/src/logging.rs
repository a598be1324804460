//! Structured logging configuration.
//!
//! The library logs through the `log` facade; the subscriber installed here
//! picks those records up alongside the host's own `tracing` events.

use draw_poker::{ClientId, entities::Score};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the RUST_LOG env var.
///
/// # Example
///
/// ```no_run
/// use dp_server::logging;
///
/// logging::init();
/// tracing::info!("Host starting");
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tungstenite=warn,tokio_tungstenite=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a participant joining or leaving
///
/// # Arguments
///
/// * `event_type` - `joined` or `left`
/// * `client_id` - ID the participant held
/// * `connected` - Remote connections after the change
pub fn log_connection_event(event_type: &str, client_id: ClientId, connected: usize) {
    tracing::info!(
        event_type = event_type,
        client_id = client_id.0,
        connected = connected,
        "Participant {}",
        event_type
    );
}

/// Log the outcome of a round
pub fn log_round_scored(winners: &[ClientId], scores: &[(ClientId, Score)]) {
    let winners: Vec<u16> = winners.iter().map(|id| id.0).collect();
    let table = scores
        .iter()
        .map(|(id, score)| format!("{id}:{score}"))
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(
        winners = ?winners,
        scores = %table,
        "Round scored"
    );
}

/// Log a game start or a refusal to start one
pub fn log_game_start(players: usize, outcome: Result<(), &str>) {
    match outcome {
        Ok(()) => tracing::info!(players = players, "Game started"),
        Err(reason) => tracing::warn!(players = players, reason = reason, "Game not started"),
    }
}
