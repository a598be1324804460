//! Prometheus metrics for the poker host.
//!
//! Metrics are exposed in Prometheus text format when `--metrics` is given.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use dp_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//! metrics::connected_clients(2);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// Connection Metrics
// ============================================================================

/// Set the number of connected participants.
pub fn connected_clients(count: usize) {
    metrics::gauge!("dp_connected_clients").set(count as f64);
}

/// Record an accepted participant.
pub fn connections_total() {
    metrics::counter!("dp_connections_total").increment(1);
}

/// Record a participant that went away.
pub fn peers_lost_total() {
    metrics::counter!("dp_peers_lost_total").increment(1);
}

/// Record a connection refused at capacity or during the handshake.
pub fn connections_rejected_total(reason: &str) {
    metrics::counter!("dp_connections_rejected_total", "reason" => reason.to_string())
        .increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Record a game start.
pub fn games_started_total() {
    metrics::counter!("dp_games_started_total").increment(1);
}

/// Record a scored round and how many players shared the point.
pub fn rounds_scored_total(winners: usize) {
    metrics::counter!("dp_rounds_scored_total").increment(1);
    if winners > 1 {
        metrics::counter!("dp_split_rounds_total").increment(1);
    }
}
