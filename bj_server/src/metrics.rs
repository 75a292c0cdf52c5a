//! Prometheus metrics for monitoring the blackjack server.
//!
//! Metrics are exposed in Prometheus text format when a listener is
//! configured with `METRICS_BIND`. Without one, recording is a no-op.
//!
//! # Metrics Categories
//!
//! - **Room Metrics**: Commands by kind and outcome, notices, rounds completed
//! - **WebSocket Metrics**: Active connections, connections opened
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bj_server::metrics;
//! use std::net::SocketAddr;
//!
//! // Initialize metrics exporter
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! // Record a processed command
//! metrics::room_commands_total("hit", "ok");
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
// Room Metrics
// ============================================================================

/// Record a command submitted to the room.
///
/// `outcome` is `ok` or the error kind that rejected it.
pub fn room_commands_total(kind: &str, outcome: &str) {
    metrics::counter!("room_commands_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Increment the room-wide notice counter.
pub fn room_notices_total(code: &str) {
    metrics::counter!("room_notices_total",
        "code" => code.to_string()
    )
    .increment(1);
}

/// Increment rounds settled counter.
pub fn rounds_completed_total() {
    metrics::counter!("rounds_completed_total").increment(1);
}

/// Set the number of joined connections.
pub fn room_players(count: usize) {
    metrics::gauge!("room_players").set(count as f64);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Record a new WebSocket connection.
pub fn websocket_connected() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// Record a closed WebSocket connection.
pub fn websocket_disconnected() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}
