//! Connection transport for a shared blackjack room.
//!
//! Wraps a [`blackjack_room::RoomHandle`] in an axum WebSocket server,
//! fans room events out to every connected socket and exposes a health
//! endpoint plus optional Prometheus metrics.

pub mod api;
pub mod config;
pub mod metrics;
