//! HTTP/WebSocket API for the blackjack server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Tower**: CORS middleware
//! - **Room task**: all game state lives in one [`RoomHandle`] task; every
//!   socket submits commands to it and receives results back
//!
//! Results that change visible state are fanned out to every socket through
//! the room's result subscription, which delivers them in the order the
//! room ran them. Errors go back to the socket that caused them.
//!
//! # Endpoints
//!
//! ```text
//! GET /blackjack   - WebSocket (join, leave, start_round, hit, stand)
//! GET /health      - Server health status
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use bj_server::api::{AppState, create_router};
//! use blackjack_room::{RoomConfig, RoomHandle};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = AppState::new(RoomHandle::new(RoomConfig::default()));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use blackjack_room::{OperationResult, RoomHandle};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::metrics;

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned per request; the room handle is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub room: RoomHandle,
}

impl AppState {
    pub fn new(room: RoomHandle) -> Self {
        Self { room }
    }

    /// Update room metrics from a successful command result. Called once per
    /// command by the socket that submitted it.
    pub fn record(&self, result: &OperationResult) {
        if let Some(notice) = &result.notice {
            metrics::room_notices_total(&notice.code);
        }
        if result.round_settled {
            metrics::rounds_completed_total();
        }
        if result.should_publish_state {
            metrics::room_players(self.room.joined_count());
        }
    }
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/blackjack", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Reads a snapshot through the room queue, so a healthy response also
/// proves the room task is still processing commands.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","phase":"idle","players":0,"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.room.snapshot().await {
        Ok(snapshot) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "phase": snapshot.phase,
                "players": snapshot.players.len(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        ),
        Err(e) => {
            log::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "version": env!("CARGO_PKG_VERSION"),
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                })),
            )
        }
    }
}
