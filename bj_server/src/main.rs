//! Shared blackjack room server.
//!
//! Runs a single room task and serves it over WebSocket, with a health
//! endpoint and optional Prometheus metrics.

use std::net::SocketAddr;

use anyhow::Error;
use bj_server::{api, config::ServerConfig, metrics};
use blackjack_room::RoomHandle;
use log::{error, info, warn};
use pico_args::Arguments;

const HELP: &str = "\
Run a shared blackjack room server

USAGE:
  bj_server [OPTIONS]

OPTIONS:
  --bind         IP:PORT   Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --dealer-key   KEY       Key that claims the dealer role on join  [default: env DEALER_KEY]
  --decks        N         Decks per shoe, 1 to 8  [default: env GAME_DECK_COUNT or 4]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DEALER_KEY               Dealer key; unset means nobody can claim the dealer role
  METRICS_BIND             Prometheus listener address (e.g., 127.0.0.1:9090)
  GAME_DEALER_STAND_SCORE  Dealer stands at or above this score  [default: 17]
  GAME_MIN_PLAYERS         Seated connections needed to start  [default: 2]
  GAME_MIN_NAME_LENGTH     [default: 1]
  GAME_MAX_NAME_LENGTH     [default: 20]
  GAME_SHUFFLE_SEED        Seed the shoe for reproducible rounds
  RUST_LOG                 Log filter  [default: info]
";

struct Args {
    bind: Option<SocketAddr>,
    dealer_key: Option<String>,
    decks: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        dealer_key: pargs.opt_value_from_str("--dealer-key")?,
        decks: pargs.opt_value_from_str("--decks")?,
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let config = ServerConfig::from_env(args.bind, args.dealer_key, args.decks)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(|e| anyhow::anyhow!(e))?;
        info!("Prometheus metrics available at http://{}/metrics", metrics_bind);
    }

    if !config.room.dealer_election_enabled() {
        warn!("No dealer key configured; rounds cannot be started until one is set");
    }

    info!(
        "Room rules: {} deck(s), dealer stands on {}, {} player(s) to start",
        config.room.deck_count, config.room.dealer_stand_score, config.room.min_players_to_start
    );

    let room = RoomHandle::new(config.room.clone());
    let app = api::create_router(api::AppState::new(room));

    // Start HTTP server
    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at ws://{}/blackjack. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
}
