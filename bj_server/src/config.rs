//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use blackjack_room::RoomConfig;
use std::net::SocketAddr;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Prometheus scrape listener, disabled when unset
    pub metrics_bind: Option<SocketAddr>,
    /// Room rules and dealer key
    pub room: RoomConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `dealer_key_override` - Optional dealer key override (from CLI args)
    /// * `deck_count_override` - Optional deck count override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if `METRICS_BIND` is set but is not a socket address
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        dealer_key_override: Option<String>,
        deck_count_override: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let bind = bind_override
            .or_else(|| {
                std::env::var("SERVER_BIND")
                    .ok()
                    .and_then(|s| s.parse().ok())
            })
            .unwrap_or_else(default_bind);

        let metrics_bind = match std::env::var("METRICS_BIND") {
            Ok(raw) if !raw.trim().is_empty() => {
                Some(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "METRICS_BIND".to_string(),
                    reason: format!("'{raw}' is not a socket address"),
                })?)
            }
            _ => None,
        };

        let defaults = RoomConfig::default();
        let dealer_key = dealer_key_override
            .or_else(|| std::env::var("DEALER_KEY").ok())
            .filter(|key| !key.is_empty());

        let room = RoomConfig {
            dealer_key,
            deck_count: deck_count_override
                .unwrap_or_else(|| parse_env_or("GAME_DECK_COUNT", defaults.deck_count)),
            dealer_stand_score: parse_env_or("GAME_DEALER_STAND_SCORE", defaults.dealer_stand_score),
            min_players_to_start: parse_env_or("GAME_MIN_PLAYERS", defaults.min_players_to_start),
            min_name_length: parse_env_or("GAME_MIN_NAME_LENGTH", defaults.min_name_length),
            max_name_length: parse_env_or("GAME_MAX_NAME_LENGTH", defaults.max_name_length),
            shuffle_seed: std::env::var("GAME_SHUFFLE_SEED")
                .ok()
                .and_then(|v| v.parse().ok()),
        };

        Ok(ServerConfig {
            bind,
            metrics_bind,
            room,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(metrics_bind) = self.metrics_bind
            && metrics_bind == self.bind
        {
            return Err(ConfigError::Invalid {
                var: "METRICS_BIND".to_string(),
                reason: format!("Must differ from the server bind address ({})", self.bind),
            });
        }

        self.room
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "GAME_*".to_string(),
                reason,
            })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_bind: None,
            room: RoomConfig::default(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6969))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
