//! Room configuration.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::game::entities::BLACKJACK_SCORE;

/// Largest shoe a room may be configured with.
pub const MAX_DECK_COUNT: usize = 8;

/// Room configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Secret that elects the joining player as dealer. `None` or empty
    /// disables dealer election.
    pub dealer_key: Option<String>,

    /// Standard decks per shoe (default: 4)
    pub deck_count: usize,

    /// Dealer stops drawing at or above this score (default: 17)
    pub dealer_stand_score: u32,

    /// Players, dealer included, needed to start a round (default: 2)
    pub min_players_to_start: usize,

    /// Shortest allowed display name, in characters
    pub min_name_length: usize,

    /// Longest allowed display name, in characters
    pub max_name_length: usize,

    /// Fixed shuffle seed; random when unset
    pub shuffle_seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            dealer_key: None,
            deck_count: 4,
            dealer_stand_score: 17,
            min_players_to_start: 2,
            min_name_length: 1,
            max_name_length: 20,
            shuffle_seed: None,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.deck_count == 0 || self.deck_count > MAX_DECK_COUNT {
            return Err(format!(
                "Deck count must be between 1 and {MAX_DECK_COUNT}"
            ));
        }

        if self.dealer_stand_score == 0 || self.dealer_stand_score > BLACKJACK_SCORE {
            return Err(format!(
                "Dealer stand score must be between 1 and {BLACKJACK_SCORE}"
            ));
        }

        if self.min_players_to_start == 0 {
            return Err("Minimum players to start must be at least 1".to_string());
        }

        if self.min_name_length == 0 {
            return Err("Minimum name length must be at least 1".to_string());
        }

        if self.max_name_length < self.min_name_length {
            return Err("Max name length must not be less than min name length".to_string());
        }

        Ok(())
    }

    /// Whether dealer election is possible at all.
    pub fn dealer_election_enabled(&self) -> bool {
        self.dealer_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    /// Compare a caller-supplied key against the configured dealer key in
    /// constant time.
    pub fn is_dealer_key(&self, candidate: Option<&str>) -> bool {
        let (Some(expected), Some(candidate)) = (self.dealer_key.as_deref(), candidate) else {
            return false;
        };
        if expected.is_empty() {
            return false;
        }
        expected.as_bytes().ct_eq(candidate.as_bytes()).into()
    }
}
