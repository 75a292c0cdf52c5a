use serde::{Deserialize, Serialize};
use std::fmt;

/// Score at which a hand stops: above it busts, at it stands.
pub const BLACKJACK_SCORE: u32 = 21;

/// Number of cards in one standard deck.
pub const CARDS_PER_DECK: usize = 52;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Clubs => "♣",
            Self::Diamonds => "♦",
            Self::Hearts => "♥",
            Self::Spades => "♠",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Point value of the rank. Aces always count as 1.
    pub fn value(self) -> u32 {
        match self {
            Self::Ace => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten | Self::Jack | Self::Queen | Self::King => 10,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Ace => "A",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            Self::Ten => "10",
            other => return write!(f, "{}", other.value()),
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }

    pub fn value(&self) -> u32 {
        self.rank.value()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Opaque per-connection identifier handed out by the transport. A player's
/// id is the id of the connection that joined it.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ConnectionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ConnectionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

pub type PlayerId = ConnectionId;

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Idle,
    InRound,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamePhase::Idle => write!(f, "idle"),
            GamePhase::InRound => write!(f, "in_round"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerTurnState {
    #[default]
    Playing,
    Standing,
    Busted,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    #[default]
    None,
    Win,
    Lose,
    Tie,
}

/// A seated player. The same type travels inside [`GameState`] snapshots,
/// where it is always an owned copy.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub player_id: PlayerId,
    pub name: String,
    pub is_dealer: bool,
    pub cards: Vec<Card>,
    pub score: u32,
    pub turn_state: PlayerTurnState,
    pub outcome: RoundOutcome,
}

impl Player {
    pub fn new(player_id: PlayerId, name: String, is_dealer: bool) -> Self {
        Self {
            player_id,
            name,
            is_dealer,
            cards: Vec::new(),
            score: 0,
            turn_state: PlayerTurnState::Playing,
            outcome: RoundOutcome::None,
        }
    }

    /// Clear the hand and per-round state ahead of a fresh deal.
    pub fn reset_for_round(&mut self) {
        self.cards.clear();
        self.score = 0;
        self.turn_state = PlayerTurnState::Playing;
        self.outcome = RoundOutcome::None;
    }

    /// Add a card to the hand and recompute the score and turn state.
    pub fn receive(&mut self, card: Card) {
        self.cards.push(card);
        self.score = self.cards.iter().map(Card::value).sum();
        if self.score > BLACKJACK_SCORE {
            self.turn_state = PlayerTurnState::Busted;
        } else if self.score == BLACKJACK_SCORE {
            self.turn_state = PlayerTurnState::Standing;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.turn_state == PlayerTurnState::Playing
    }

    /// A non-dealer player that may still act this round.
    pub fn can_take_turn(&self) -> bool {
        !self.is_dealer && self.is_playing()
    }
}

/// Per-player view inside a [`GameState`] snapshot.
pub type PlayerState = Player;

/// Room-wide notice for terminal or exceptional events, broadcast to every
/// connection rather than only the caller.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameNotice {
    pub code: String,
    pub message: String,
}

impl GameNotice {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Point-in-time copy of the whole room, safe to hand to the outbound path.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub players: Vec<Player>,
    pub dealer_player_id: PlayerId,
    pub current_turn_player_id: PlayerId,
    pub status_message: String,
}

impl GameState {
    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.player_id == player_id)
    }

    pub fn dealer(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_dealer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_values() {
        assert_eq!(Rank::Ace.value(), 1);
        assert_eq!(Rank::Two.value(), 2);
        assert_eq!(Rank::Nine.value(), 9);
        for rank in [Rank::Ten, Rank::Jack, Rank::Queen, Rank::King] {
            assert_eq!(rank.value(), 10);
        }
    }

    #[test]
    fn test_full_deck_is_worth_340() {
        let total: u32 = Suit::ALL
            .iter()
            .flat_map(|_| Rank::ALL.iter())
            .map(|rank| rank.value())
            .sum();
        assert_eq!(total, 4 * (1 + 2 + 3 + 4 + 5 + 6 + 7 + 8 + 9 + 40));
    }

    #[test]
    fn test_card_display() {
        assert_eq!(Card::new(Suit::Spades, Rank::Ace).to_string(), "A♠");
        assert_eq!(Card::new(Suit::Hearts, Rank::Ten).to_string(), "10♥");
        assert_eq!(Card::new(Suit::Clubs, Rank::Seven).to_string(), "7♣");
    }

    #[test]
    fn test_receive_recomputes_score() {
        let mut player = Player::new("p1".into(), "Alice".to_string(), false);
        player.receive(Card::new(Suit::Clubs, Rank::Ace));
        player.receive(Card::new(Suit::Clubs, Rank::King));
        assert_eq!(player.score, 11);
        assert_eq!(player.turn_state, PlayerTurnState::Playing);
    }

    #[test]
    fn test_receive_exactly_21_stands() {
        let mut player = Player::new("p1".into(), "Alice".to_string(), false);
        player.receive(Card::new(Suit::Clubs, Rank::King));
        player.receive(Card::new(Suit::Hearts, Rank::Queen));
        player.receive(Card::new(Suit::Spades, Rank::Ace));
        assert_eq!(player.score, 21);
        assert_eq!(player.turn_state, PlayerTurnState::Standing);
    }

    #[test]
    fn test_receive_over_21_busts() {
        let mut player = Player::new("p1".into(), "Alice".to_string(), false);
        player.receive(Card::new(Suit::Clubs, Rank::King));
        player.receive(Card::new(Suit::Hearts, Rank::Queen));
        player.receive(Card::new(Suit::Spades, Rank::Two));
        assert_eq!(player.score, 22);
        assert_eq!(player.turn_state, PlayerTurnState::Busted);
        assert!(!player.can_take_turn());
    }

    #[test]
    fn test_reset_for_round() {
        let mut player = Player::new("p1".into(), "Alice".to_string(), false);
        player.receive(Card::new(Suit::Clubs, Rank::King));
        player.outcome = RoundOutcome::Win;
        player.turn_state = PlayerTurnState::Standing;
        player.reset_for_round();
        assert!(player.cards.is_empty());
        assert_eq!(player.score, 0);
        assert_eq!(player.turn_state, PlayerTurnState::Playing);
        assert_eq!(player.outcome, RoundOutcome::None);
    }

    #[test]
    fn test_dealer_cannot_take_turn() {
        let dealer = Player::new("d".into(), "Dealer".to_string(), true);
        assert!(dealer.is_playing());
        assert!(!dealer.can_take_turn());
    }

    #[test]
    fn test_state_serializes_empty_ids_as_empty_strings() {
        let state = GameState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["phase"], "idle");
        assert_eq!(json["dealer_player_id"], "");
        assert_eq!(json["current_turn_player_id"], "");
    }
}
