//! # Blackjack Room
//!
//! A single shared blackjack room: players join over persistent connections,
//! one of them holds dealer authority, and each round moves through strict
//! turn order to a settled outcome.
//!
//! ## Architecture
//!
//! All room state is owned by one [`GameRoom`] running inside a
//! [`CommandProcessor`] task. Requests from many connections are queued and
//! applied strictly one at a time, so the rule checks and the round engine
//! need no locks of their own:
//!
//! - **Idle**: between rounds; players may join and leave
//! - **InRound**: cards dealt; non-dealers act in seat order, then the
//!   dealer draws to the stand score and every hand is settled
//!
//! Aces always count as 1. A hand that reaches 21 stands automatically; a
//! hand over 21 busts.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, shoe, rule checks and the round engine
//! - [`room`]: Room state ownership, command queue and async handle
//!
//! ## Example
//!
//! ```
//! use blackjack_room::{Card, Player, PlayerTurnState, Rank, Suit};
//!
//! let mut player = Player::new("conn-1".into(), "Alice".to_string(), false);
//! player.receive(Card::new(Suit::Spades, Rank::King));
//! player.receive(Card::new(Suit::Hearts, Rank::Queen));
//! player.receive(Card::new(Suit::Clubs, Rank::Ace));
//!
//! assert_eq!(player.score, 21);
//! assert_eq!(player.turn_state, PlayerTurnState::Standing);
//! ```

/// Cards, rules and round progression.
pub mod game;
pub use game::{
    entities::{
        self, BLACKJACK_SCORE, Card, ConnectionId, GameNotice, GamePhase, GameState, Player,
        PlayerId, PlayerState, PlayerTurnState, Rank, RoundOutcome, Suit,
    },
    errors::{ErrorKind, RoomError, RoomResult, codes},
    shoe::{DeckSource, Shoe, ShuffledDecks, StackedDeck},
};

/// Room state ownership and command serialization.
pub mod room;
pub use room::{
    CommandKind, CommandProcessor, GameRoom, OperationResult, RoomCommand, RoomConfig, RoomHandle,
};
