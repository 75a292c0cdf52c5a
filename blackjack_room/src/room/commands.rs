//! Room command and result types.

use crate::game::entities::{ConnectionId, GameState};
use std::fmt;

pub use crate::game::entities::GameNotice;

/// A request submitted to the room on behalf of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomCommand {
    pub kind: CommandKind,
    pub connection_id: ConnectionId,
}

impl RoomCommand {
    pub fn new(kind: CommandKind, connection_id: ConnectionId) -> Self {
        Self {
            kind,
            connection_id,
        }
    }
}

/// Commands the room understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Take a seat, optionally claiming the dealer role with a key
    Join {
        name: String,
        dealer_key: Option<String>,
    },

    /// Leave the room voluntarily
    Leave,

    /// Transport noticed the connection went away
    Disconnect,

    /// Dealer deals a new round
    StartRound,

    /// Draw one card
    Hit,

    /// End the caller's turn
    Stand,

    /// Read the current state without changing it
    Snapshot,
}

impl CommandKind {
    /// Stable label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            CommandKind::Join { .. } => "join",
            CommandKind::Leave => "leave",
            CommandKind::Disconnect => "disconnect",
            CommandKind::StartRound => "start_round",
            CommandKind::Hit => "hit",
            CommandKind::Stand => "stand",
            CommandKind::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result envelope for a successfully processed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationResult {
    /// Deep copy of the room taken after the command ran
    pub state: GameState,

    /// Whether the state should be fanned out to every connection
    pub should_publish_state: bool,

    /// Room-wide notice, broadcast ahead of the state
    pub notice: Option<GameNotice>,

    /// The command finished a round and assigned outcomes
    pub round_settled: bool,
}

impl OperationResult {
    pub fn publish(state: GameState) -> Self {
        Self {
            state,
            should_publish_state: true,
            notice: None,
            round_settled: false,
        }
    }

    /// Result that only the caller sees.
    pub fn silent(state: GameState) -> Self {
        Self {
            state,
            should_publish_state: false,
            notice: None,
            round_settled: false,
        }
    }

    pub fn with_notice(mut self, notice: Option<GameNotice>) -> Self {
        self.notice = notice;
        self
    }

    pub fn with_round_settled(mut self, settled: bool) -> Self {
        self.round_settled = settled;
        self
    }

    /// Whether anything in this result goes out to every connection.
    pub fn is_broadcast(&self) -> bool {
        self.should_publish_state || self.notice.is_some()
    }
}
