//! Room error types.

use std::fmt;
use thiserror::Error;

/// Broad category of a rejected command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Malformed input, or a caller that is (or is not yet) joined
    Validation,
    /// Request conflicts with the game rules or current phase
    Rule,
    /// Caller lacks the required role
    Authorization,
    /// Broken invariant or serializer failure
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Rule => write!(f, "rule"),
            ErrorKind::Authorization => write!(f, "authorization"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Error raised by a single room command. Delivered to the originating
/// caller only; the room keeps processing later commands.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("{code}: {message}")]
pub struct RoomError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub message: String,
}

impl RoomError {
    pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    pub fn validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, code, message)
    }

    pub fn rule(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Rule, code, message)
    }

    pub fn authorization(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, code, message)
    }

    /// Message that is safe to send to a client.
    ///
    /// Internal failures are collapsed so that invariant details stay in
    /// the server log.
    pub fn client_message(&self) -> String {
        match self.kind {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.message.clone(),
        }
    }
}

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;

/// Stable machine-readable error and notice codes.
pub mod codes {
    pub const INVALID_NAME: &str = "INVALID_NAME";
    pub const NOT_JOINED: &str = "NOT_JOINED";
    pub const ALREADY_JOINED: &str = "ALREADY_JOINED";
    pub const GAME_IN_PROGRESS: &str = "GAME_IN_PROGRESS";
    pub const GAME_NOT_INROUND: &str = "GAME_NOT_INROUND";
    pub const NOT_DEALER: &str = "NOT_DEALER";
    pub const INSUFFICIENT_PLAYERS: &str = "INSUFFICIENT_PLAYERS";
    pub const DEALER_IS_AUTO: &str = "DEALER_IS_AUTO";
    pub const NOT_YOUR_TURN: &str = "NOT_YOUR_TURN";
    pub const ALREADY_DONE: &str = "ALREADY_DONE";
    pub const DEALER_ALREADY_EXISTS: &str = "DEALER_ALREADY_EXISTS";

    pub const GAME_TERMINATED: &str = "GAME_TERMINATED";
    pub const SHOE_EMPTY: &str = "SHOE_EMPTY";

    pub const SHOE_MISSING: &str = "SHOE_MISSING";
    pub const PROCESSOR_STOPPED: &str = "PROCESSOR_STOPPED";
    pub const HANDLER_PANICKED: &str = "HANDLER_PANICKED";
    pub const HANDLER_DROPPED: &str = "HANDLER_DROPPED";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code_and_message() {
        let err = RoomError::rule(codes::NOT_YOUR_TURN, "It is not your turn.");
        assert_eq!(err.to_string(), "NOT_YOUR_TURN: It is not your turn.");
        assert_eq!(err.kind, ErrorKind::Rule);
    }

    #[test]
    fn test_internal_client_message_is_sanitized() {
        let err = RoomError::internal(codes::SHOE_MISSING, "shoe missing while in round");
        assert_eq!(err.client_message(), "Internal server error");

        let err = RoomError::validation(codes::INVALID_NAME, "Name must be 1-20 characters.");
        assert_eq!(err.client_message(), "Name must be 1-20 characters.");
    }
}
