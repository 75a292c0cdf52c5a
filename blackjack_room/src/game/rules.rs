//! Stateless command validation.
//!
//! Every check is a pure function of the state passed in. The coordinator
//! calls these inside the command loop, so they always see the latest room
//! state rather than whatever was true when the command was enqueued.

use super::{
    entities::{ConnectionId, GamePhase, Player},
    errors::{RoomError, RoomResult, codes},
};
use crate::room::registry::ConnectionRegistry;

/// Trim a requested display name and check its length in characters.
pub fn normalize_name(raw: &str, min_length: usize, max_length: usize) -> RoomResult<String> {
    let normalized = raw.trim();
    let length = normalized.chars().count();
    if length < min_length || length > max_length {
        return Err(RoomError::validation(
            codes::INVALID_NAME,
            format!("Name must be {min_length}-{max_length} characters."),
        ));
    }
    Ok(normalized.to_string())
}

pub fn ensure_joined(registry: &ConnectionRegistry, connection_id: &ConnectionId) -> RoomResult<()> {
    if !registry.contains(connection_id) {
        return Err(RoomError::validation(
            codes::NOT_JOINED,
            "You must join the game first.",
        ));
    }
    Ok(())
}

pub fn ensure_can_start_round(
    registry: &ConnectionRegistry,
    phase: GamePhase,
    dealer_id: &ConnectionId,
    connection_id: &ConnectionId,
    player_count: usize,
    min_players: usize,
) -> RoomResult<()> {
    ensure_joined(registry, connection_id)?;

    if phase != GamePhase::Idle {
        return Err(RoomError::rule(
            codes::GAME_IN_PROGRESS,
            "A round is already in progress.",
        ));
    }

    if dealer_id.is_empty() || dealer_id != connection_id {
        return Err(RoomError::authorization(
            codes::NOT_DEALER,
            "Only the dealer can start a round.",
        ));
    }

    if player_count < min_players {
        return Err(RoomError::rule(
            codes::INSUFFICIENT_PLAYERS,
            format!("At least {min_players} players are needed to start a round."),
        ));
    }

    Ok(())
}

/// Check that `connection_id` may hit or stand right now and return the
/// index of its player in `players`.
pub fn validate_player_action(
    registry: &ConnectionRegistry,
    phase: GamePhase,
    players: &[Player],
    connection_id: &ConnectionId,
    current_turn_id: &ConnectionId,
) -> RoomResult<usize> {
    ensure_joined(registry, connection_id)?;

    if phase != GamePhase::InRound {
        return Err(RoomError::rule(
            codes::GAME_NOT_INROUND,
            "No round is in progress.",
        ));
    }

    let index = find_player(players, connection_id)?;
    let player = &players[index];

    if player.is_dealer {
        return Err(RoomError::rule(
            codes::DEALER_IS_AUTO,
            "The dealer plays automatically.",
        ));
    }

    if current_turn_id != &player.player_id {
        return Err(RoomError::rule(codes::NOT_YOUR_TURN, "It is not your turn."));
    }

    if !player.is_playing() {
        return Err(RoomError::rule(
            codes::ALREADY_DONE,
            "You have already finished this round.",
        ));
    }

    Ok(index)
}

pub fn find_player(players: &[Player], player_id: &ConnectionId) -> RoomResult<usize> {
    players
        .iter()
        .position(|p| &p.player_id == player_id)
        .ok_or_else(|| RoomError::validation(codes::NOT_JOINED, "You must join the game first."))
}

pub fn find_dealer(players: &[Player]) -> RoomResult<usize> {
    players
        .iter()
        .position(|p| p.is_dealer)
        .ok_or_else(|| RoomError::authorization(codes::NOT_DEALER, "There is no dealer in the room."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{entities::PlayerTurnState, errors::ErrorKind};

    fn seated(registry: &ConnectionRegistry, ids: &[(&str, bool)]) -> Vec<Player> {
        ids.iter()
            .map(|(id, is_dealer)| {
                let id = ConnectionId::from(*id);
                registry.add(id.clone(), id.clone());
                Player::new(id.clone(), id.to_string(), *is_dealer)
            })
            .collect()
    }

    #[test]
    fn test_normalize_name_trims() {
        assert_eq!(normalize_name("  Alice \t", 1, 20).unwrap(), "Alice");
    }

    #[test]
    fn test_normalize_name_rejects_blank() {
        let err = normalize_name("   ", 1, 20).unwrap_err();
        assert_eq!(err.code, codes::INVALID_NAME);
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_normalize_name_rejects_too_long() {
        let long = "x".repeat(21);
        assert_eq!(normalize_name(&long, 1, 20).unwrap_err().code, codes::INVALID_NAME);
        assert!(normalize_name(&"x".repeat(20), 1, 20).is_ok());
    }

    #[test]
    fn test_normalize_name_counts_characters_not_bytes() {
        // Four characters, twelve bytes.
        assert!(normalize_name("딜러님아", 1, 4).is_ok());
    }

    #[test]
    fn test_ensure_joined() {
        let registry = ConnectionRegistry::new();
        let id = ConnectionId::from("c1");
        assert_eq!(ensure_joined(&registry, &id).unwrap_err().code, codes::NOT_JOINED);
        registry.add(id.clone(), id.clone());
        assert!(ensure_joined(&registry, &id).is_ok());
    }

    #[test]
    fn test_start_round_checks_in_order() {
        let registry = ConnectionRegistry::new();
        let dealer = ConnectionId::from("dealer");
        let other = ConnectionId::from("alice");

        // Not joined comes first.
        let err = ensure_can_start_round(&registry, GamePhase::InRound, &dealer, &dealer, 0, 2)
            .unwrap_err();
        assert_eq!(err.code, codes::NOT_JOINED);

        registry.add(dealer.clone(), dealer.clone());
        registry.add(other.clone(), other.clone());

        let err = ensure_can_start_round(&registry, GamePhase::InRound, &dealer, &dealer, 2, 2)
            .unwrap_err();
        assert_eq!(err.code, codes::GAME_IN_PROGRESS);
        assert_eq!(err.kind, ErrorKind::Rule);

        let err = ensure_can_start_round(&registry, GamePhase::Idle, &dealer, &other, 2, 2)
            .unwrap_err();
        assert_eq!(err.code, codes::NOT_DEALER);
        assert_eq!(err.kind, ErrorKind::Authorization);

        let err = ensure_can_start_round(&registry, GamePhase::Idle, &dealer, &dealer, 1, 2)
            .unwrap_err();
        assert_eq!(err.code, codes::INSUFFICIENT_PLAYERS);

        assert!(ensure_can_start_round(&registry, GamePhase::Idle, &dealer, &dealer, 2, 2).is_ok());
    }

    #[test]
    fn test_start_round_without_dealer() {
        let registry = ConnectionRegistry::new();
        let alice = ConnectionId::from("alice");
        registry.add(alice.clone(), alice.clone());
        let err = ensure_can_start_round(
            &registry,
            GamePhase::Idle,
            &ConnectionId::default(),
            &alice,
            3,
            2,
        )
        .unwrap_err();
        assert_eq!(err.code, codes::NOT_DEALER);
    }

    #[test]
    fn test_player_action_requires_round() {
        let registry = ConnectionRegistry::new();
        let players = seated(&registry, &[("dealer", true), ("alice", false)]);
        let alice = ConnectionId::from("alice");
        let err = validate_player_action(&registry, GamePhase::Idle, &players, &alice, &alice)
            .unwrap_err();
        assert_eq!(err.code, codes::GAME_NOT_INROUND);
    }

    #[test]
    fn test_player_action_rejects_dealer() {
        let registry = ConnectionRegistry::new();
        let players = seated(&registry, &[("dealer", true), ("alice", false)]);
        let dealer = ConnectionId::from("dealer");
        let err = validate_player_action(
            &registry,
            GamePhase::InRound,
            &players,
            &dealer,
            &ConnectionId::from("alice"),
        )
        .unwrap_err();
        assert_eq!(err.code, codes::DEALER_IS_AUTO);
    }

    #[test]
    fn test_player_action_rejects_out_of_turn() {
        let registry = ConnectionRegistry::new();
        let players = seated(&registry, &[("dealer", true), ("alice", false), ("bob", false)]);
        let err = validate_player_action(
            &registry,
            GamePhase::InRound,
            &players,
            &ConnectionId::from("bob"),
            &ConnectionId::from("alice"),
        )
        .unwrap_err();
        assert_eq!(err.code, codes::NOT_YOUR_TURN);
    }

    #[test]
    fn test_player_action_rejects_finished_player() {
        let registry = ConnectionRegistry::new();
        let mut players = seated(&registry, &[("dealer", true), ("alice", false)]);
        players[1].turn_state = PlayerTurnState::Standing;
        let alice = ConnectionId::from("alice");
        let err = validate_player_action(&registry, GamePhase::InRound, &players, &alice, &alice)
            .unwrap_err();
        assert_eq!(err.code, codes::ALREADY_DONE);
    }

    #[test]
    fn test_player_action_registered_but_unseated() {
        let registry = ConnectionRegistry::new();
        let players = seated(&registry, &[("dealer", true)]);
        let ghost = ConnectionId::from("ghost");
        registry.add(ghost.clone(), ghost.clone());
        let err = validate_player_action(&registry, GamePhase::InRound, &players, &ghost, &ghost)
            .unwrap_err();
        assert_eq!(err.code, codes::NOT_JOINED);
    }

    #[test]
    fn test_player_action_ok_returns_index() {
        let registry = ConnectionRegistry::new();
        let players = seated(&registry, &[("dealer", true), ("alice", false)]);
        let alice = ConnectionId::from("alice");
        assert_eq!(
            validate_player_action(&registry, GamePhase::InRound, &players, &alice, &alice).unwrap(),
            1
        );
    }

    #[test]
    fn test_find_dealer() {
        let registry = ConnectionRegistry::new();
        let players = seated(&registry, &[("alice", false), ("dealer", true)]);
        assert_eq!(find_dealer(&players).unwrap(), 1);
        assert_eq!(find_dealer(&players[..1]).unwrap_err().code, codes::NOT_DEALER);
    }
}
