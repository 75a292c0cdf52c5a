//! Round progression: dealing, turn advancement, dealer auto-play and
//! settlement.
//!
//! The engine works on the player list and shoe it is handed and reports
//! what the room should look like next as a [`RoundResolution`]. It never
//! touches the room's phase or turn pointer itself; the coordinator applies
//! the resolution in one step.

use super::{
    entities::{GameNotice, GamePhase, Player, PlayerId, PlayerTurnState, RoundOutcome},
    errors::{RoomResult, codes},
    rules,
    shoe::Shoe,
};

pub const ROUND_STARTED: &str = "Round started.";
pub const ROUND_ENDED: &str = "Round ended.";
pub const SHOE_EMPTY_MESSAGE: &str = "Not enough cards; round ended.";

/// What the room should become after a round-engine step.
#[derive(Debug)]
pub struct RoundResolution {
    pub phase: GamePhase,
    pub current_turn_player_id: PlayerId,
    pub status_message: String,
    /// Set only when the step created a new shoe.
    pub shoe: Option<Shoe>,
    pub notice: Option<GameNotice>,
    /// Outcomes were assigned to every non-dealer.
    pub settled: bool,
}

impl RoundResolution {
    fn in_round(current_turn_player_id: PlayerId, status_message: impl Into<String>) -> Self {
        Self {
            phase: GamePhase::InRound,
            current_turn_player_id,
            status_message: status_message.into(),
            shoe: None,
            notice: None,
            settled: false,
        }
    }

    fn round_ended() -> Self {
        Self {
            phase: GamePhase::Idle,
            current_turn_player_id: PlayerId::default(),
            status_message: ROUND_ENDED.to_string(),
            shoe: None,
            notice: None,
            settled: true,
        }
    }

    fn shoe_empty() -> Self {
        log::warn!("Shoe exhausted, ending round early");
        Self {
            phase: GamePhase::Idle,
            current_turn_player_id: PlayerId::default(),
            status_message: SHOE_EMPTY_MESSAGE.to_string(),
            shoe: None,
            notice: Some(GameNotice::new(codes::SHOE_EMPTY, SHOE_EMPTY_MESSAGE)),
            settled: false,
        }
    }

    fn with_shoe(mut self, shoe: Shoe) -> Self {
        self.shoe = Some(shoe);
        self
    }
}

/// Reset every hand, deal two cards to each player in seat order and hand
/// the turn to the first non-dealer who can act.
///
/// If nobody can act after the deal (everyone hit 21), the round is
/// completed straight away.
pub fn start_round(
    players: &mut [Player],
    mut shoe: Shoe,
    dealer_stand_score: u32,
) -> RoomResult<RoundResolution> {
    for player in players.iter_mut() {
        player.reset_for_round();
    }

    for player in players.iter_mut() {
        for _ in 0..2 {
            if !deal_to(player, &mut shoe) {
                return Ok(RoundResolution::shoe_empty().with_shoe(shoe));
            }
        }
    }

    if !has_playable_non_dealer(players) {
        let resolution = complete_round(players, &mut shoe, dealer_stand_score)?;
        return Ok(resolution.with_shoe(shoe));
    }

    let first = resolve_next_turn_player_id(players);
    log::info!("Round started, {} to act", first);
    Ok(RoundResolution::in_round(first, ROUND_STARTED).with_shoe(shoe))
}

/// Draw one card for the acting player.
pub fn handle_hit(
    players: &mut [Player],
    shoe: &mut Shoe,
    current_turn_player_id: &PlayerId,
    player_index: usize,
    dealer_stand_score: u32,
) -> RoomResult<RoundResolution> {
    let player = &mut players[player_index];
    if !deal_to(player, shoe) {
        return Ok(RoundResolution::shoe_empty());
    }

    let status = format!("{} hit.", player.name);
    let next = if player.is_playing() {
        current_turn_player_id.clone()
    } else {
        log::debug!(
            "{} finished with {} ({:?})",
            player.player_id,
            player.score,
            player.turn_state
        );
        resolve_next_turn_player_id(players)
    };

    if !has_playable_non_dealer(players) {
        return complete_round(players, shoe, dealer_stand_score);
    }

    Ok(RoundResolution::in_round(next, status))
}

/// Mark the acting player as standing and move the turn on.
pub fn handle_stand(
    players: &mut [Player],
    shoe: &mut Shoe,
    player_index: usize,
    dealer_stand_score: u32,
) -> RoomResult<RoundResolution> {
    let player = &mut players[player_index];
    player.turn_state = PlayerTurnState::Standing;
    let status = format!("{} stood.", player.name);

    if !has_playable_non_dealer(players) {
        return complete_round(players, shoe, dealer_stand_score);
    }

    Ok(RoundResolution::in_round(
        resolve_next_turn_player_id(players),
        status,
    ))
}

/// Play out the dealer's hand and settle every non-dealer player.
///
/// The dealer draws while below `dealer_stand_score` and still playing,
/// which skips the draw entirely after a natural 21.
pub fn complete_round(
    players: &mut [Player],
    shoe: &mut Shoe,
    dealer_stand_score: u32,
) -> RoomResult<RoundResolution> {
    let dealer_index = rules::find_dealer(players)?;

    let dealer = &mut players[dealer_index];
    while dealer.score < dealer_stand_score && dealer.is_playing() {
        if !deal_to(dealer, shoe) {
            return Ok(RoundResolution::shoe_empty());
        }
    }
    if dealer.is_playing() {
        dealer.turn_state = PlayerTurnState::Standing;
    }

    let dealer_busted = dealer.turn_state == PlayerTurnState::Busted;
    let dealer_score = dealer.score;
    log::debug!("Dealer finished with {dealer_score} (busted: {dealer_busted})");

    for player in players.iter_mut().filter(|p| !p.is_dealer) {
        player.outcome = settle(player, dealer_busted, dealer_score);
    }

    log::info!("Round ended");
    Ok(RoundResolution::round_ended())
}

fn settle(player: &Player, dealer_busted: bool, dealer_score: u32) -> RoundOutcome {
    if player.turn_state == PlayerTurnState::Busted {
        return RoundOutcome::Lose;
    }
    if dealer_busted {
        return RoundOutcome::Win;
    }
    match player.score.cmp(&dealer_score) {
        std::cmp::Ordering::Greater => RoundOutcome::Win,
        std::cmp::Ordering::Less => RoundOutcome::Lose,
        std::cmp::Ordering::Equal => RoundOutcome::Tie,
    }
}

/// First non-dealer, in seat order, who is still playing. Empty if none.
pub fn resolve_next_turn_player_id(players: &[Player]) -> PlayerId {
    players
        .iter()
        .find(|p| p.can_take_turn())
        .map(|p| p.player_id.clone())
        .unwrap_or_default()
}

pub fn has_playable_non_dealer(players: &[Player]) -> bool {
    players.iter().any(Player::can_take_turn)
}

fn deal_to(player: &mut Player, shoe: &mut Shoe) -> bool {
    match shoe.draw() {
        Some(card) => {
            player.receive(card);
            true
        }
        None => false,
    }
}
