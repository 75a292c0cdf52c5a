//! Room coordinator: the single owner of room state.
//!
//! [`GameRoom`] holds players, phase, shoe and turn pointer, and turns each
//! [`RoomCommand`] into a validated mutation. It is moved into a
//! [`CommandProcessor`] task, so handlers never race. [`RoomHandle`] is the
//! cloneable async front door the transport talks to.

use super::{
    commands::{CommandKind, GameNotice, OperationResult, RoomCommand},
    config::RoomConfig,
    processor::CommandProcessor,
    registry::ConnectionRegistry,
};
use crate::game::{
    entities::{ConnectionId, GamePhase, GameState, Player, PlayerId},
    errors::{RoomError, RoomResult, codes},
    round::{self, RoundResolution},
    rules,
    shoe::{DeckSource, Shoe, ShuffledDecks},
};
use std::{future::Future, sync::Arc};
use tokio::sync::{broadcast, oneshot};

pub const DEALER_JOINED: &str = "Dealer joined.";
pub const PLAYER_JOINED: &str = "Player joined.";
pub const PLAYER_LEFT: &str = "Player left.";
pub const PLAYER_DISCONNECTED: &str = "Player disconnected.";
pub const DEALER_LEFT: &str = "Dealer left; game terminated.";
pub const NO_PLAYERS_LEFT: &str = "No players left; round ended.";
pub const GAME_TERMINATED_MESSAGE: &str = "The dealer left, so the game was terminated.";

/// Broadcast results buffered per subscriber before it starts lagging.
const RESULT_BUFFER: usize = 256;

/// All mutable room state.
pub struct GameRoom {
    config: RoomConfig,
    registry: Arc<ConnectionRegistry>,
    deck_source: Box<dyn DeckSource>,

    phase: GamePhase,
    /// Seat order, which is also turn order for non-dealers
    players: Vec<Player>,
    dealer_player_id: PlayerId,
    current_turn_player_id: PlayerId,
    shoe: Option<Shoe>,
    status_message: String,
}

impl GameRoom {
    /// Create an empty room that shuffles with [`ShuffledDecks`], seeded
    /// from `config.shuffle_seed` when set.
    pub fn new(config: RoomConfig) -> Self {
        let deck_source = match config.shuffle_seed {
            Some(seed) => ShuffledDecks::seeded(seed),
            None => ShuffledDecks::from_entropy(),
        };
        Self::with_deck_source(config, Box::new(deck_source))
    }

    pub fn with_deck_source(config: RoomConfig, deck_source: Box<dyn DeckSource>) -> Self {
        Self {
            config,
            registry: Arc::new(ConnectionRegistry::new()),
            deck_source,
            phase: GamePhase::Idle,
            players: Vec::new(),
            dealer_player_id: PlayerId::default(),
            current_turn_player_id: PlayerId::default(),
            shoe: None,
            status_message: String::new(),
        }
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        self.registry.clone()
    }

    /// Deep copy of the current room.
    pub fn snapshot(&self) -> GameState {
        GameState {
            phase: self.phase,
            players: self.players.clone(),
            dealer_player_id: self.dealer_player_id.clone(),
            current_turn_player_id: self.current_turn_player_id.clone(),
            status_message: self.status_message.clone(),
        }
    }

    /// Run one command against the room.
    pub fn apply(&mut self, command: RoomCommand) -> RoomResult<OperationResult> {
        let RoomCommand {
            kind,
            connection_id,
        } = command;
        match kind {
            CommandKind::Join { name, dealer_key } => {
                self.handle_join(connection_id, &name, dealer_key.as_deref())
            }
            CommandKind::Leave => self.handle_leave(&connection_id, false),
            CommandKind::Disconnect => self.handle_leave(&connection_id, true),
            CommandKind::StartRound => self.handle_start_round(&connection_id),
            CommandKind::Hit => self.handle_hit(&connection_id),
            CommandKind::Stand => self.handle_stand(&connection_id),
            CommandKind::Snapshot => Ok(OperationResult::silent(self.snapshot())),
        }
    }

    fn handle_join(
        &mut self,
        connection_id: ConnectionId,
        raw_name: &str,
        dealer_key: Option<&str>,
    ) -> RoomResult<OperationResult> {
        if self.phase != GamePhase::Idle {
            return Err(RoomError::rule(
                codes::GAME_IN_PROGRESS,
                "A round is in progress. Wait for it to end before joining.",
            ));
        }

        if self.registry.contains(&connection_id) {
            return Err(RoomError::validation(
                codes::ALREADY_JOINED,
                "You have already joined.",
            ));
        }

        let name = rules::normalize_name(
            raw_name,
            self.config.min_name_length,
            self.config.max_name_length,
        )?;

        let is_dealer = self.config.is_dealer_key(dealer_key);
        if is_dealer && !self.dealer_player_id.is_empty() {
            return Err(RoomError::rule(
                codes::DEALER_ALREADY_EXISTS,
                "The room already has a dealer.",
            ));
        }

        let player_id: PlayerId = connection_id.clone();
        self.players
            .push(Player::new(player_id.clone(), name.clone(), is_dealer));
        self.registry.add(connection_id, player_id.clone());

        if is_dealer {
            self.dealer_player_id = player_id.clone();
            self.status_message = DEALER_JOINED.to_string();
        } else {
            self.status_message = PLAYER_JOINED.to_string();
        }
        log::info!(
            "{} joined as {} ({} seated)",
            name,
            if is_dealer { "dealer" } else { "player" },
            self.players.len()
        );

        Ok(OperationResult::publish(self.snapshot()))
    }

    fn handle_leave(
        &mut self,
        connection_id: &ConnectionId,
        is_disconnect: bool,
    ) -> RoomResult<OperationResult> {
        let Some(player_id) = self.registry.try_remove(connection_id) else {
            return Ok(OperationResult::silent(self.snapshot()));
        };
        let Ok(index) = rules::find_player(&self.players, &player_id) else {
            return Ok(OperationResult::silent(self.snapshot()));
        };

        let leaving = self.players.remove(index);
        log::info!(
            "{} {}",
            leaving.name,
            if is_disconnect { "disconnected" } else { "left" }
        );

        if leaving.is_dealer {
            return Ok(self.terminate());
        }

        if self.phase == GamePhase::InRound {
            if self.current_turn_player_id == leaving.player_id {
                self.current_turn_player_id = round::resolve_next_turn_player_id(&self.players);
            }

            if !self.players.iter().any(|p| !p.is_dealer) {
                self.phase = GamePhase::Idle;
                self.current_turn_player_id = PlayerId::default();
                self.status_message = NO_PLAYERS_LEFT.to_string();
                log::info!("Round aborted, no players left");
                return Ok(OperationResult::publish(self.snapshot()));
            }

            if !round::has_playable_non_dealer(&self.players) {
                let shoe = self.shoe.as_mut().ok_or_else(shoe_missing)?;
                let resolution = round::complete_round(
                    &mut self.players,
                    shoe,
                    self.config.dealer_stand_score,
                )?;
                return Ok(self.apply_resolution(resolution));
            }
        }

        self.status_message = if is_disconnect {
            PLAYER_DISCONNECTED
        } else {
            PLAYER_LEFT
        }
        .to_string();

        Ok(OperationResult::publish(self.snapshot()))
    }

    /// Dealer departure wipes the room.
    fn terminate(&mut self) -> OperationResult {
        log::warn!("Dealer left, terminating game");

        self.players.clear();
        self.registry.clear();
        self.phase = GamePhase::Idle;
        self.dealer_player_id = PlayerId::default();
        self.current_turn_player_id = PlayerId::default();
        self.shoe = None;
        self.status_message = DEALER_LEFT.to_string();

        OperationResult::publish(self.snapshot()).with_notice(Some(GameNotice::new(
            codes::GAME_TERMINATED,
            GAME_TERMINATED_MESSAGE,
        )))
    }

    fn handle_start_round(&mut self, connection_id: &ConnectionId) -> RoomResult<OperationResult> {
        rules::ensure_can_start_round(
            &self.registry,
            self.phase,
            &self.dealer_player_id,
            connection_id,
            self.players.len(),
            self.config.min_players_to_start,
        )?;

        let shoe = self.deck_source.fresh_shoe(self.config.deck_count);
        let resolution =
            round::start_round(&mut self.players, shoe, self.config.dealer_stand_score)?;

        Ok(self.apply_resolution(resolution))
    }

    fn handle_hit(&mut self, connection_id: &ConnectionId) -> RoomResult<OperationResult> {
        let index = self.validate_action(connection_id)?;
        let shoe = self.shoe.as_mut().ok_or_else(shoe_missing)?;

        let resolution = round::handle_hit(
            &mut self.players,
            shoe,
            &self.current_turn_player_id,
            index,
            self.config.dealer_stand_score,
        )?;

        Ok(self.apply_resolution(resolution))
    }

    fn handle_stand(&mut self, connection_id: &ConnectionId) -> RoomResult<OperationResult> {
        let index = self.validate_action(connection_id)?;
        let shoe = self.shoe.as_mut().ok_or_else(shoe_missing)?;

        let resolution =
            round::handle_stand(&mut self.players, shoe, index, self.config.dealer_stand_score)?;

        Ok(self.apply_resolution(resolution))
    }

    fn validate_action(&self, connection_id: &ConnectionId) -> RoomResult<usize> {
        rules::validate_player_action(
            &self.registry,
            self.phase,
            &self.players,
            connection_id,
            &self.current_turn_player_id,
        )
    }

    fn apply_resolution(&mut self, resolution: RoundResolution) -> OperationResult {
        self.phase = resolution.phase;
        self.current_turn_player_id = resolution.current_turn_player_id;
        self.status_message = resolution.status_message;
        if let Some(shoe) = resolution.shoe {
            self.shoe = Some(shoe);
        }
        OperationResult::publish(self.snapshot())
            .with_notice(resolution.notice)
            .with_round_settled(resolution.settled)
    }
}

fn shoe_missing() -> RoomError {
    RoomError::internal(codes::SHOE_MISSING, "No shoe while a round is in progress")
}

/// Cloneable async API over a [`GameRoom`] running in its own task.
///
/// Every result that changes visible state or carries a notice is also
/// published to subscribers from inside the room task, so subscribers see
/// results in exactly the order the room produced them.
#[derive(Clone)]
pub struct RoomHandle {
    processor: CommandProcessor<GameRoom>,
    registry: Arc<ConnectionRegistry>,
    results: broadcast::Sender<OperationResult>,
}

impl RoomHandle {
    /// Spawn a room task for `config`. Must be called from within a tokio
    /// runtime.
    pub fn new(config: RoomConfig) -> Self {
        Self::spawn(GameRoom::new(config))
    }

    pub fn with_deck_source(config: RoomConfig, deck_source: Box<dyn DeckSource>) -> Self {
        Self::spawn(GameRoom::with_deck_source(config, deck_source))
    }

    pub fn spawn(room: GameRoom) -> Self {
        let registry = room.registry();
        let (results, _) = broadcast::channel(RESULT_BUFFER);
        let publisher = results.clone();
        let processor =
            CommandProcessor::spawn_with_observer(room, move |result: &OperationResult| {
                if result.is_broadcast() {
                    // No subscribers just means nobody is listening.
                    let _ = publisher.send(result.clone());
                }
            });
        Self {
            processor,
            registry,
            results,
        }
    }

    /// Broadcast results from now on, in room order.
    pub fn subscribe(&self) -> broadcast::Receiver<OperationResult> {
        self.results.subscribe()
    }

    /// Current state together with a subscription that starts exactly after
    /// it: every later result arrives on the receiver, no earlier one does.
    pub async fn snapshot_and_subscribe(
        &self,
    ) -> RoomResult<(GameState, broadcast::Receiver<OperationResult>)> {
        let (handoff, receiver) = oneshot::channel();
        let results = self.results.clone();
        let command = RoomCommand::new(CommandKind::Snapshot, ConnectionId::default());

        let snapshot = self
            .processor
            .enqueue(command, move |room| {
                let _ = handoff.send(results.subscribe());
                Ok(OperationResult::silent(room.snapshot()))
            })
            .await?;
        let events = receiver.await.map_err(|_| {
            RoomError::internal(codes::HANDLER_DROPPED, "Subscription was not handed over")
        })?;

        Ok((snapshot.state, events))
    }

    /// Queue a command. Its position is fixed by this call; the returned
    /// future resolves once the command has run.
    pub fn submit(
        &self,
        command: RoomCommand,
    ) -> impl Future<Output = RoomResult<OperationResult>> + Send + use<> {
        self.processor
            .enqueue(command.clone(), move |room| room.apply(command))
    }

    pub async fn join(
        &self,
        connection_id: &ConnectionId,
        name: impl Into<String>,
        dealer_key: Option<String>,
    ) -> RoomResult<OperationResult> {
        let kind = CommandKind::Join {
            name: name.into(),
            dealer_key,
        };
        self.submit(RoomCommand::new(kind, connection_id.clone()))
            .await
    }

    pub async fn leave(&self, connection_id: &ConnectionId) -> RoomResult<OperationResult> {
        self.send(CommandKind::Leave, connection_id).await
    }

    pub async fn disconnect(&self, connection_id: &ConnectionId) -> RoomResult<OperationResult> {
        self.send(CommandKind::Disconnect, connection_id).await
    }

    pub async fn start_round(&self, connection_id: &ConnectionId) -> RoomResult<OperationResult> {
        self.send(CommandKind::StartRound, connection_id).await
    }

    pub async fn hit(&self, connection_id: &ConnectionId) -> RoomResult<OperationResult> {
        self.send(CommandKind::Hit, connection_id).await
    }

    pub async fn stand(&self, connection_id: &ConnectionId) -> RoomResult<OperationResult> {
        self.send(CommandKind::Stand, connection_id).await
    }

    /// Current state, read through the queue so it reflects every command
    /// submitted before it.
    pub async fn snapshot(&self) -> RoomResult<GameState> {
        let result = self
            .send(CommandKind::Snapshot, &ConnectionId::default())
            .await?;
        Ok(result.state)
    }

    /// Membership check that bypasses the queue.
    pub fn is_joined(&self, connection_id: &ConnectionId) -> bool {
        self.registry.contains(connection_id)
    }

    pub fn joined_count(&self) -> usize {
        self.registry.len()
    }

    async fn send(
        &self,
        kind: CommandKind,
        connection_id: &ConnectionId,
    ) -> RoomResult<OperationResult> {
        self.submit(RoomCommand::new(kind, connection_id.clone()))
            .await
    }
}
