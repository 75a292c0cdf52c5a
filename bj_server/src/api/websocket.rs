//! WebSocket handler for the shared room.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /blackjack` and is given a fresh connection id
//! 2. Server sends the current room state before any other event
//! 3. Server spawns a send task that forwards room-wide events and replies
//! 4. Incoming client messages are submitted to the room one by one
//! 5. On close, the server submits a disconnect for the connection
//!
//! # Client Messages
//!
//! ```json
//! {"type": "join", "name": "Alice", "dealer_key": "optional"}
//! {"type": "leave"}
//! {"type": "start_round"}
//! {"type": "hit"}
//! {"type": "stand"}
//! ```
//!
//! # Server Messages
//!
//! - `state_changed`: full room snapshot, sent to every socket
//! - `error`: `{code, message}`, sent to the caller for rejected commands and
//!   to every socket for room-wide notices (`GAME_TERMINATED`, `SHOE_EMPTY`)

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use blackjack_room::{CommandKind, ConnectionId, GameState, OperationResult, RoomCommand};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use uuid::Uuid;

use super::AppState;
use crate::metrics;

/// Code sent back when a frame is not a valid [`ClientMessage`].
pub const INVALID_MESSAGE: &str = "INVALID_MESSAGE";

/// Client messages received via WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Take a seat; a matching dealer key claims the dealer role
    Join {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dealer_key: Option<String>,
    },
    Leave,
    StartRound,
    Hit,
    Stand,
}

impl From<ClientMessage> for CommandKind {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Join { name, dealer_key } => CommandKind::Join { name, dealer_key },
            ClientMessage::Leave => CommandKind::Leave,
            ClientMessage::StartRound => CommandKind::StartRound,
            ClientMessage::Hit => CommandKind::Hit,
            ClientMessage::Stand => CommandKind::Stand,
        }
    }
}

/// Messages sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    StateChanged { state: GameState },
    Error { code: String, message: String },
}

impl ServerMessage {
    /// Frames every socket receives for a room result: the notice first,
    /// then the state if it changed.
    pub fn broadcast_frames(result: &OperationResult) -> Vec<ServerMessage> {
        let mut frames = Vec::with_capacity(2);
        if let Some(notice) = &result.notice {
            frames.push(ServerMessage::Error {
                code: notice.code.clone(),
                message: notice.message.clone(),
            });
        }
        if result.should_publish_state {
            frames.push(ServerMessage::StateChanged {
                state: result.state.clone(),
            });
        }
        frames
    }
}

/// Upgrade HTTP connection to WebSocket for the room.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection until it closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new(Uuid::new_v4().to_string());
    let (mut sender, mut receiver) = socket.split();

    info!("WebSocket connected: {}", connection_id);
    metrics::websocket_connected();

    // The subscription starts exactly after the greeting snapshot, so the
    // socket never sees a result older than the state it was greeted with.
    let (snapshot, mut events) = match state.room.snapshot_and_subscribe().await {
        Ok(greeting) => greeting,
        Err(e) => {
            error!("Failed to read room state for {}: {}", connection_id, e);
            metrics::websocket_disconnected();
            return;
        }
    };
    if let Some(json) = encode(&ServerMessage::StateChanged { state: snapshot })
        && sender.send(Message::Text(json.into())).await.is_err()
    {
        warn!("Failed to greet {}", connection_id);
    }

    let (reply_tx, mut reply_rx) = mpsc::channel::<String>(32);

    // Spawn task that forwards room-wide events and direct replies
    let send_id = connection_id.clone();
    let send_task = tokio::spawn(async move {
        loop {
            let frames: Vec<String> = tokio::select! {
                event = events.recv() => match event {
                    Ok(result) => ServerMessage::broadcast_frames(&result)
                        .iter()
                        .filter_map(encode)
                        .collect(),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Connection {} lagged, skipped {} events", send_id, skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                reply = reply_rx.recv() => match reply {
                    Some(json) => vec![json],
                    None => break,
                },
            };

            for json in frames {
                if sender.send(Message::Text(json.into())).await.is_err() {
                    return;
                }
            }
        }
    });

    // Receive messages from client
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                metrics::websocket_messages_received();
                debug!("Received message from {}: {}", connection_id, text.as_str());

                if let Some(reply) = handle_client_text(text.as_str(), &connection_id, &state).await
                    && let Some(json) = encode(&reply)
                    && reply_tx.send(json).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                warn!("WebSocket error on {}: {}", connection_id, e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();

    // The room ignores disconnects from connections that never joined.
    match state.room.disconnect(&connection_id).await {
        Ok(result) => state.record(&result),
        Err(e) => warn!("Disconnect for {} failed: {}", connection_id, e),
    }

    metrics::websocket_disconnected();
    info!("WebSocket disconnected: {}", connection_id);
}

/// Submit one client frame to the room.
///
/// Successful results reach every socket through the room subscription; the
/// return value is the reply meant only for the caller, if any.
pub async fn handle_client_text(
    text: &str,
    connection_id: &ConnectionId,
    state: &AppState,
) -> Option<ServerMessage> {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            warn!("Failed to parse message from {}: {}", connection_id, e);
            return Some(ServerMessage::Error {
                code: INVALID_MESSAGE.to_string(),
                message: "Invalid message format".to_string(),
            });
        }
    };

    let kind = CommandKind::from(message);
    let label = kind.label();

    match state
        .room
        .submit(RoomCommand::new(kind, connection_id.clone()))
        .await
    {
        Ok(result) => {
            metrics::room_commands_total(label, "ok");
            state.record(&result);
            None
        }
        Err(err) => {
            metrics::room_commands_total(label, &err.kind.to_string());
            Some(ServerMessage::Error {
                code: err.code.to_string(),
                message: err.client_message(),
            })
        }
    }
}

fn encode(message: &ServerMessage) -> Option<String> {
    serde_json::to_string(message)
        .map_err(|e| error!("Failed to serialize message: {}", e))
        .ok()
}
