//! The shared room: state ownership and command serialization.
//!
//! This module implements:
//! - GameRoom: owner of players, phase, shoe and turn pointer
//! - CommandProcessor: single-consumer queue that runs one command at a time
//! - RoomHandle: cloneable async API used by the connection transport
//!
//! ## Architecture
//!
//! The room runs in a separate Tokio task behind an unbounded mpsc queue.
//! Callers enqueue commands from any number of tasks; each command is
//! validated and applied against the latest state, and its caller gets an
//! [`OperationResult`] or a [`RoomError`](crate::RoomError) back over a
//! oneshot channel.
//!
//! ## Example
//!
//! ```no_run
//! use blackjack_room::room::{RoomConfig, RoomHandle};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RoomConfig {
//!         dealer_key: Some("house".to_string()),
//!         ..Default::default()
//!     };
//!     let room = RoomHandle::new(config);
//!
//!     let dealer = "conn-1".into();
//!     let alice = "conn-2".into();
//!     room.join(&dealer, "Dealer", Some("house".to_string())).await.unwrap();
//!     room.join(&alice, "Alice", None).await.unwrap();
//!
//!     let result = room.start_round(&dealer).await.unwrap();
//!     println!("{}", result.state.status_message);
//! }
//! ```

pub mod commands;
pub mod config;
pub mod coordinator;
pub mod processor;
pub mod registry;

pub use commands::{CommandKind, GameNotice, OperationResult, RoomCommand};
pub use config::RoomConfig;
pub use coordinator::{GameRoom, RoomHandle};
pub use processor::CommandProcessor;
pub use registry::ConnectionRegistry;
