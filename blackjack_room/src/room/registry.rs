//! Connection-to-player mapping.

use crate::game::entities::{ConnectionId, PlayerId};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Thread-safe mapping from connection id to player id.
///
/// Every operation runs under one lock so membership checks made from
/// outside the command loop see a consistent view.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, PlayerId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConnectionId, PlayerId>> {
        // The map holds plain data, so a panic elsewhere cannot leave it
        // half-written.
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.lock().contains_key(connection_id)
    }

    /// Add or overwrite the mapping for `connection_id`.
    pub fn add(&self, connection_id: ConnectionId, player_id: PlayerId) {
        self.lock().insert(connection_id, player_id);
    }

    /// Remove the mapping, returning the player id it pointed to.
    pub fn try_remove(&self, connection_id: &ConnectionId) -> Option<PlayerId> {
        self.lock().remove(connection_id)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
