//! Last known game state per player.

use crate::types::{PartialPlayerState, PlayerId, PlayerState};
use dashmap::DashMap;
use std::sync::Arc;

/// Per-player state store.
///
/// Backed by `DashMap`, so each operation locks only the shard holding the
/// player and a merge is applied atomically with respect to other merges.
#[derive(Debug, Default, Clone)]
pub struct PlayerStateStore {
    states: Arc<DashMap<PlayerId, PlayerState>>,
}

impl PlayerStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the join defaults for a player, replacing anything stored before.
    pub fn init(&self, player_id: &PlayerId) -> PlayerState {
        let state = PlayerState::default();
        self.states.insert(player_id.clone(), state.clone());
        state
    }

    /// Shallow-merges `partial` into the stored state and returns the result.
    ///
    /// Unknown players are ignored (`None`): the player may have
    /// disconnected while its update was in flight.
    pub fn merge(&self, player_id: &PlayerId, partial: PartialPlayerState) -> Option<PlayerState> {
        let mut entry = self.states.get_mut(player_id)?;
        entry.value_mut().merge(partial);
        Some(entry.value().clone())
    }

    pub fn get(&self, player_id: &PlayerId) -> Option<PlayerState> {
        self.states.get(player_id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, player_id: &PlayerId) -> Option<PlayerState> {
        self.states.remove(player_id).map(|(_, state)| state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
