//! Room membership index.
//!
//! Rooms are created lazily on first join and removed as soon as their last
//! member leaves, so every room observable here has at least one member.

use crate::types::{PlayerId, RoomId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Mapping from room to its members in join order.
#[derive(Debug, Default, Clone)]
pub struct RoomIndex {
    rooms: Arc<RwLock<HashMap<RoomId, Vec<PlayerId>>>>,
}

impl RoomIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a player to a room, creating the room if needed. Idempotent.
    pub async fn add_member(&self, room_id: &RoomId, player_id: &PlayerId) {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room_id.clone()).or_insert_with(|| {
            debug!("🏠 Room {} created", room_id);
            Vec::new()
        });
        if !members.contains(player_id) {
            members.push(player_id.clone());
        }
    }

    /// Removes a player from a room and drops the room once it is empty.
    ///
    /// Returns `true` if the player was a member.
    pub async fn remove_member(&self, room_id: &RoomId, player_id: &PlayerId) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(room_id) else {
            return false;
        };

        let before = members.len();
        members.retain(|member| member != player_id);
        let removed = members.len() != before;

        if members.is_empty() {
            rooms.remove(room_id);
            debug!("🧹 Room {} removed (no members left)", room_id);
        }
        removed
    }

    /// Current members in join order; empty for an unknown room.
    pub async fn members_of(&self, room_id: &RoomId) -> Vec<PlayerId> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).cloned().unwrap_or_default()
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn room_ids(&self) -> Vec<RoomId> {
        let rooms = self.rooms.read().await;
        let mut ids: Vec<RoomId> = rooms.keys().cloned().collect();
        ids.sort();
        ids
    }
}
