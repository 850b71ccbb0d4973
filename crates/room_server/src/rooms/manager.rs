//! Room manager: player lifecycle and room fan-out.
//!
//! The manager exclusively owns the connection registry, the room index and
//! the player state store. Every mutation of player or room state goes
//! through [`RoomManager::connect`], [`RoomManager::disconnect`] or
//! [`RoomManager::dispatch`].

use super::{PlayerStateStore, RoomIndex};
use crate::connection::{ConnectionId, ConnectionReceiver, ConnectionRegistry, PlayerConnection};
use crate::messaging::{ClientMessage, PlayerSnapshot, ServerMessage};
use crate::types::{PlayerId, RoomId};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// What a connection handler holds for the lifetime of one connection.
#[derive(Debug)]
pub struct PlayerSession {
    pub player_id: PlayerId,
    pub room_id: RoomId,
    pub connection_id: ConnectionId,
    /// Outbound messages for this connection and its close signal
    pub receiver: ConnectionReceiver,
}

/// Point-in-time counters for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoomStats {
    pub rooms: usize,
    pub players: usize,
}

/// Composes the three stores and runs the join/leave protocol.
///
/// Joins and leaves are serialized by a lifecycle guard, so a joining player's
/// `roomState` snapshot and the `playerJoined`/`playerLeft` announcements are
/// consistent with each other. The guard is never held across socket I/O:
/// outbound messages are only queued. Message dispatch does not take it.
#[derive(Debug)]
pub struct RoomManager {
    connections: ConnectionRegistry,
    rooms: RoomIndex,
    states: PlayerStateStore,
    lifecycle: Mutex<()>,
    next_connection_id: AtomicUsize,
    outbound_queue_capacity: usize,
}

impl RoomManager {
    pub fn new(outbound_queue_capacity: usize) -> Self {
        Self {
            connections: ConnectionRegistry::new(),
            rooms: RoomIndex::new(),
            states: PlayerStateStore::new(),
            lifecycle: Mutex::new(()),
            next_connection_id: AtomicUsize::new(1),
            outbound_queue_capacity,
        }
    }

    /// Admits a player into a room.
    ///
    /// Registers a fresh connection, seeds the player's state, adds it to the
    /// room, sends it a `roomState` snapshot of the other members and
    /// announces `playerJoined` to them. If the player id is already
    /// connected, the old connection is closed and removed first (forced
    /// takeover), then the join proceeds as a fresh one.
    pub async fn connect(&self, room_id: RoomId, player_id: PlayerId) -> PlayerSession {
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        let (connection, receiver) =
            PlayerConnection::new(connection_id, room_id.clone(), self.outbound_queue_capacity);

        let _guard = self.lifecycle.lock().await;

        if let Some(previous) = self.connections.register(player_id.clone(), connection).await {
            self.evict(&player_id, previous).await;
        }

        let initial = self.states.init(&player_id);
        self.rooms.add_member(&room_id, &player_id).await;

        let players = self.snapshot(&room_id, &player_id).await;
        let existing = players.len();
        self.connections
            .send_to(&player_id, ServerMessage::RoomState { players })
            .await;

        self.broadcast(
            &room_id,
            ServerMessage::PlayerJoined {
                player_id: player_id.clone(),
                data: initial,
            },
            Some(&player_id),
        )
        .await;

        info!(
            "🎮 Player {} joined room {} on connection {} ({} other member(s))",
            player_id, room_id, connection_id, existing
        );

        PlayerSession {
            player_id,
            room_id,
            connection_id,
            receiver,
        }
    }

    /// Removes a player whose connection ended and announces `playerLeft`.
    ///
    /// Only acts if `connection_id` is still the player's current
    /// connection, so it runs exactly once per connection and a superseded
    /// connection cannot tear down its replacement. Returns `true` if the
    /// player was removed.
    pub async fn disconnect(&self, player_id: &PlayerId, connection_id: ConnectionId) -> bool {
        let _guard = self.lifecycle.lock().await;

        let Some(connection) = self
            .connections
            .unregister_connection(player_id, connection_id)
            .await
        else {
            debug!(
                "Connection {} of player {} already superseded or removed",
                connection_id, player_id
            );
            return false;
        };

        let session = connection.connected_at.elapsed().unwrap_or_default();
        let room_id = connection.room_id;
        self.rooms.remove_member(&room_id, player_id).await;
        self.states.remove(player_id);

        let notified = self
            .broadcast(
                &room_id,
                ServerMessage::PlayerLeft {
                    player_id: player_id.clone(),
                },
                None,
            )
            .await;

        info!(
            "👋 Player {} left room {} after {:.1}s (connection {}, {} member(s) notified)",
            player_id,
            room_id,
            session.as_secs_f64(),
            connection_id,
            notified
        );
        true
    }

    /// Applies one decoded message from a player's connection.
    ///
    /// Messages from players that are no longer registered are dropped.
    pub async fn dispatch(&self, player_id: &PlayerId, message: ClientMessage) {
        let Some(room_id) = self.connections.room_of(player_id).await else {
            debug!("Dropping {} from unregistered player {}", message.kind(), player_id);
            return;
        };

        match message {
            ClientMessage::PlayerUpdate { data } => {
                let Some(state) = self.states.merge(player_id, data) else {
                    return;
                };
                self.broadcast(
                    &room_id,
                    ServerMessage::PlayerUpdate {
                        player_id: player_id.clone(),
                        data: state,
                    },
                    Some(player_id),
                )
                .await;
            }
            ClientMessage::EmojiCollected { emoji_index } => {
                let delivered = self
                    .broadcast(
                        &room_id,
                        ServerMessage::EmojiCollected {
                            player_id: player_id.clone(),
                            emoji_index,
                        },
                        None,
                    )
                    .await;
                debug!(
                    "⭐ Player {} collected emoji {} in room {} ({} recipient(s))",
                    player_id, emoji_index, room_id, delivered
                );
            }
        }
    }

    /// Sends `message` to every current member of a room, optionally
    /// skipping one player.
    ///
    /// Each delivery is independent: a member that is gone or whose queue is
    /// full does not affect the others. Returns the number of members the
    /// message was queued for.
    pub async fn broadcast(
        &self,
        room_id: &RoomId,
        message: ServerMessage,
        exclude: Option<&PlayerId>,
    ) -> usize {
        let members = self.rooms.members_of(room_id).await;
        let mut delivered = 0;
        for member in members.iter().filter(|member| Some(*member) != exclude) {
            if self.connections.send_to(member, message.clone()).await {
                delivered += 1;
            }
        }
        delivered
    }

    /// Signals every live connection to close. Each connection's handler
    /// then runs the regular disconnect path.
    pub async fn close_all(&self) -> usize {
        self.connections.close_all().await
    }

    pub async fn stats(&self) -> RoomStats {
        RoomStats {
            rooms: self.rooms.room_count().await,
            players: self.connections.len().await,
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.len().await
    }

    pub async fn is_current(&self, player_id: &PlayerId, connection_id: ConnectionId) -> bool {
        self.connections.is_current(player_id, connection_id).await
    }

    /// Ids of every open room, sorted.
    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.room_ids().await
    }

    pub async fn members_of(&self, room_id: &RoomId) -> Vec<PlayerId> {
        self.rooms.members_of(room_id).await
    }

    pub fn player_state(&self, player_id: &PlayerId) -> Option<crate::types::PlayerState> {
        self.states.get(player_id)
    }

    /// Snapshot of every member except `joining`, in join order.
    async fn snapshot(&self, room_id: &RoomId, joining: &PlayerId) -> Vec<PlayerSnapshot> {
        self.rooms
            .members_of(room_id)
            .await
            .into_iter()
            .filter(|member| member != joining)
            .filter_map(|member| {
                self.states
                    .get(&member)
                    .map(|data| PlayerSnapshot { id: member, data })
            })
            .collect()
    }

    /// Tears down a connection superseded by a reconnect of the same player.
    async fn evict(&self, player_id: &PlayerId, previous: PlayerConnection) {
        previous.close();
        self.rooms.remove_member(&previous.room_id, player_id).await;
        self.states.remove(player_id);
        self.broadcast(
            &previous.room_id,
            ServerMessage::PlayerLeft {
                player_id: player_id.clone(),
            },
            None,
        )
        .await;
        info!(
            "♻️ Player {} taken over: connection {} in room {} closed",
            player_id, previous.id, previous.room_id
        );
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(crate::ServerConfig::default().outbound_queue_capacity)
    }
}
