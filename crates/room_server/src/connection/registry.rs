//! Registry of live player connections.
//!
//! Maps each connected player to the handle of its current connection and
//! delivers outbound messages to it. Sending never blocks and never fails
//! loudly: a recipient that disconnected between broadcast enumeration and
//! delivery is an expected race.

use super::{client::SendFailure, ConnectionId, PlayerConnection};
use crate::messaging::ServerMessage;
use crate::types::{PlayerId, RoomId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, trace, warn};

/// Central registry for all player connections.
///
/// Uses `RwLock<HashMap>` for thread-safe storage. The lock is only held
/// for the map access itself; queuing a message is a non-blocking
/// `try_send`, so no lock is ever held across a socket operation.
#[derive(Debug, Default, Clone)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<PlayerId, PlayerConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the connection for a player.
    ///
    /// Any previous entry for the same player is replaced and returned so
    /// the caller can close it; a reconnection is not an error.
    pub async fn register(
        &self,
        player_id: PlayerId,
        connection: PlayerConnection,
    ) -> Option<PlayerConnection> {
        let connection_id = connection.id;
        let previous = {
            let mut connections = self.connections.write().await;
            connections.insert(player_id.clone(), connection)
        };

        match &previous {
            Some(old) if !old.is_closed() => {
                warn!(
                    "♻️ Player {} reconnected: connection {} supersedes live connection {}",
                    player_id, connection_id, old.id
                );
            }
            _ => info!("🔗 Player {} registered on connection {}", player_id, connection_id),
        }
        previous
    }

    /// Removes a player's entry. Idempotent.
    pub async fn unregister(&self, player_id: &PlayerId) -> Option<PlayerConnection> {
        let mut connections = self.connections.write().await;
        connections.remove(player_id)
    }

    /// Removes a player's entry only if it still belongs to `connection_id`.
    ///
    /// Returns the removed handle. A connection that was superseded by a
    /// newer one for the same player gets `None` here, which makes the
    /// disconnect path run exactly once per connection.
    pub async fn unregister_connection(
        &self,
        player_id: &PlayerId,
        connection_id: ConnectionId,
    ) -> Option<PlayerConnection> {
        let mut connections = self.connections.write().await;
        match connections.get(player_id) {
            Some(current) if current.id == connection_id => connections.remove(player_id),
            _ => None,
        }
    }

    /// Queues a message for a player.
    ///
    /// Returns `true` if the message was queued. An absent player, a closed
    /// connection or a full queue all yield `false` without raising.
    pub async fn send_to(&self, player_id: &PlayerId, message: ServerMessage) -> bool {
        let connections = self.connections.read().await;
        let Some(connection) = connections.get(player_id) else {
            trace!("📭 Dropping {} for absent player {}", message.kind(), player_id);
            return false;
        };

        match connection.send(message) {
            Ok(()) => true,
            Err(SendFailure::Closed) => {
                trace!("📭 Connection {} of player {} already closed", connection.id, player_id);
                false
            }
            Err(SendFailure::QueueFull) => {
                warn!(
                    "🐌 Outbound queue full for player {} (connection {}), message dropped",
                    player_id, connection.id
                );
                false
            }
        }
    }

    /// Whether `connection_id` is the player's current connection.
    pub async fn is_current(&self, player_id: &PlayerId, connection_id: ConnectionId) -> bool {
        let connections = self.connections.read().await;
        connections
            .get(player_id)
            .is_some_and(|connection| connection.id == connection_id)
    }

    /// The room the player's current connection is scoped to.
    pub async fn room_of(&self, player_id: &PlayerId) -> Option<RoomId> {
        let connections = self.connections.read().await;
        connections.get(player_id).map(|connection| connection.room_id.clone())
    }

    /// Signals every registered connection to close.
    pub async fn close_all(&self) -> usize {
        let connections = self.connections.read().await;
        for connection in connections.values() {
            connection.close();
        }
        connections.len()
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left(id: &str) -> ServerMessage {
        ServerMessage::PlayerLeft {
            player_id: PlayerId::from(id),
        }
    }

    #[tokio::test]
    async fn send_to_absent_player_is_silent() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send_to(&PlayerId::from("ghost"), left("x")).await);
    }

    #[tokio::test]
    async fn send_to_registered_player_is_queued() {
        let registry = ConnectionRegistry::new();
        let (connection, mut receiver) = PlayerConnection::new(1, RoomId::from("r1"), 8);
        registry.register(PlayerId::from("a"), connection).await;

        assert!(registry.send_to(&PlayerId::from("a"), left("b")).await);
        assert_eq!(receiver.messages.recv().await, Some(left("b")));
        assert_eq!(registry.room_of(&PlayerId::from("a")).await, Some(RoomId::from("r1")));
    }

    #[tokio::test]
    async fn send_to_closed_connection_is_silent() {
        let registry = ConnectionRegistry::new();
        let (connection, receiver) = PlayerConnection::new(1, RoomId::from("r1"), 8);
        registry.register(PlayerId::from("a"), connection).await;
        drop(receiver);

        assert!(!registry.send_to(&PlayerId::from("a"), left("b")).await);
    }

    #[tokio::test]
    async fn register_returns_superseded_connection() {
        let registry = ConnectionRegistry::new();
        let (first, _first_rx) = PlayerConnection::new(1, RoomId::from("r1"), 8);
        let (second, _second_rx) = PlayerConnection::new(2, RoomId::from("r2"), 8);

        assert!(registry.register(PlayerId::from("a"), first).await.is_none());
        let previous = registry.register(PlayerId::from("a"), second).await;
        assert_eq!(previous.map(|c| c.id), Some(1));
        assert!(registry.is_current(&PlayerId::from("a"), 2).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (connection, _rx) = PlayerConnection::new(1, RoomId::from("r1"), 8);
        registry.register(PlayerId::from("a"), connection).await;

        assert!(registry.unregister(&PlayerId::from("a")).await.is_some());
        assert!(registry.unregister(&PlayerId::from("a")).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn stale_connection_cannot_unregister_newer_one() {
        let registry = ConnectionRegistry::new();
        let (first, _first_rx) = PlayerConnection::new(1, RoomId::from("r1"), 8);
        let (second, _second_rx) = PlayerConnection::new(2, RoomId::from("r1"), 8);
        registry.register(PlayerId::from("a"), first).await;
        registry.register(PlayerId::from("a"), second).await;

        assert!(registry.unregister_connection(&PlayerId::from("a"), 1).await.is_none());
        assert!(registry.is_current(&PlayerId::from("a"), 2).await);
        assert!(registry.unregister_connection(&PlayerId::from("a"), 2).await.is_some());
        assert!(registry.unregister_connection(&PlayerId::from("a"), 2).await.is_none());
    }
}
