//! Client connection representation.
//!
//! A [`PlayerConnection`] is the registry's half of one physical connection:
//! a bounded queue of outbound messages plus a close signal. The other half,
//! [`ConnectionReceiver`], is owned by the task that writes to the socket.

use super::ConnectionId;
use crate::messaging::ServerMessage;
use crate::types::RoomId;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{mpsc, Notify};

/// Why a message could not be queued for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// The writer side is gone; the connection already terminated
    Closed,
    /// The outbound queue is full; the message was dropped
    QueueFull,
}

/// Represents an individual player connection tracked by the registry.
///
/// # Fields
///
/// * `id` - Process-unique id of this physical connection
/// * `room_id` - The room the player joined through this connection
/// * `connected_at` - Timestamp when the connection was established
#[derive(Debug, Clone)]
pub struct PlayerConnection {
    /// Unique id of this connection
    pub id: ConnectionId,

    /// The room this connection is scoped to
    pub room_id: RoomId,

    /// When this connection was established
    pub connected_at: SystemTime,

    sender: mpsc::Sender<ServerMessage>,
    close_signal: Arc<Notify>,
}

/// Receiving half of a connection, drained by the socket writer.
#[derive(Debug)]
pub struct ConnectionReceiver {
    /// Outbound messages in the order they were queued
    pub messages: mpsc::Receiver<ServerMessage>,
    close_signal: Arc<Notify>,
}

impl PlayerConnection {
    /// Creates a connection handle with an outbound queue of `capacity` messages.
    pub fn new(id: ConnectionId, room_id: RoomId, capacity: usize) -> (Self, ConnectionReceiver) {
        let (sender, messages) = mpsc::channel(capacity.max(1));
        let close_signal = Arc::new(Notify::new());
        let connection = Self {
            id,
            room_id,
            connected_at: SystemTime::now(),
            sender,
            close_signal: close_signal.clone(),
        };
        (connection, ConnectionReceiver { messages, close_signal })
    }

    /// Queues a message without waiting.
    pub fn send(&self, message: ServerMessage) -> Result<(), SendFailure> {
        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendFailure::QueueFull,
            mpsc::error::TrySendError::Closed(_) => SendFailure::Closed,
        })
    }

    /// Asks the writer to close the socket. The permit is stored, so a close
    /// requested before the writer starts waiting is not lost.
    pub fn close(&self) {
        self.close_signal.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl ConnectionReceiver {
    /// Next outbound message, or `None` once the connection was asked to
    /// close or every sender is gone. A close request wins over queued
    /// messages.
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        tokio::select! {
            biased;
            _ = self.close_signal.notified() => None,
            message = self.messages.recv() => message,
        }
    }

    /// Resolves once [`PlayerConnection::close`] has been called.
    pub async fn closed(&self) {
        self.close_signal.notified().await;
    }
}
