//! Connection handling logic for WebSocket clients.
//!
//! This module contains the upgrade endpoint and the logic that manages the
//! lifecycle of an individual player connection: admission, message
//! processing and cleanup.

use super::core::AppState;
use crate::{
    error::ServerError,
    messaging::route_client_message,
    rooms::{PlayerSession, RoomManager},
    types::{PlayerId, RoomId},
};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

/// `GET /ws/:room_id/:player_id`
///
/// Refuses the upgrade with 400 for malformed identifiers and with 503 when
/// the server is at capacity or shutting down. Accepted sockets are handed
/// to [`handle_connection`].
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    Path((room_id, player_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Response {
    let checked = state
        .config
        .validate_identifier("room", &room_id)
        .and_then(|_| state.config.validate_identifier("player", &player_id));
    if let Err(e) = checked {
        warn!("🚫 Refusing connection to room {:?} as {:?}: {}", room_id, player_id, e);
        return refuse(StatusCode::BAD_REQUEST, e.to_string());
    }

    if state.shutdown.is_shutdown_initiated() {
        return refuse(StatusCode::SERVICE_UNAVAILABLE, "server is shutting down".to_string());
    }

    let connected = state.room_manager.connection_count().await;
    if connected >= state.config.max_connections {
        warn!(
            "🚫 Connection limit reached ({}/{}), refusing player {}",
            connected, state.config.max_connections, player_id
        );
        return refuse(StatusCode::SERVICE_UNAVAILABLE, "server is full".to_string());
    }

    let room_manager = state.room_manager.clone();
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| async move {
            let room_id = RoomId::new(room_id);
            let player_id = PlayerId::new(player_id);
            handle_connection(socket, room_id, player_id, room_manager).await;
        })
}

fn refuse(status: StatusCode, reason: String) -> Response {
    (status, Json(json!({ "error": reason }))).into_response()
}

/// Handles a single player connection from join to cleanup.
///
/// # Connection Flow
///
/// 1. Join the room through [`RoomManager::connect`]
/// 2. Run the incoming and outgoing tasks until either finishes
/// 3. Leave the room through [`RoomManager::disconnect`]
///
/// # Message Handling
///
/// * **Incoming Task**: Receives frames from the client and routes them
/// * **Outgoing Task**: Drains the connection's outbound queue into the socket
///   and closes the socket when the connection is asked to close
///
/// The disconnect step runs however the tasks ended: a client close, a
/// network error and a forced takeover all take the same path.
pub async fn handle_connection(
    socket: WebSocket,
    room_id: RoomId,
    player_id: PlayerId,
    room_manager: Arc<RoomManager>,
) {
    let PlayerSession {
        player_id,
        room_id,
        connection_id,
        mut receiver,
    } = room_manager.connect(room_id, player_id).await;

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Incoming message task - routes client frames to the room manager
    let incoming_task = async {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match route_client_message(&text, &player_id, connection_id, &room_manager).await {
                        Ok(()) => {}
                        Err(ServerError::UnknownMessageType(kind)) => {
                            debug!("❔ Ignoring unknown message type '{}' from player {}", kind, player_id);
                        }
                        Err(e) => {
                            debug!("❌ Ignoring message from player {}: {}", player_id, e);
                        }
                    }
                }
                Ok(Message::Close(_)) => {
                    debug!("🔌 Player {} requested close on connection {}", player_id, connection_id);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("WebSocket error for player {} (connection {}): {}", player_id, connection_id, e);
                    break;
                }
            }
        }
    };

    // Outgoing message task
    let outgoing_task = async {
        while let Some(message) = receiver.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize {} message: {}", message.kind(), e);
                    continue;
                }
            };
            if let Err(e) = ws_sender.send(Message::Text(text)).await {
                trace!("📭 Send to player {} failed: {}", player_id, e);
                return;
            }
        }
        debug!("🚪 Closing connection {} of player {}", connection_id, player_id);
        let _ = ws_sender.send(Message::Close(None)).await;
    };

    // Run both tasks concurrently until one completes
    tokio::select! {
        _ = incoming_task => {},
        _ = outgoing_task => {},
    }

    room_manager.disconnect(&player_id, connection_id).await;
    trace!("Connection {} of player {} in room {} finished", connection_id, player_id, room_id);
}
