//! Message routing logic for dispatching client messages to the room manager.
//!
//! This module handles the parsing of incoming text frames and hands the
//! typed result to [`RoomManager::dispatch`].

use crate::{
    connection::ConnectionId,
    error::ServerError,
    messaging::ClientMessage,
    rooms::RoomManager,
    types::PlayerId,
};
use tracing::trace;

/// Decodes one inbound text frame.
///
/// A frame that is not a JSON object with a string `type` is
/// [`ServerError::InvalidMessage`]. A well-formed frame whose `type` is not
/// handled here is [`ServerError::UnknownMessageType`]; callers treat it as
/// ignorable rather than as a protocol violation.
pub fn decode(text: &str) -> Result<ClientMessage, ServerError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| ServerError::InvalidMessage(format!("Invalid JSON: {e}")))?;

    let kind = value
        .get("type")
        .and_then(|kind| kind.as_str())
        .ok_or_else(|| ServerError::InvalidMessage("missing string field `type`".to_string()))?
        .to_string();

    if !ClientMessage::KINDS.contains(&kind.as_str()) {
        return Err(ServerError::UnknownMessageType(kind));
    }

    serde_json::from_value(value)
        .map_err(|e| ServerError::InvalidMessage(format!("Malformed {kind} payload: {e}")))
}

/// Routes a raw client frame from a player's connection.
///
/// # Arguments
///
/// * `text` - The raw frame text (expected to be JSON)
/// * `player_id` - The player the connection belongs to
/// * `connection_id` - The connection the frame arrived on
/// * `room_manager` - Owner of the room and player stores
///
/// # Returns
///
/// `Ok(())` if the frame was dispatched or deliberately dropped, or a
/// `ServerError` if it could not be decoded. Decoding errors never close
/// the connection.
///
/// Frames that arrive on a connection that has since been superseded by a
/// reconnect of the same player are dropped, so a stale socket cannot
/// mutate the new session's state.
pub async fn route_client_message(
    text: &str,
    player_id: &PlayerId,
    connection_id: ConnectionId,
    room_manager: &RoomManager,
) -> Result<(), ServerError> {
    let message = decode(text)?;

    if !room_manager.is_current(player_id, connection_id).await {
        trace!(
            "📪 Dropping {} from superseded connection {} of player {}",
            message.kind(),
            connection_id,
            player_id
        );
        return Ok(());
    }

    trace!("📨 Routing {} from player {}", message.kind(), player_id);
    room_manager.dispatch(player_id, message).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::ServerMessage;
    use crate::types::{PartialPlayerState, PlayerState, RoomId};
    use serde_json::json;

    #[test]
    fn decodes_player_update() {
        let message = decode(r#"{"type":"playerUpdate","data":{"x":5,"score":2}}"#).unwrap();
        assert_eq!(
            message,
            ClientMessage::PlayerUpdate {
                data: PartialPlayerState {
                    x: Some(5.0),
                    score: Some(2),
                    ..Default::default()
                },
            }
        );
    }

    #[test]
    fn rejects_non_json_and_untyped_frames() {
        assert!(matches!(decode("not json"), Err(ServerError::InvalidMessage(_))));
        assert!(matches!(decode(r#"{"data":{}}"#), Err(ServerError::InvalidMessage(_))));
        assert!(matches!(decode(r#"{"type":7}"#), Err(ServerError::InvalidMessage(_))));
        assert!(matches!(decode("[1,2]"), Err(ServerError::InvalidMessage(_))));
    }

    #[test]
    fn unknown_kind_is_reported_separately() {
        match decode(r#"{"type":"chat","text":"hi"}"#) {
            Err(ServerError::UnknownMessageType(kind)) => assert_eq!(kind, "chat"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn known_kind_with_bad_payload_is_invalid() {
        assert!(matches!(
            decode(r#"{"type":"emojiCollected","emojiIndex":"three"}"#),
            Err(ServerError::InvalidMessage(_))
        ));
    }

    #[tokio::test]
    async fn superseded_connection_cannot_dispatch() {
        let manager = RoomManager::default();
        let mut observer = manager.connect(RoomId::from("r1"), PlayerId::from("A")).await;
        let old = manager.connect(RoomId::from("r1"), PlayerId::from("B")).await;
        let _new = manager.connect(RoomId::from("r1"), PlayerId::from("B")).await;
        while observer.receiver.messages.try_recv().is_ok() {}

        route_client_message(
            r#"{"type":"emojiCollected","emojiIndex":1}"#,
            &old.player_id,
            old.connection_id,
            &manager,
        )
        .await
        .unwrap();
        assert!(observer.receiver.messages.try_recv().is_err());
    }

    #[tokio::test]
    async fn routes_to_room_members() {
        let manager = RoomManager::default();
        let mut a = manager.connect(RoomId::from("r1"), PlayerId::from("A")).await;
        let b = manager.connect(RoomId::from("r1"), PlayerId::from("B")).await;
        while a.receiver.messages.try_recv().is_ok() {}

        route_client_message(
            r#"{"type":"emojiCollected","emojiIndex":2}"#,
            &b.player_id,
            b.connection_id,
            &manager,
        )
        .await
        .unwrap();
        assert_eq!(
            a.receiver.messages.try_recv().ok(),
            Some(ServerMessage::EmojiCollected {
                player_id: PlayerId::from("B"),
                emoji_index: 2,
            })
        );
    }

    #[tokio::test]
    async fn browser_update_with_trail_points_reaches_peers() {
        let manager = RoomManager::default();
        let mut a = manager.connect(RoomId::from("r1"), PlayerId::from("A")).await;
        let b = manager.connect(RoomId::from("r1"), PlayerId::from("B")).await;
        while a.receiver.messages.try_recv().is_ok() {}

        route_client_message(
            r#"{"type":"playerUpdate","data":{"x":412.5,"y":300,"trail":[{"x":400,"y":300,"timestamp":1700000000000}],"score":10}}"#,
            &b.player_id,
            b.connection_id,
            &manager,
        )
        .await
        .unwrap();

        let expected = PlayerState {
            x: 412.5,
            y: 300.0,
            trail: vec![json!({"x": 400, "y": 300, "timestamp": 1700000000000i64})],
            score: 10,
        };
        assert_eq!(
            a.receiver.messages.try_recv().ok(),
            Some(ServerMessage::PlayerUpdate {
                player_id: PlayerId::from("B"),
                data: expected.clone(),
            })
        );
        assert_eq!(manager.player_state(&PlayerId::from("B")), Some(expected));
    }
}
