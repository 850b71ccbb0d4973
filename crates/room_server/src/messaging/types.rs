//! Message type definitions for client-server communication.
//!
//! Every frame on the wire is a JSON object with a `type` discriminator and
//! camelCase fields. Inbound frames decode into [`ClientMessage`], outbound
//! frames are produced from [`ServerMessage`].

use crate::types::{PartialPlayerState, PlayerId, PlayerState};
use serde::{Deserialize, Serialize};

/// A message sent from a client to the server.
///
/// # Examples
///
/// ```json
/// { "type": "playerUpdate", "data": { "x": 120.0, "y": 88.5, "score": 3 } }
/// { "type": "emojiCollected", "emojiIndex": 4 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Partial state update; merged into the sender's stored state
    PlayerUpdate { data: PartialPlayerState },

    /// The sender collected the emoji at `emoji_index` on its board
    #[serde(rename_all = "camelCase")]
    EmojiCollected { emoji_index: i64 },
}

impl ClientMessage {
    /// Every `type` value the router knows how to handle.
    pub const KINDS: [&'static str; 2] = ["playerUpdate", "emojiCollected"];

    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::PlayerUpdate { .. } => "playerUpdate",
            ClientMessage::EmojiCollected { .. } => "emojiCollected",
        }
    }
}

/// One entry of a `roomState` snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub data: PlayerState,
}

/// A message sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Sent once to a joining player: every other member, in join order
    RoomState { players: Vec<PlayerSnapshot> },

    #[serde(rename_all = "camelCase")]
    PlayerJoined { player_id: PlayerId, data: PlayerState },

    #[serde(rename_all = "camelCase")]
    PlayerLeft { player_id: PlayerId },

    #[serde(rename_all = "camelCase")]
    PlayerUpdate { player_id: PlayerId, data: PlayerState },

    #[serde(rename_all = "camelCase")]
    EmojiCollected { player_id: PlayerId, emoji_index: i64 },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::RoomState { .. } => "roomState",
            ServerMessage::PlayerJoined { .. } => "playerJoined",
            ServerMessage::PlayerLeft { .. } => "playerLeft",
            ServerMessage::PlayerUpdate { .. } => "playerUpdate",
            ServerMessage::EmojiCollected { .. } => "emojiCollected",
        }
    }

    /// Serializes the message into its wire representation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
