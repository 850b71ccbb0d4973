//! Core identifier and state types shared by every store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a connected player, taken verbatim from the connection path.
///
/// Unique within the process: a second connection claiming the same id
/// takes over the first one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a room. Rooms exist only while they have members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Spawn position handed to every player on join.
pub const SPAWN_X: f64 = 400.0;
pub const SPAWN_Y: f64 = 300.0;

/// Last known game state of a player.
///
/// Trail points are stored as the client sent them (the browser client
/// uses `{x, y, timestamp}` objects) and relayed unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub x: f64,
    pub y: f64,
    pub trail: Vec<serde_json::Value>,
    pub score: i64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            x: SPAWN_X,
            y: SPAWN_Y,
            trail: Vec::new(),
            score: 0,
        }
    }
}

impl PlayerState {
    /// Shallow merge: fields present in `partial` replace the stored ones,
    /// absent fields are left untouched.
    pub fn merge(&mut self, partial: PartialPlayerState) {
        if let Some(x) = partial.x {
            self.x = x;
        }
        if let Some(y) = partial.y {
            self.y = y;
        }
        if let Some(trail) = partial.trail {
            self.trail = trail;
        }
        if let Some(score) = partial.score {
            self.score = score;
        }
    }
}

/// A `playerUpdate` payload. Any subset of the state fields may be present;
/// fields the server does not track are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialPlayerState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trail: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_leaves_absent_fields() {
        let mut state = PlayerState {
            x: 10.0,
            y: 20.0,
            trail: Vec::new(),
            score: 0,
        };
        state.merge(PartialPlayerState {
            score: Some(5),
            ..Default::default()
        });
        assert_eq!(
            state,
            PlayerState {
                x: 10.0,
                y: 20.0,
                trail: Vec::new(),
                score: 5,
            }
        );
    }

    #[test]
    fn partial_state_ignores_unknown_fields() {
        let partial: PartialPlayerState =
            serde_json::from_str(r#"{"x": 1.5, "name": "ghost", "trail": ["⭐", {"x": 1, "y": 2}]}"#)
                .unwrap();
        assert_eq!(partial.x, Some(1.5));
        assert_eq!(partial.y, None);
        assert_eq!(
            partial.trail,
            Some(vec![serde_json::json!("⭐"), serde_json::json!({"x": 1, "y": 2})])
        );
        assert_eq!(partial.score, None);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = PlayerId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        assert_eq!(id.to_string(), "abc");
    }
}
