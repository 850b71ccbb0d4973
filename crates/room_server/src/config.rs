//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize and customize the room server behavior.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration structure for the room server.
///
/// Contains the network settings, the static asset location and the limits
/// applied to every persistent connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Directory holding `index.html` and the files served under `/static`
    pub static_directory: PathBuf,

    /// Maximum number of concurrent player connections allowed
    pub max_connections: usize,

    /// Maximum inbound WebSocket message size in bytes
    pub max_message_size: usize,

    /// Number of outbound messages queued per connection before new ones are dropped
    pub outbound_queue_capacity: usize,

    /// Maximum length of a room or player identifier, in characters
    pub max_id_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8004)),
            static_directory: PathBuf::from("static"),
            max_connections: 1000,
            max_message_size: 64 * 1024, // 64KB
            outbound_queue_capacity: 256,
            max_id_length: 64,
        }
    }
}

impl ServerConfig {
    /// Checks a room or player identifier taken from the connection path.
    ///
    /// Identifiers must be non-empty, no longer than `max_id_length`
    /// characters, and free of control characters and `/`.
    pub fn validate_identifier(&self, kind: &str, value: &str) -> Result<(), crate::ServerError> {
        if value.is_empty() {
            return Err(crate::ServerError::InvalidIdentifier(format!("{kind} id is empty")));
        }
        let length = value.chars().count();
        if length > self.max_id_length {
            return Err(crate::ServerError::InvalidIdentifier(format!(
                "{kind} id is {length} characters, limit is {}",
                self.max_id_length
            )));
        }
        if value.chars().any(|c| c.is_control() || c == '/') {
            return Err(crate::ServerError::InvalidIdentifier(format!(
                "{kind} id contains forbidden characters"
            )));
        }
        Ok(())
    }
}
