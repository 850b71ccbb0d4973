//! # Room Server
//!
//! Real-time room coordination for the Emoji Trail browser game. Players
//! open a WebSocket scoped to a room and a player id, exchange position and
//! score updates with the other members, and are told when members join or
//! leave.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Connection Registry** - player id to its current connection handle
//! * **Room Index** - room id to its members in join order
//! * **Player State Store** - last known `{x, y, trail, score}` per player
//! * **Room Manager** - owns the three stores and runs join, leave and
//!   message dispatch
//! * **Message Router** - decodes client frames and hands them to the
//!   room manager
//!
//! ### Message Flow
//!
//! 1. A client connects to `/ws/{room}/{player}`
//! 2. It receives `roomState` with every other member; the others receive
//!   `playerJoined`
//! 3. `playerUpdate` frames are merged into the sender's state and relayed
//!   to the rest of the room; `emojiCollected` frames are relayed to
//!   everyone, sender included
//! 4. When the socket ends for any reason the room receives `playerLeft`
//!
//! Outbound delivery is best effort: each connection has a bounded queue
//! drained by its own writer, so a slow or dead client never stalls a
//! broadcast.
//!
//! ## HTTP Endpoints
//!
//! * `GET /` and `GET /static/*path` - the game client
//! * `POST /generate` - trail puzzles for the single-player mode
//! * `GET /stats` - room and player counts
//!
//! ## Error Handling
//!
//! [`ServerError`] covers binding failures and malformed client frames.
//! No error is fatal to the process: a bad frame is logged and ignored and
//! a broken connection is cleaned up like a regular close.

// Re-export core types and functions for easy access
pub use config::ServerConfig;
pub use error::ServerError;
pub use rooms::{PlayerSession, RoomManager, RoomStats};
pub use server::RoomServer;
pub use shutdown::ShutdownState;
pub use utils::{create_server, create_server_with_config};

// Public module declarations
pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod rooms;
pub mod server;
pub mod shutdown;
pub mod trail;
pub mod types;
pub mod utils;

#[cfg(test)]
mod tests;
