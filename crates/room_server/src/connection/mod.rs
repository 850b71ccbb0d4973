//! Connection management for player connections.
//!
//! This module handles the lifecycle of player connections, including
//! connection tracking, per-connection outbound queues, and message delivery.

pub mod client;
pub mod registry;

pub use client::{ConnectionReceiver, PlayerConnection, SendFailure};
pub use registry::ConnectionRegistry;

/// Type alias for connection identifiers.
///
/// Connection IDs are used to uniquely identify client connections
/// throughout their lifecycle on the server. A player that reconnects
/// keeps its player id but gets a fresh connection id.
pub type ConnectionId = usize;
