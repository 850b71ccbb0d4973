//! Factory functions for building room servers.

use crate::{config::ServerConfig, server::RoomServer};

/// Creates a room server with the default configuration
/// (`127.0.0.1:8004`, assets from `./static`).
///
/// # Example
///
/// ```rust
/// use room_server::create_server;
///
/// let server = create_server();
/// assert_eq!(server.config().bind_address.port(), 8004);
/// ```
pub fn create_server() -> RoomServer {
    RoomServer::new(ServerConfig::default())
}

/// Creates a room server with a custom configuration.
///
/// # Example
///
/// ```rust
/// use room_server::{create_server_with_config, ServerConfig};
///
/// let config = ServerConfig {
///     bind_address: "0.0.0.0:9000".parse().unwrap(),
///     max_connections: 5000,
///     outbound_queue_capacity: 64,
///     ..Default::default()
/// };
///
/// let server = create_server_with_config(config);
/// ```
pub fn create_server_with_config(config: ServerConfig) -> RoomServer {
    RoomServer::new(config)
}
