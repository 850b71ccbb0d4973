//! Core room server implementation.
//!
//! This module contains the main `RoomServer` struct, which owns the single
//! [`RoomManager`] of the process and exposes it to the HTTP and WebSocket
//! handlers through shared router state.

use crate::{
    config::ServerConfig,
    error::ServerError,
    rooms::RoomManager,
    server::{handlers, http},
    shutdown::ShutdownState,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// State shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub room_manager: Arc<RoomManager>,
    pub config: Arc<ServerConfig>,
    pub shutdown: ShutdownState,
}

/// The core room server structure.
///
/// `RoomServer` binds the listener, serves the HTTP routes and the
/// WebSocket endpoint, and coordinates graceful shutdown: once shutdown is
/// initiated it stops accepting connections and closes every live player
/// connection.
pub struct RoomServer {
    /// Server configuration settings
    config: Arc<ServerConfig>,

    /// Owner of connections, rooms and player state
    room_manager: Arc<RoomManager>,

    /// Shared shutdown coordination
    shutdown_state: ShutdownState,
}

impl RoomServer {
    /// Creates a new room server with the specified configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_shutdown_state(config, ShutdownState::new())
    }

    /// Creates a server that stops when `shutdown_state` is initiated.
    ///
    /// Used by the application so that its signal handling and the server
    /// observe the same shutdown request.
    pub fn with_shutdown_state(config: ServerConfig, shutdown_state: ShutdownState) -> Self {
        let room_manager = Arc::new(RoomManager::new(config.outbound_queue_capacity));
        Self {
            config: Arc::new(config),
            room_manager,
            shutdown_state,
        }
    }

    /// Builds the HTTP router.
    ///
    /// # Routes
    ///
    /// * `GET /` - the game page
    /// * `GET /static/*path` - static assets
    /// * `POST /generate` - trail puzzle generation
    /// * `GET /stats` - room and player counts
    /// * `GET /ws/:room_id/:player_id` - WebSocket upgrade into a room
    pub fn router(&self) -> Router {
        let state = AppState {
            room_manager: self.room_manager.clone(),
            config: self.config.clone(),
            shutdown: self.shutdown_state.clone(),
        };

        Router::new()
            .route("/", get(http::index))
            .route("/static/*path", get(http::static_file))
            .route("/generate", post(http::generate))
            .route("/stats", get(http::stats))
            .route("/ws/:room_id/:player_id", get(handlers::ws_upgrade))
            .with_state(state)
    }

    /// Binds the configured address and serves until shutdown is initiated.
    pub async fn start(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| {
                ServerError::Network(format!("Failed to bind to {}: {}", self.config.bind_address, e))
            })?;
        self.serve(listener).await
    }

    /// Serves on an already bound listener until shutdown is initiated.
    ///
    /// # Shutdown Flow
    ///
    /// 1. Stop accepting new connections
    /// 2. Signal every live player connection to close; each runs its
    ///    regular disconnect path
    /// 3. Wait for in-flight HTTP requests, then mark shutdown complete
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(e.to_string()))?;
        info!("🚀 Room server listening on http://{}", local_addr);
        info!("🔌 WebSocket endpoint: ws://{}/ws/{{room}}/{{player}}", local_addr);

        let shutdown_signal = {
            let shutdown_state = self.shutdown_state.clone();
            let room_manager = self.room_manager.clone();
            async move {
                shutdown_state.wait_for_shutdown().await;
                let closed = room_manager.close_all().await;
                info!("🔌 Closing {} live connection(s)", closed);
            }
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Network(format!("Server error: {e}")))?;

        self.shutdown_state.complete_shutdown();
        info!("Server stopped");
        Ok(())
    }

    /// Initiates server shutdown.
    ///
    /// Stops accepting connections and closes every live player connection.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        self.shutdown_state.initiate_shutdown();
        Ok(())
    }

    /// Gets the room manager shared with every connection handler.
    pub fn room_manager(&self) -> Arc<RoomManager> {
        self.room_manager.clone()
    }

    pub fn shutdown_state(&self) -> ShutdownState {
        self.shutdown_state.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
