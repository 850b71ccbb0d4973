//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that orchestrates server
//! startup, room statistics monitoring and graceful shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{wait_for_shutdown_signal, wait_for_signal},
};
use room_server::{RoomManager, RoomServer, ShutdownState};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info, warn};

/// How long the server task gets to finish after shutdown is initiated.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(8);

/// Main application struct.
///
/// Owns the merged configuration and the room server, and drives the
/// process from startup to the final statistics report.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Room server instance
    server: RoomServer,
    /// Shared with the server; initiated by the signal handler
    shutdown_state: ShutdownState,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Build the room server
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        apply_overrides(&mut config, args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();

        let shutdown_state = ShutdownState::new();
        let server = RoomServer::with_shutdown_state(config.to_server_config()?, shutdown_state.clone());

        Ok(Self {
            config,
            server,
            shutdown_state,
        })
    }

    /// Runs the server until a termination signal arrives, then shuts down
    /// gracefully.
    ///
    /// A second signal during shutdown exits the process immediately.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Emoji Trail server");
        self.log_configuration_summary();

        let room_manager = self.server.room_manager();
        let shutdown_state = self.shutdown_state.clone();

        // Start server in background
        let mut server_handle = {
            let server = self.server;
            tokio::spawn(async move { server.start().await })
        };

        let monitoring_handle = start_monitoring(
            room_manager.clone(),
            self.config.server.stats_interval_secs,
        );

        info!("✅ Emoji Trail server is now running!");
        info!("🎮 Ready to accept players on {}", self.config.server.bind_address);
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        // Run until a signal arrives or the server stops on its own
        tokio::select! {
            signal = wait_for_shutdown_signal(&shutdown_state) => signal?,
            result = &mut server_handle => {
                monitoring_handle.abort();
                return match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(e.into()),
                };
            }
        }

        // merciless shutdown
        tokio::spawn(async move {
            if let Err(e) = wait_for_signal().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }
            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        monitoring_handle.abort();

        info!("⏳ Waiting for the server to close connections...");
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, server_handle).await {
            Ok(Ok(Ok(()))) => info!("✅ Server task completed gracefully"),
            Ok(Ok(Err(e))) => error!("❌ Server error during shutdown: {}", e),
            Ok(Err(e)) => error!("❌ Server task failed: {}", e),
            Err(_) => warn!("⏰ Server task did not complete within {:?}", SHUTDOWN_TIMEOUT),
        }

        log_final_statistics(&room_manager).await;
        info!("👋 Emoji Trail server shutdown complete");
        Ok(())
    }

    fn log_configuration_summary(&self) {
        let server = &self.config.server;
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", server.bind_address);
        info!("  📁 Static directory: {}", server.static_directory);
        info!("  👥 Max connections: {}", server.max_connections);
        info!("  📦 Max message size: {} bytes", server.max_message_size);
        info!("  📬 Outbound queue per connection: {}", server.outbound_queue_capacity);
    }
}

fn apply_overrides(config: &mut AppConfig, args: CliArgs) {
    if let Some(bind_address) = args.bind_address {
        config.server.bind_address = bind_address;
    }
    if let Some(static_dir) = args.static_dir {
        config.server.static_directory = static_dir.to_string_lossy().to_string();
    }
    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
}

/// Reports room and player counts every `interval_secs` seconds.
fn start_monitoring(room_manager: Arc<RoomManager>, interval_secs: u64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if interval_secs == 0 {
            return;
        }
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let stats = room_manager.stats().await;
            info!("📊 Room Health - {} room(s) | {} player(s) connected", stats.rooms, stats.players);
        }
    })
}

async fn log_final_statistics(room_manager: &RoomManager) {
    let stats = room_manager.stats().await;
    info!("📊 Final Statistics:");
    info!("  - Rooms still open: {}", stats.rooms);
    for room_id in room_manager.room_ids().await {
        info!("    • {} ({} member(s))", room_id, room_manager.members_of(&room_id).await.len());
    }
    info!("  - Players still registered: {}", stats.players);
}
