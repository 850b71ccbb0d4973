//! Configuration management for the Emoji Trail server.
//!
//! This module handles loading, validation, and conversion of server configuration
//! from TOML files and command-line arguments.

use room_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Application configuration loaded from TOML file.
///
/// Every field has a default, so a partial file (or an empty one) is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server-specific configuration settings.
///
/// Controls network binding, asset location and per-connection limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "127.0.0.1:8004")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Directory with `index.html` and the assets served under `/static`
    #[serde(default = "default_static_directory")]
    pub static_directory: String,
    /// Maximum number of concurrent player connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Maximum inbound WebSocket message size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Outbound messages buffered per connection before new ones are dropped
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// Maximum length of room and player identifiers
    #[serde(default = "default_max_id_length")]
    pub max_id_length: usize,
    /// Seconds between room statistics reports (0 to disable)
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

fn default_bind_address() -> String {
    ServerConfig::default().bind_address.to_string()
}

fn default_static_directory() -> String {
    "static".to_string()
}

fn default_max_connections() -> usize {
    ServerConfig::default().max_connections
}

fn default_max_message_size() -> usize {
    ServerConfig::default().max_message_size
}

fn default_outbound_queue_capacity() -> usize {
    ServerConfig::default().outbound_queue_capacity
}

fn default_max_id_length() -> usize {
    ServerConfig::default().max_id_length
}

fn default_stats_interval_secs() -> u64 {
    60
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            static_directory: default_static_directory(),
            max_connections: default_max_connections(),
            max_message_size: default_max_message_size(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            max_id_length: default_max_id_length(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the specified path
    /// and returns the default configuration.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the application configuration into the room server's configuration.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            static_directory: PathBuf::from(&self.server.static_directory),
            max_connections: self.server.max_connections,
            max_message_size: self.server.max_message_size,
            outbound_queue_capacity: self.server.outbound_queue_capacity,
            max_id_length: self.server.max_id_length,
        })
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!("Invalid bind address: {}", &self.server.bind_address));
        }

        if self.server.static_directory.is_empty() {
            return Err("Static directory cannot be empty".to_string());
        }

        let limits = [
            ("server.max_connections", self.server.max_connections),
            ("server.max_message_size", self.server.max_message_size),
            ("server.outbound_queue_capacity", self.server.outbound_queue_capacity),
            ("server.max_id_length", self.server.max_id_length),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(format!("{name} must be greater than 0"));
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
