//! Configuration management for the Fleetkeeper client

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Build-time default backend address (e.g. "https://assets.example.org")
    pub default_address: Option<String>,
    /// Known remote address substituted when the client origin is a
    /// loopback/developer host
    pub dev_fallback_address: String,
    /// Origin the client itself is served from; decides whether the bare
    /// same-origin candidate is usable
    pub origin: String,
    /// Manual override address set by the user at runtime; tried first
    pub manual_override: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory for the file-backed local store
    pub path: String,
    /// Total byte quota across all stored blobs (None = unbounded)
    pub quota_bytes: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RecurrenceConfig {
    /// How many months ahead a monthly-weekday rule is searched before
    /// giving up
    pub search_horizon_months: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertsConfig {
    /// Days ahead within which a scheduled date counts as "due soon"
    pub due_soon_days: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (FLEETKEEPER_SECTION__KEY); the
            // double-underscore nesting separator keeps single-segment
            // variables out of the section namespace
            .add_source(
                Environment::with_prefix("FLEETKEEPER")
                    .separator("__")
                    .try_parsing(true),
            )
            // Override backend address from FLEETKEEPER_BACKEND_ADDRESS if present
            .set_override_option(
                "backend.manual_override",
                env::var("FLEETKEEPER_BACKEND_ADDRESS").ok(),
            )?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            default_address: None,
            dev_fallback_address: "https://assets.fleetkeeper.org".to_string(),
            origin: "http://localhost:5173".to_string(),
            manual_override: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: ".fleetkeeper".to_string(),
            quota_bytes: Some(5 * 1024 * 1024),
        }
    }
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            search_horizon_months: 24,
        }
    }
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self { due_soon_days: 14 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            storage: StorageConfig::default(),
            recurrence: RecurrenceConfig::default(),
            alerts: AlertsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: the environment is process-wide state
    #[test]
    fn test_backend_address_env_var_sets_manual_override() {
        let config = AppConfig::load().unwrap();
        assert_eq!(config.backend.manual_override, None);

        env::set_var("FLEETKEEPER_BACKEND_ADDRESS", "https://override.example.org");
        let loaded = AppConfig::load();
        env::remove_var("FLEETKEEPER_BACKEND_ADDRESS");

        // The override lands in its field without displacing the rest of
        // the backend section
        let config = loaded.unwrap();
        assert_eq!(
            config.backend.manual_override.as_deref(),
            Some("https://override.example.org")
        );
        assert!(!config.backend.dev_fallback_address.is_empty());
    }
}
