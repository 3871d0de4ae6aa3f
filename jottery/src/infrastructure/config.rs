// /////////////////////////////////////////////////////////////////////////////
// Jottery
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Environment-driven configuration for both binaries.
//!
//! Every field has a documented default so the CLI and the server both run
//! with zero configuration. Values are read through the `config` crate so a
//! future config file source can be layered in without touching call
//! sites, the same shape as the teacher's `infrastructure::config` module.

use config::{Config, Environment};
use serde::Deserialize;

fn default_database_url() -> String {
    "sqlite://jottery.db".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_payload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_auto_lock_minutes() -> u32 {
    15
}

fn default_auto_sync_minutes() -> u32 {
    5
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Connection-pool tuning for the local SQLite store and the server's sync
/// store. A faithful `sqlx` port always exposes these knobs even though the
/// distilled contract only promises "a durable keyed container".
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Top-level application configuration shared by the CLI and the server.
/// Unused fields for a given binary (e.g. `port` for the CLI) are simply
/// ignored by that binary.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_auto_lock_minutes")]
    pub auto_lock_minutes: u32,
    #[serde(default = "default_auto_sync_minutes")]
    pub auto_sync_minutes: u32,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            port: default_port(),
            max_payload_bytes: default_max_payload_bytes(),
            log_level: default_log_level(),
            auto_lock_minutes: default_auto_lock_minutes(),
            auto_sync_minutes: default_auto_sync_minutes(),
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `JOTTERY_*` environment variables, falling
    /// back to the documented defaults for anything unset.
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = AppConfig::default();

        let builder = Config::builder()
            .set_default("database_url", defaults.database_url)?
            .set_default("port", defaults.port as i64)?
            .set_default("max_payload_bytes", defaults.max_payload_bytes as i64)?
            .set_default("log_level", defaults.log_level)?
            .set_default("auto_lock_minutes", defaults.auto_lock_minutes as i64)?
            .set_default("auto_sync_minutes", defaults.auto_sync_minutes as i64)?
            .set_default("max_connections", defaults.max_connections as i64)?
            .set_default("busy_timeout_ms", defaults.busy_timeout_ms as i64)?
            .add_source(Environment::with_prefix("JOTTERY").try_parsing(true));

        builder.build()?.try_deserialize()
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            database_url: self.database_url.clone(),
            max_connections: self.max_connections,
            busy_timeout_ms: self.busy_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_yield_a_runnable_configuration_with_no_environment() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_payload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.auto_lock_minutes, 15);
        assert_eq!(config.auto_sync_minutes, 5);
    }

    #[test]
    fn store_config_is_derived_from_the_top_level_database_settings() {
        let config = AppConfig::default();
        let store = config.store_config();
        assert_eq!(store.database_url, config.database_url);
        assert_eq!(store.max_connections, config.max_connections);
    }
}
