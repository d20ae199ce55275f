/// Configuration management for Gallery Service
///
/// Loads configuration from environment variables. `main` loads a `.env`
/// file first when one is present.
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::services::DEFAULT_FACET_SIZE;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Which store backs the feed engine
    pub storage: StorageBackend,
    /// Database configuration, present when `storage` is postgres
    pub database: Option<DatabaseConfig>,
    /// Feed settings
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// HTTP port
    pub http_port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "postgres" | "postgresql" | "pg" => Ok(StorageBackend::Postgres),
            other => bail!("unknown STORAGE_BACKEND '{}' (expected memory or postgres)", other),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Postgres => write!(f, "postgres"),
        }
    }
}

/// Database configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Min connections in pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection before failing
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

/// Feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Entries in each of the city and tag facet lists
    pub facet_size: usize,
}

// Default values
fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

/// Parse `key`, keeping `default` when it is unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "Ignoring malformed environment variable, using default");
                default
            }
        },
        Err(_) => default,
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app = AppConfig {
            env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env_or("PORT", 8080),
        };

        let storage = match std::env::var("STORAGE_BACKEND") {
            Ok(raw) => raw.parse().context("invalid STORAGE_BACKEND")?,
            Err(_) => StorageBackend::Memory,
        };

        let database = match storage {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => Some(DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL environment variable not set")?,
                max_connections: env_or("DB_MAX_CONNECTIONS", default_max_connections()),
                min_connections: env_or("DB_MIN_CONNECTIONS", default_min_connections()),
                acquire_timeout_secs: env_or(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    default_acquire_timeout_secs(),
                ),
            }),
        };

        let feed = FeedConfig {
            facet_size: env_or("FEED_FACET_SIZE", DEFAULT_FACET_SIZE),
        };

        Ok(Config {
            app,
            storage,
            database,
            feed,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.app.host.clone(), self.app.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "APP_ENV",
        "APP_HOST",
        "PORT",
        "STORAGE_BACKEND",
        "DATABASE_URL",
        "DB_MAX_CONNECTIONS",
        "DB_MIN_CONNECTIONS",
        "DB_ACQUIRE_TIMEOUT_SECS",
        "FEED_FACET_SIZE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_default_values() {
        clear_env();

        let config = Config::from_env().unwrap();

        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.host, "0.0.0.0");
        assert_eq!(config.app.http_port, 8080);
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.database.is_none());
        assert_eq!(config.feed.facet_size, 5);
    }

    #[test]
    #[serial]
    fn test_postgres_requires_database_url() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "postgres");

        assert!(Config::from_env().is_err());

        std::env::set_var("DATABASE_URL", "postgres://localhost/gallery");
        std::env::set_var("DB_MAX_CONNECTIONS", "4");
        let config = Config::from_env().unwrap();
        let database = config.database.unwrap();
        assert_eq!(database.max_connections, 4);
        assert_eq!(database.min_connections, 2);
        assert_eq!(database.acquire_timeout_secs, 5);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_malformed_numbers_fall_back_to_defaults() {
        clear_env();
        std::env::set_var("PORT", "eighty");
        std::env::set_var("FEED_FACET_SIZE", "-3");

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.http_port, 8080);
        assert_eq!(config.feed.facet_size, 5);

        std::env::set_var("PORT", " 9090 ");
        assert_eq!(Config::from_env().unwrap().app.http_port, 9090);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unknown_backend_is_rejected() {
        clear_env();
        std::env::set_var("STORAGE_BACKEND", "mongo");
        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_database_url_is_redacted() {
        let db = DatabaseConfig {
            url: "postgres://user:secret@db/gallery".into(),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout_secs: 1,
        };
        assert!(!format!("{:?}", db).contains("secret"));
    }
}
