//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `JWT_SECRET` (required): shared secret used to verify bearer tokens
/// - `PORT` (optional): HTTP server port, defaults to 3000
/// - `RATE_LIMIT_POINTS` (optional): requests allowed per client per window, defaults to 100
/// - `RATE_LIMIT_WINDOW_SECS` (optional): rate limit window length, defaults to 900
/// - `AUDIT_LOG_PATH` (optional): audit log file, defaults to `./logs/logs.json`
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `DB_TIMEOUT_SECS` (optional): pool acquire and statement timeout, defaults to 5
#[derive(Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    pub jwt_secret: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_rate_limit_points")]
    pub rate_limit_points: u32,

    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_db_timeout_secs")]
    pub db_timeout_secs: u64,
}

/// Default port if PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_rate_limit_points() -> u32 {
    100
}

fn default_rate_limit_window_secs() -> u64 {
    900
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./logs/logs.json")
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_db_timeout_secs() -> u64 {
    5
}

/// Reasons a loaded configuration is rejected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables, deserializes them into a Config struct
    /// and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL, JWT_SECRET)
    /// - Environment variable values cannot be parsed into expected types
    /// - A value fails [`Config::validate`]
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Empty("DATABASE_URL"));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Empty("JWT_SECRET"));
        }
        if self.rate_limit_points == 0 {
            return Err(ConfigError::Zero("RATE_LIMIT_POINTS"));
        }
        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::Zero("RATE_LIMIT_WINDOW_SECS"));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::Zero("DB_MAX_CONNECTIONS"));
        }
        if self.db_timeout_secs == 0 {
            return Err(ConfigError::Zero("DB_TIMEOUT_SECS"));
        }
        Ok(())
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_secs(self.db_timeout_secs)
    }
}

// The secret and connection string stay out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"<redacted>")
            .field("jwt_secret", &"<redacted>")
            .field("port", &self.port)
            .field("rate_limit_points", &self.rate_limit_points)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("audit_log_path", &self.audit_log_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_timeout_secs", &self.db_timeout_secs)
            .finish()
    }
}
