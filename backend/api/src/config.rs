//! Application configuration loaded from environment variables.

use std::time::Duration;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Size of the database connection pool
    pub db_max_connections: u32,
    /// Contribution-creation attempts allowed per client per window
    pub rate_limit_max_requests: u32,
    /// Length of one rate-limit window in seconds
    pub rate_limit_window_secs: u64,
    /// How often (in seconds) expired rate-limit windows are purged
    pub rate_limit_sweep_secs: u64,
    /// Shared secret for the KYC review endpoint; `None` leaves it open
    pub reviewer_api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./contributions.db".to_string()),
            api_port: parse_var("API_PORT", "3001")?,
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", "5")?,
            rate_limit_max_requests: parse_var("RATE_LIMIT_MAX_REQUESTS", "10")?,
            rate_limit_window_secs: parse_var("RATE_LIMIT_WINDOW_SECS", "300")?,
            rate_limit_sweep_secs: parse_var("RATE_LIMIT_SWEEP_SECS", "60")?,
            reviewer_api_key: env_var("REVIEWER_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// Never zero: the sweeper's ticker rejects an empty period.
    pub fn rate_limit_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.rate_limit_sweep_secs.max(1))
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| AppError::Config(format!("Missing env var: {key}")))
}

fn parse_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T> {
    env_var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Config(format!("Invalid {key}")))
}
