//! Configuration module for the trip planner backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AddrParseError> {
        dotenvy::dotenv().ok();

        let db_path = env::var("TRIP_DB_PATH")
            .unwrap_or_else(|_| "./data/trips.sqlite".to_string())
            .into();

        let bind_addr = env::var("TRIP_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let log_level = env::var("TRIP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("TRIP_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let cors_origin = env::var("TRIP_CORS_ORIGIN")
            .ok()
            .filter(|origin| !origin.trim().is_empty() && origin != "*");

        Ok(Self {
            db_path,
            bind_addr,
            log_level,
            log_json,
            cors_origin,
        })
    }
}
