//! Environment-driven configuration, loaded once at startup.
//!
//! Mirrors `spec.md` §6 "Environment / config" exactly: every field here
//! maps to one named environment variable. A missing required variable is
//! a fatal startup error (`spec.md` §7 kind 7 treats document-store and,
//! by extension, config failures at startup as fatal).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub database_pool_min: usize,
    pub database_pool_max: usize,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_ttl_seconds: i64,
    pub admin_username: String,
    pub admin_password: String,
    pub cors_origins: CorsOrigins,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub room_connection_cap: usize,
    pub room_accept_rate_per_second: usize,
}

#[derive(Debug, Clone)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl Config {
    /// Loads configuration from the process environment, first merging in
    /// a `.env` file if one is present (a no-op in production containers
    /// where the orchestrator sets the environment directly).
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = require("BIND_ADDR")?;
        let database_url = require("DATABASE_URL")?;
        let jwt_secret = require("JWT_SECRET")?;

        let cors_origins = match std::env::var("CORS_ORIGINS") {
            Ok(raw) if raw.trim() == "*" => CorsOrigins::Any,
            Ok(raw) => CorsOrigins::List(raw.split(',').map(|s| s.trim().to_string()).collect()),
            Err(_) => CorsOrigins::Any,
        };

        Ok(Self {
            bind_addr,
            database_url,
            database_pool_min: optional_usize("DATABASE_POOL_MIN", 20),
            database_pool_max: optional_usize("DATABASE_POOL_MAX", 200),
            redis_url: std::env::var("REDIS_URL").ok(),
            jwt_secret,
            jwt_ttl_seconds: optional_usize("JWT_TTL_SECONDS", 86_400) as i64,
            admin_username: std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".into()),
            cors_origins,
            heartbeat_interval: Duration::from_secs(optional_usize(
                "HEARTBEAT_INTERVAL_SECONDS",
                15,
            ) as u64),
            heartbeat_timeout: Duration::from_secs(optional_usize(
                "HEARTBEAT_TIMEOUT_SECONDS",
                25,
            ) as u64),
            room_connection_cap: optional_usize("ROOM_CONNECTION_CAP", 250),
            room_accept_rate_per_second: optional_usize("ROOM_ACCEPT_RATE_PER_SECOND", 10),
        })
    }
}

fn require(key: &str) -> anyhow::Result<String> {
    std::env::var(key).map_err(|_| anyhow::anyhow!("{key} must be set"))
}

fn optional_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
