//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub engagement: EngagementConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

/// Durable counter store (PostgreSQL)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Directory of SQL migrations to apply at startup, if any
    #[serde(default)]
    pub migrations_dir: Option<String>,
}

/// Ephemeral store (Redis)
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Engine policies and accelerator tuning
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementConfig {
    /// Reconcile roles on every Nth message or reaction of a user; 0 disables
    #[serde(default = "default_reconcile_every")]
    pub reconcile_every: u64,
    /// Reconcile roles when a voice session closes with a non-zero duration
    #[serde(default = "default_true")]
    pub reconcile_on_voice_leave: bool,
    /// Upper bound on any single ephemeral store call
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,
    #[serde(default = "default_leaderboard_cache_ttl")]
    pub leaderboard_cache_ttl: u64,
    #[serde(default = "default_stats_cache_ttl")]
    pub stats_cache_ttl: u64,
    /// Events processed concurrently by the worker
    #[serde(default = "default_ingest_concurrency")]
    pub ingest_concurrency: usize,
    /// Worker id embedded in locally generated session ids (0-1023)
    #[serde(default)]
    pub worker_id: u16,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            reconcile_every: default_reconcile_every(),
            reconcile_on_voice_leave: true,
            cache_timeout_ms: default_cache_timeout_ms(),
            leaderboard_cache_ttl: default_leaderboard_cache_ttl(),
            stats_cache_ttl: default_stats_cache_ttl(),
            ingest_concurrency: default_ingest_concurrency(),
            worker_id: 0,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "engage-worker".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_reconcile_every() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_cache_timeout_ms() -> u64 {
    250
}

fn default_leaderboard_cache_ttl() -> u64 {
    60
}

fn default_stats_cache_ttl() -> u64 {
    300 // 5 minutes
}

fn default_ingest_concurrency() -> usize {
    64
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            app: AppSettings {
                name: text("APP_NAME").unwrap_or_else(default_app_name),
                env: parse_var(&lookup, "APP_ENV")?.unwrap_or_default(),
            },
            database: DatabaseConfig {
                url: text("DATABASE_URL").ok_or(ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                min_connections: parse_var(&lookup, "DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or_else(default_min_connections),
                migrations_dir: text("ENGAGE_MIGRATIONS_DIR"),
            },
            redis: RedisConfig {
                // The hosting platform exposes a public URL next to the private one
                url: text("REDIS_PUBLIC_URL")
                    .or_else(|| text("REDIS_URL"))
                    .unwrap_or_else(default_redis_url),
                max_connections: parse_var(&lookup, "REDIS_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_redis_max_connections),
            },
            engagement: EngagementConfig {
                reconcile_every: parse_var(&lookup, "ENGAGE_RECONCILE_EVERY")?
                    .unwrap_or_else(default_reconcile_every),
                reconcile_on_voice_leave: parse_var(&lookup, "ENGAGE_RECONCILE_ON_VOICE_LEAVE")?
                    .unwrap_or(true),
                cache_timeout_ms: parse_var(&lookup, "ENGAGE_CACHE_TIMEOUT_MS")?
                    .unwrap_or_else(default_cache_timeout_ms),
                leaderboard_cache_ttl: parse_var(&lookup, "ENGAGE_LEADERBOARD_CACHE_TTL")?
                    .unwrap_or_else(default_leaderboard_cache_ttl),
                stats_cache_ttl: parse_var(&lookup, "ENGAGE_STATS_CACHE_TTL")?
                    .unwrap_or_else(default_stats_cache_ttl),
                ingest_concurrency: parse_var(&lookup, "ENGAGE_INGEST_CONCURRENCY")?
                    .unwrap_or_else(default_ingest_concurrency)
                    .max(1),
                worker_id: parse_worker_id(&lookup)?,
            },
        })
    }
}

/// Parse an optional value, rejecting present-but-malformed input
fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        None => Ok(None),
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(key, v)),
    }
}

/// Session ids carry a 10-bit worker id
fn parse_worker_id<F>(lookup: &F) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_var::<u16, F>(lookup, "ENGAGE_WORKER_ID")? {
        Some(id) if id > 1023 => Err(ConfigError::InvalidValue("ENGAGE_WORKER_ID", id.to_string())),
        id => Ok(id.unwrap_or(0)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
