//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Operational HTTP server (health, metrics, admin)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Primary store backend selection
    pub store: StoreSettings,

    /// Search mirror connection
    pub search: SearchSettings,

    /// Backlog sweeper schedule
    pub sweep: SweepSettings,

    /// Snowflake ID generator settings
    pub snowflake: SnowflakeSettings,

    /// Log output format
    pub telemetry: TelemetrySettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply `migrations/` at startup
    pub run_migrations: bool,
}

/// Primary store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    pub backend: StoreBackend,
}

/// Search mirror configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    /// When false, a no-op mirror accepts every document
    pub enabled: bool,

    /// Base URL of the search service
    pub url: String,

    /// Bearer key, sent when non-empty
    pub api_key: Option<String>,

    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,

    /// Prepended to every index name (e.g. "staging_")
    pub index_prefix: String,
}

/// Backlog sweeper configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepSettings {
    pub enabled: bool,

    /// Seconds between sweeps
    pub interval_secs: u64,

    /// Maximum documents per kind per sweep
    pub batch_size: i64,
}

/// Snowflake ID generator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeSettings {
    /// Machine ID (0-31)
    pub machine_id: u64,

    /// Node ID (0-31)
    pub node_id: u64,

    /// Custom epoch timestamp in milliseconds
    pub epoch: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. Built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 4. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the loaded values are inconsistent (see [`Settings::validate`]).
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Self::builder(&environment)?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SWEEP__BATCH_SIZE=50 -> sweep.batch_size = 50
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("search.url", std::env::var("SEARCH_URL").ok())?
            .set_override_option("search.api_key", std::env::var("SEARCH_API_KEY").ok())?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    /// Settings built from defaults only, for tests and embedded use.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::builder("test")?
            .set_override("store.backend", "memory")?
            .build()?
            .try_deserialize()
            .and_then(Self::validate)
    }

    fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("store.backend", "postgres")?
            .set_default("search.enabled", false)?
            .set_default("search.url", "")?
            .set_default("search.timeout_ms", 5000)?
            .set_default("search.index_prefix", "")?
            .set_default("sweep.enabled", true)?
            .set_default("sweep.interval_secs", 60)?
            .set_default("sweep.batch_size", 100)?
            .set_default("snowflake.machine_id", 1)?
            .set_default("snowflake.node_id", 1)?
            .set_default("snowflake.epoch", 1577836800000_u64)?
            .set_default("telemetry.json", false)
    }

    /// Reject combinations that cannot work at runtime.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.sweep.batch_size < 1 {
            return Err(ConfigError::Message(format!(
                "sweep.batch_size must be at least 1, got {}",
                self.sweep.batch_size
            )));
        }
        if self.sweep.interval_secs < 1 {
            return Err(ConfigError::Message(
                "sweep.interval_secs must be at least 1".to_string(),
            ));
        }
        if self.search.enabled && self.search.url.trim().is_empty() {
            return Err(ConfigError::Message(
                "search.url is required when search.enabled = true".to_string(),
            ));
        }
        if self.store.backend == StoreBackend::Postgres && self.database.url.trim().is_empty() {
            return Err(ConfigError::Message(
                "database.url is required for the postgres store backend".to_string(),
            ));
        }
        if self.snowflake.machine_id > 31 || self.snowflake.node_id > 31 {
            return Err(ConfigError::Message(
                "snowflake.machine_id and snowflake.node_id must be in 0..=31".to_string(),
            ));
        }
        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
