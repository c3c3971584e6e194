//! Configuration system for the registry.
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `config.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `HWID_SERVER_HOST` - Server bind address
//! - `HWID_SERVER_PORT` (or `PORT`) - Server port
//! - `HWID_DATABASE_URL` (or `DATABASE_URL`) - Database connection URL
//! - `HWID_DATABASE_MAX_CONNECTIONS` - Connection pool size
//! - `HWID_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
//! - `HWID_LOG_JSON` - Emit logs as JSON lines

use config::builder::DefaultState;
use config::{Config, ConfigBuilder};
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;

use crate::errors::{RegistryError, RegistryResult};

/// Global configuration singleton.
static CONFIG: OnceLock<RegistryConfig> = OnceLock::new();

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite://hwid_registry.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL; the scheme selects the backend (`sqlite:` or `postgres:`)
    pub url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn config_err(e: config::ConfigError) -> RegistryError {
    RegistryError::Config(e.to_string())
}

/// First set variable among `names`.
fn first_env(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| env::var(name).ok())
}

fn with_defaults(builder: ConfigBuilder<DefaultState>) -> RegistryResult<ConfigBuilder<DefaultState>> {
    builder
        .set_default("server.host", DEFAULT_HOST)
        .map_err(config_err)?
        .set_default("server.port", i64::from(DEFAULT_PORT))
        .map_err(config_err)?
        .set_default("database.url", DEFAULT_DATABASE_URL)
        .map_err(config_err)?
        .set_default("database.max_connections", i64::from(DEFAULT_MAX_CONNECTIONS))
        .map_err(config_err)?
        .set_default("logging.level", "info")
        .map_err(config_err)?
        .set_default("logging.json", false)
        .map_err(config_err)
}

fn with_env_overrides(
    builder: ConfigBuilder<DefaultState>,
) -> RegistryResult<ConfigBuilder<DefaultState>> {
    builder
        .set_override_option("server.host", env::var("HWID_SERVER_HOST").ok())
        .map_err(config_err)?
        .set_override_option(
            "server.port",
            first_env(&["HWID_SERVER_PORT", "PORT"]).and_then(|v| v.parse::<i64>().ok()),
        )
        .map_err(config_err)?
        .set_override_option(
            "database.url",
            first_env(&["HWID_DATABASE_URL", "DATABASE_URL"]),
        )
        .map_err(config_err)?
        .set_override_option(
            "database.max_connections",
            env::var("HWID_DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok()),
        )
        .map_err(config_err)?
        .set_override_option("logging.level", env::var("HWID_LOG_LEVEL").ok())
        .map_err(config_err)?
        .set_override_option(
            "logging.json",
            env::var("HWID_LOG_JSON")
                .ok()
                .and_then(|v| v.parse::<bool>().ok()),
        )
        .map_err(config_err)
}

impl RegistryConfig {
    /// Load configuration from file and environment.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. `config.toml` file (optional)
    /// 3. Environment variables
    pub fn load() -> RegistryResult<Self> {
        let builder = with_defaults(Config::builder())?
            .add_source(config::File::with_name("config").required(false));
        let builder = with_env_overrides(builder)?;

        let settings = builder
            .build()
            .map_err(|e| RegistryError::Config(format!("failed to build config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| RegistryError::Config(format!("failed to deserialize config: {e}")))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.server.port == 0 {
            return Err(RegistryError::Config(
                "server.port must be greater than 0".to_string(),
            ));
        }

        if self.database.url.trim().is_empty() {
            return Err(RegistryError::Config(
                "database.url cannot be empty".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(RegistryError::Config(
                "database.max_connections must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(RegistryError::Config(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> RegistryResult<&'static RegistryConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = RegistryConfig::load()?;
    config.validate()?;

    // Another thread may have won the race; either value is valid.
    Ok(CONFIG.get_or_init(|| config))
}
