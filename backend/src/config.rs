//! Configuration management for the roast companion server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with RT__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Passcode gate configuration
    pub access: AccessConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AccessConfig {
    /// Shared passcode; while unset every unlock attempt is refused
    pub passcode: Option<String>,

    /// Mark the unlock cookie `Secure`
    pub secure_cookie: bool,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Environment::with_prefix("RT").separator("__"))
    }

    /// Load with `env` as the final override layer.
    ///
    /// Values stay strings until deserialized, so a passcode such as `0123`
    /// is kept verbatim while numeric and boolean keys still parse.
    pub fn load_from(env: Environment) -> Result<Self, ConfigError> {
        let environment =
            std::env::var("RT__ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let production = environment == "production";

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("database.url", "sqlite://roast-companion.db?mode=rwc")?
            .set_default("database.max_connections", 5)?
            .set_default("access.secure_cookie", production)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (RT__ prefix)
            .add_source(env)
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "127.0.0.1".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://roast-companion.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            passcode: None,
            secure_cookie: false,
        }
    }
}
