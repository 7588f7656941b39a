//! Runtime configuration
//!
//! Loaded from environment variables, then overridden by CLI flags:
//! - `REGISTRAR_BIND`: listen address (default: 127.0.0.1:3030)
//! - `REGISTRAR_CORS_PERMISSIVE`: allow any origin (default: false)
//! - `DATABASE_URL`: SQLite URL (default: sqlite://registrar.db)
//! - `REGISTRAR_MAX_CONNECTIONS`: pool size (default: 5)

use std::net::SocketAddr;
use std::str::FromStr;

use crate::db::pool::{DEFAULT_DATABASE_URL, DEFAULT_MAX_CONNECTIONS};

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:3030)
    pub bind_addr: SocketAddr,

    /// Allow permissive CORS (default: false = localhost only)
    ///
    /// WARNING: Setting this to true allows any origin.
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            cors_permissive: false,
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            bind_addr: parse_var(&lookup, "REGISTRAR_BIND")?.unwrap_or(defaults.bind_addr),
            cors_permissive: parse_flag(&lookup, "REGISTRAR_CORS_PERMISSIVE")?
                .unwrap_or(defaults.cors_permissive),
        })
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_owned(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl DatabaseConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            url: lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.url),
            max_connections: parse_var(&lookup, "REGISTRAR_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map(Some).map_err(|_| ConfigError::Invalid { var, value })
        }
    }
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<bool>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
            _ => Err(ConfigError::Invalid { var, value }),
        },
    }
}
