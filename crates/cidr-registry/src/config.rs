//! Registry configuration
//!
//! All settings are passed explicitly to constructors. Only
//! [`RegistryConfig::from_env`] touches process state.
//!
//! Environment variables (a `.env` file is loaded first if present):
//! - `REGISTRY_HOST` (default `0.0.0.0`)
//! - `PORT` or `REGISTRY_PORT` (default `8080`)
//! - `REGISTRY_STORE`: `memory` or `postgres` (default `postgres` when
//!   `DATABASE_URL` is set, otherwise `memory`)
//! - `DATABASE_URL`, `REGISTRY_TABLE` (default `cidr_records`)
//! - `REGISTRY_DB_MAX_CONNECTIONS`, `REGISTRY_DB_MIN_CONNECTIONS`
//! - `REGISTRY_POOL_BASE_OCTET` (default `10`), `REGISTRY_POOL_SIZE` (default `256`)
//! - `REGISTRY_OPERATION_TIMEOUT_MS` (default `5000`)

use crate::allocator::MAX_POOL_SIZE;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub pool: PoolConfig,

    /// Deadline applied to every store call, in milliseconds
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Where records persist
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process-local map, lost on restart
    #[default]
    Memory,
    /// PostgreSQL table
    Postgres(PostgresConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub url: String,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// The managed /16 pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// First octet of the managed range
    #[serde(default = "default_base_octet")]
    pub base_octet: u8,

    /// Number of /16 candidates, 1 to 256
    #[serde(default = "default_pool_size")]
    pub size: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_table() -> String {
    "cidr_records".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_base_octet() -> u8 {
    10
}

fn default_pool_size() -> u16 {
    MAX_POOL_SIZE
}

fn default_operation_timeout_ms() -> u64 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            base_octet: default_base_octet(),
            size: default_pool_size(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: StoreConfig::default(),
            pool: PoolConfig::default(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            table: default_table(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

impl ServerConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl RegistryConfig {
    /// Load configuration from the environment
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("REGISTRY_HOST") {
            config.server.host = host;
        }
        if let Some(port) = parse_var(&lookup, "REGISTRY_PORT")? {
            config.server.port = port;
        } else if let Some(port) = parse_var(&lookup, "PORT")? {
            config.server.port = port;
        }

        let database_url = lookup("DATABASE_URL");
        let backend = lookup("REGISTRY_STORE").map(|b| b.to_ascii_lowercase());
        config.store = match (backend.as_deref(), database_url) {
            (Some("memory"), _) | (None, None) => StoreConfig::Memory,
            (Some("postgres"), None) => {
                return Err(Error::Config(
                    "DATABASE_URL is required for the postgres store".to_string(),
                ))
            }
            (Some("postgres"), Some(url)) | (None, Some(url)) => {
                let mut pg = PostgresConfig::new(url);
                if let Some(table) = lookup("REGISTRY_TABLE") {
                    pg.table = table;
                }
                if let Some(max) = parse_var(&lookup, "REGISTRY_DB_MAX_CONNECTIONS")? {
                    pg.max_connections = max;
                }
                if let Some(min) = parse_var(&lookup, "REGISTRY_DB_MIN_CONNECTIONS")? {
                    pg.min_connections = min;
                }
                StoreConfig::Postgres(pg)
            }
            (Some(other), _) => {
                return Err(Error::Config(format!("unknown store backend '{}'", other)))
            }
        };

        if let Some(octet) = parse_var(&lookup, "REGISTRY_POOL_BASE_OCTET")? {
            config.pool.base_octet = octet;
        }
        if let Some(size) = parse_var(&lookup, "REGISTRY_POOL_SIZE")? {
            config.pool.size = size;
        }
        if let Some(timeout) = parse_var(&lookup, "REGISTRY_OPERATION_TIMEOUT_MS")? {
            config.operation_timeout_ms = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.pool.size == 0 || self.pool.size > MAX_POOL_SIZE {
            return Err(Error::Config(format!(
                "pool size must be between 1 and {}, got {}",
                MAX_POOL_SIZE, self.pool.size
            )));
        }

        if self.operation_timeout_ms == 0 {
            return Err(Error::Config(
                "operation timeout must be greater than zero".to_string(),
            ));
        }

        if let StoreConfig::Postgres(pg) = &self.store {
            validate_table_name(&pg.table)?;
            if pg.min_connections > pg.max_connections {
                return Err(Error::Config(format!(
                    "min_connections ({}) exceeds max_connections ({})",
                    pg.min_connections, pg.max_connections
                )));
            }
        }

        Ok(())
    }

    /// Deadline applied to store calls
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Longest table name whose `_block_key` constraint still fits in 63 bytes
pub const MAX_TABLE_NAME_LEN: usize = 53;

/// Table names are interpolated into SQL, so only plain identifiers pass
///
/// Names must be lowercase so that constraint names derived from them match
/// what PostgreSQL reports after case folding.
pub fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .map_or(false, |c| c.is_ascii_lowercase() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if !valid_start || !valid_rest || table.len() > MAX_TABLE_NAME_LEN {
        return Err(Error::Config(format!(
            "table name '{}' must be a lowercase SQL identifier of at most {} characters",
            table, MAX_TABLE_NAME_LEN
        )));
    }

    Ok(())
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| Error::Config(format!("{}='{}': {}", key, raw, e)))
        })
        .transpose()
}
