//! Configuration Module
//!
//! Loads proxy settings from an optional `key=value` file and environment
//! variables, environment taking precedence.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

/// Proxy configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Port the proxy accepts client connections on
    pub proxy_port: u16,
    /// Origin host fetched from on a miss
    pub upstream_host: String,
    /// Origin port
    pub upstream_port: u16,
    /// Global cache expiration in milliseconds
    pub ttl_ms: u64,
    /// Cap on the sum of all cached payload sizes
    pub max_cache_bytes: u64,
    /// Seconds between expiration sweeps
    pub reaper_interval_secs: u64,
    /// Port of the admin HTTP API
    pub admin_port: u16,
    /// Maximum client connections served at once
    pub max_connections: usize,
}

impl Config {
    /// Loads the configuration for the binary.
    ///
    /// Reads the file named by `CONFIG_FILE` when set, then applies
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let base = match env::var("CONFIG_FILE") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// Creates a new Config from environment variables over the defaults.
    ///
    /// # Environment Variables
    /// - `PROXY_PORT` - Client listen port (default: 8080)
    /// - `UPSTREAM_HOST` - Origin host (default: 127.0.0.1)
    /// - `UPSTREAM_PORT` - Origin port (default: 8000)
    /// - `CACHE_TTL_MS` - Expiration in milliseconds (default: 60000)
    /// - `MAX_CACHE_BYTES` - Cache size cap in bytes (default: 10 MiB)
    /// - `REAPER_INTERVAL_SECS` - Sweep frequency in seconds (default: 60)
    /// - `ADMIN_PORT` - Admin API port (default: 3000)
    /// - `MAX_CONNECTIONS` - Concurrent client connections (default: 256)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        Self {
            proxy_port: env_or("PROXY_PORT", self.proxy_port),
            upstream_host: env::var("UPSTREAM_HOST").unwrap_or(self.upstream_host),
            upstream_port: env_or("UPSTREAM_PORT", self.upstream_port),
            ttl_ms: env_or("CACHE_TTL_MS", self.ttl_ms),
            max_cache_bytes: env_or("MAX_CACHE_BYTES", self.max_cache_bytes),
            reaper_interval_secs: env_or("REAPER_INTERVAL_SECS", self.reaper_interval_secs),
            admin_port: env_or("ADMIN_PORT", self.admin_port),
            max_connections: env_or("MAX_CONNECTIONS", self.max_connections),
        }
    }

    /// Reads a `key=value` file.
    ///
    /// Accepts `proxyPort`, `serverIp`, `serverPort`, `cacheExpirationTimeMs`
    /// and `maxFileSize` along with the snake-case names of the remaining
    /// fields. Lines without `=` are ignored; missing keys keep defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Parses `key=value` configuration text.
    pub fn parse(contents: &str) -> Result<Self> {
        let values: HashMap<&str, &str> = contents
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();

        let defaults = Self::default();
        Ok(Self {
            proxy_port: field(&values, "proxyPort", defaults.proxy_port)?,
            upstream_host: values
                .get("serverIp")
                .map(|v| v.to_string())
                .unwrap_or(defaults.upstream_host),
            upstream_port: field(&values, "serverPort", defaults.upstream_port)?,
            ttl_ms: field(&values, "cacheExpirationTimeMs", defaults.ttl_ms)?,
            max_cache_bytes: field(&values, "maxFileSize", defaults.max_cache_bytes)?,
            reaper_interval_secs: field(
                &values,
                "reaper_interval_secs",
                defaults.reaper_interval_secs,
            )?,
            admin_port: field(&values, "admin_port", defaults.admin_port)?,
            max_connections: field(&values, "max_connections", defaults.max_connections)?,
        })
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proxy_port: 8080,
            upstream_host: "127.0.0.1".to_string(),
            upstream_port: 8000,
            ttl_ms: 60_000,
            max_cache_bytes: 10 * 1024 * 1024,
            reaper_interval_secs: 60,
            admin_port: 3000,
            max_connections: 256,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn field<T>(values: &HashMap<&str, &str>, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match values.get(name) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        None => Ok(default),
    }
}
