//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Environment variable holding the cache name.
pub const ENV_NAME: &str = "CACHE_NAME";
/// Environment variable holding the default lifetime in milliseconds.
pub const ENV_DEFAULT_TTL_MS: &str = "CACHE_DEFAULT_TTL_MS";

const DEFAULT_NAME: &str = "cache";
const DEFAULT_TTL_MS: u64 = 300_000;

/// Cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Label attached to every tracing event emitted by the cache
    pub name: String,
    /// Lifetime used by `put_timed_default`
    pub default_lifetime: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_NAME` - Cache label for logs (default: "cache")
    /// - `CACHE_DEFAULT_TTL_MS` - Default lifetime in milliseconds (default: 300000)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let name = lookup(ENV_NAME)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        let default_lifetime = match lookup(ENV_DEFAULT_TTL_MS) {
            Some(raw) => {
                let ms: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                    CacheError::InvalidConfig {
                        var: ENV_DEFAULT_TTL_MS.to_string(),
                        value: raw.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Duration::from_millis(ms)
            }
            None => Duration::from_millis(DEFAULT_TTL_MS),
        };

        let config = Self {
            name,
            default_lifetime,
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the cache cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.default_lifetime.is_zero() {
            return Err(CacheError::ZeroLifetime);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            default_lifetime: Duration::from_millis(DEFAULT_TTL_MS),
        }
    }
}
