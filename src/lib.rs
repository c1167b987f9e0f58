//! Expiring Cache - a concurrent in-memory key/value cache
//!
//! String-keyed values behind a single async reader/writer lock, with
//! optional per-entry TTL expiry and at-most-once compute-on-miss.
//!
//! ```ignore
//! use std::time::Duration;
//! use expiring_cache::ExpiringCache;
//!
//! let cache = ExpiringCache::new();
//! cache.put_timed("session", Duration::from_millis(200), "token-A".to_string()).await;
//! assert!(cache.has("session").await);
//! ```

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{CacheStats, ExpiringCache, Simple, WithExpiry};
pub use config::Config;
pub use error::{CacheError, Result};
