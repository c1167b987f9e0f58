//! Capability Traits
//!
//! Splits the cache surface into a simple map and an expiry-aware superset,
//! so callers can depend on only what they use.

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::ExpiringCache;

/// Basic thread-safe map operations.
#[async_trait]
pub trait Simple<V>: Send + Sync
where
    V: Send + 'static,
{
    async fn get(&self, key: &str) -> Option<V>;

    /// Returns true if the key already existed.
    async fn put(&self, key: &str, value: V) -> bool;

    /// Returns true if `creator` ran and its value was inserted.
    async fn put_if_absent<F>(&self, key: &str, creator: F) -> bool
    where
        F: FnOnce(&str) -> V + Send;

    async fn has(&self, key: &str) -> bool;

    /// Returns true if the key existed.
    async fn remove(&self, key: &str) -> bool;

    async fn clear(&self);
}

/// Adds time-to-live variants and compute-on-miss to [`Simple`].
#[async_trait]
pub trait WithExpiry<V>: Simple<V>
where
    V: Send + 'static,
{
    async fn put_timed(&self, key: &str, lifetime: Duration, value: V) -> bool;

    async fn put_timed_if_absent<F>(&self, key: &str, lifetime: Duration, creator: F) -> bool
    where
        F: FnOnce(&str) -> V + Send;

    /// Returns the value and whether it was already present.
    async fn get_or_compute<F>(&self, key: &str, creator: F) -> (V, bool)
    where
        F: FnOnce(&str) -> V + Send;

    async fn get_or_compute_timed<F>(&self, key: &str, lifetime: Duration, creator: F) -> (V, bool)
    where
        F: FnOnce(&str) -> V + Send;
}

#[async_trait]
impl<V> Simple<V> for ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<V> {
        ExpiringCache::get(self, key).await
    }

    async fn put(&self, key: &str, value: V) -> bool {
        ExpiringCache::put(self, key, value).await
    }

    async fn put_if_absent<F>(&self, key: &str, creator: F) -> bool
    where
        F: FnOnce(&str) -> V + Send,
    {
        ExpiringCache::put_if_absent(self, key, creator).await
    }

    async fn has(&self, key: &str) -> bool {
        ExpiringCache::has(self, key).await
    }

    async fn remove(&self, key: &str) -> bool {
        ExpiringCache::remove(self, key).await
    }

    async fn clear(&self) {
        ExpiringCache::clear(self).await
    }
}

#[async_trait]
impl<V> WithExpiry<V> for ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn put_timed(&self, key: &str, lifetime: Duration, value: V) -> bool {
        ExpiringCache::put_timed(self, key, lifetime, value).await
    }

    async fn put_timed_if_absent<F>(&self, key: &str, lifetime: Duration, creator: F) -> bool
    where
        F: FnOnce(&str) -> V + Send,
    {
        ExpiringCache::put_timed_if_absent(self, key, lifetime, creator).await
    }

    async fn get_or_compute<F>(&self, key: &str, creator: F) -> (V, bool)
    where
        F: FnOnce(&str) -> V + Send,
    {
        ExpiringCache::get_or_compute(self, key, creator).await
    }

    async fn get_or_compute_timed<F>(&self, key: &str, lifetime: Duration, creator: F) -> (V, bool)
    where
        F: FnOnce(&str) -> V + Send,
    {
        ExpiringCache::get_or_compute_timed(self, key, lifetime, creator).await
    }
}
