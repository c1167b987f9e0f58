//! Cache Store Module
//!
//! Main cache engine: a HashMap behind one async RwLock, with one expiry
//! waiter task per timed entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, RwLock};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::cache::entry::{expiry_deadline, Entry};
use crate::cache::stats::{CacheStats, StatsCounters};
use crate::config::Config;
use crate::tasks::spawn_expiry_waiter;

/// State shared between cache handles and expiry waiters.
pub(crate) struct Shared<V> {
    pub(crate) data: RwLock<HashMap<String, Entry<V>>>,
    pub(crate) stats: StatsCounters,
    pub(crate) config: Config,
}

/// Lifetime of a timed write, resolved before the map is touched.
#[derive(Debug, Clone, Copy)]
struct Ttl {
    lifetime: Duration,
    deadline: Option<Instant>,
}

impl Ttl {
    fn resolve(lifetime: Duration) -> Self {
        Self {
            lifetime,
            deadline: expiry_deadline(lifetime),
        }
    }
}

// == Expiring Cache ==
/// Concurrent string-keyed cache with optional per-entry expiry.
///
/// Cloning is cheap and yields another handle to the same cache. Waiters only
/// hold a weak reference, so dropping the last handle tears everything down.
///
/// Creator callbacks run while the write lock is held. They must not call
/// back into the same cache or the call will deadlock.
pub struct ExpiringCache<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for ExpiringCache<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V> ExpiringCache<V> {
    #[cfg(test)]
    pub(crate) fn shared(&self) -> &Arc<Shared<V>> {
        &self.shared
    }
}

impl<V> fmt::Debug for ExpiringCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("name", &self.shared.config.name)
            .finish_non_exhaustive()
    }
}

impl<V> Default for ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates an empty cache with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty cache with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            shared: Arc::new(Shared {
                data: RwLock::new(HashMap::new()),
                stats: StatsCounters::default(),
                config,
            }),
        }
    }

    /// Name attached to this cache's log events.
    pub fn name(&self) -> &str {
        &self.shared.config.name
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    // == Get ==
    /// Returns a clone of the value stored under `key`.
    ///
    /// Takes the read lock only and never touches a pending expiry.
    pub async fn get(&self, key: &str) -> Option<V> {
        let data = self.shared.data.read().await;
        match data.get(key) {
            Some(entry) => {
                self.shared.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.shared.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Returns true if `key` is present.
    pub async fn has(&self, key: &str) -> bool {
        self.shared.data.read().await.contains_key(key)
    }

    // == Put ==
    /// Stores `value` under `key` as a permanent entry.
    ///
    /// Any pending expiry for an existing entry is cancelled. Returns true if
    /// the key already existed.
    pub async fn put(&self, key: &str, value: V) -> bool {
        let mut data = self.shared.data.write().await;
        if let Some(entry) = data.get_mut(key) {
            self.cancel_expiry(entry);
            entry.value = value;
            self.shared.stats.record_overwrite();
            return true;
        }
        self.insert_entry(&mut data, key, value, None);
        false
    }

    // == Put If Absent ==
    /// Inserts `creator(key)` as a permanent entry if `key` is absent.
    ///
    /// The creator runs at most once, under the write lock. Returns true if it
    /// ran and the entry was inserted.
    pub async fn put_if_absent<F>(&self, key: &str, creator: F) -> bool
    where
        F: FnOnce(&str) -> V,
    {
        let mut data = self.shared.data.write().await;
        if data.contains_key(key) {
            return false;
        }
        let value = creator(key);
        self.insert_entry(&mut data, key, value, None);
        true
    }

    // == Remove ==
    /// Deletes `key`, cancelling its pending expiry. Returns true if it existed.
    pub async fn remove(&self, key: &str) -> bool {
        let mut data = self.shared.data.write().await;
        match data.remove(key) {
            Some(mut entry) => {
                self.cancel_expiry(&mut entry);
                self.shared.stats.record_removals(1);
                true
            }
            None => false,
        }
    }

    // == Clear ==
    /// Cancels every pending expiry and empties the cache.
    pub async fn clear(&self) {
        let mut data = self.shared.data.write().await;
        let mut cancelled = 0u64;
        for entry in data.values_mut() {
            if entry.kill_potential_expiry() {
                cancelled += 1;
            }
        }
        let removed = data.len() as u64;
        *data = HashMap::new();

        self.shared.stats.record_cancelled_expiries(cancelled);
        self.shared.stats.record_removals(removed);
        debug!(cache = %self.name(), removed, cancelled, "Cache cleared");
    }

    // == Get Or Compute ==
    /// Returns the value under `key`, computing and storing it if absent.
    ///
    /// The flag is true when the value was already present; `creator` is not
    /// called in that case.
    pub async fn get_or_compute<F>(&self, key: &str, creator: F) -> (V, bool)
    where
        F: FnOnce(&str) -> V,
    {
        self.get_or_compute_inner(key, None, creator).await
    }

    // == Put Timed ==
    /// Stores `value` under `key` and (re)starts a waiter that evicts it after
    /// `lifetime`.
    ///
    /// A zero lifetime evicts on the next scheduler turn. Returns true if the
    /// key already existed, timed or not. A lifetime too long to place on the
    /// clock still arms a waiter; it simply never fires in practice.
    pub async fn put_timed(&self, key: &str, lifetime: Duration, value: V) -> bool {
        let ttl = Ttl::resolve(lifetime);
        let mut data = self.shared.data.write().await;
        if let Some(entry) = data.get_mut(key) {
            self.cancel_expiry(entry);
            entry.value = value;
            self.start_expiry(entry, ttl);
            self.shared.stats.record_overwrite();
            return true;
        }
        self.insert_entry(&mut data, key, value, Some(ttl));
        false
    }

    /// `put_timed` using the configured default lifetime.
    pub async fn put_timed_default(&self, key: &str, value: V) -> bool {
        let lifetime = self.shared.config.default_lifetime;
        self.put_timed(key, lifetime, value).await
    }

    // == Put Timed If Absent ==
    /// Like `put_if_absent`, but the new entry expires after `lifetime`.
    ///
    /// Does nothing if `key` is present, whatever its own expiry state.
    pub async fn put_timed_if_absent<F>(&self, key: &str, lifetime: Duration, creator: F) -> bool
    where
        F: FnOnce(&str) -> V,
    {
        let ttl = Ttl::resolve(lifetime);
        let mut data = self.shared.data.write().await;
        if data.contains_key(key) {
            return false;
        }
        let value = creator(key);
        self.insert_entry(&mut data, key, value, Some(ttl));
        true
    }

    // == Get Or Compute Timed ==
    /// Like `get_or_compute`, but a newly computed entry expires after
    /// `lifetime`.
    ///
    /// An existing entry is returned as is. Its pending expiry, if any, is
    /// neither refreshed nor cancelled.
    pub async fn get_or_compute_timed<F>(
        &self,
        key: &str,
        lifetime: Duration,
        creator: F,
    ) -> (V, bool)
    where
        F: FnOnce(&str) -> V,
    {
        let ttl = Ttl::resolve(lifetime);
        self.get_or_compute_inner(key, Some(ttl), creator).await
    }

    // == Time To Live ==
    /// Remaining lifetime of a timed entry; None if absent or permanent.
    pub async fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let data = self.shared.data.read().await;
        data.get(key).and_then(|entry| entry.ttl_remaining())
    }

    /// Returns true if `key` is present and has a pending expiry.
    pub async fn is_timed(&self, key: &str) -> bool {
        let data = self.shared.data.read().await;
        data.get(key).is_some_and(|entry| entry.is_timed())
    }

    // == Length ==
    /// Returns the current number of entries.
    pub async fn len(&self) -> usize {
        self.shared.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.shared.data.read().await.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the cache counters.
    pub async fn stats(&self) -> CacheStats {
        let total_entries = self.len().await;
        self.shared.stats.snapshot(total_entries)
    }

    // == Internals ==
    async fn get_or_compute_inner<F>(
        &self,
        key: &str,
        ttl: Option<Ttl>,
        creator: F,
    ) -> (V, bool)
    where
        F: FnOnce(&str) -> V,
    {
        let mut data = self.shared.data.write().await;
        if let Some(entry) = data.get(key) {
            self.shared.stats.record_hit();
            return (entry.value.clone(), true);
        }
        self.shared.stats.record_miss();
        let value = creator(key);
        self.insert_entry(&mut data, key, value.clone(), ttl);
        (value, false)
    }

    /// Expects the write lock to be held and `key` to be absent.
    fn insert_entry(
        &self,
        data: &mut HashMap<String, Entry<V>>,
        key: &str,
        value: V,
        ttl: Option<Ttl>,
    ) {
        let mut entry = Entry::new(key.to_string(), value);
        if let Some(ttl) = ttl {
            self.start_expiry(&mut entry, ttl);
        }
        data.insert(key.to_string(), entry);
        self.shared.stats.record_insert();
    }

    /// Expects the write lock to be held and the entry to have no live waiter.
    fn start_expiry(&self, entry: &mut Entry<V>, ttl: Ttl) {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        entry.arm_expiry(cancel_tx, ttl.deadline);
        spawn_expiry_waiter(
            Arc::downgrade(&self.shared),
            entry.key().to_string(),
            ttl.lifetime,
            cancel_rx,
        );
        debug!(
            cache = %self.name(),
            key = entry.key(),
            lifetime = ?ttl.lifetime,
            "Expiry armed"
        );
    }

    /// Expects the write lock to be held.
    fn cancel_expiry(&self, entry: &mut Entry<V>) {
        if entry.kill_potential_expiry() {
            self.shared.stats.record_cancelled_expiries(1);
            trace!(cache = %self.name(), key = entry.key(), "Expiry cancelled");
        }
    }
}
