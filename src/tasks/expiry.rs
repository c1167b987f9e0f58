//! Expiry Waiter Task
//!
//! One background task per timed entry. It races the entry's lifetime against
//! a single-shot cancel signal and evicts the entry if the lifetime wins.

use std::sync::Weak;
use std::time::Duration;

use tokio::sync::oneshot::{self, error::TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::cache::Shared;

/// Spawns the waiter that evicts `key` after `lifetime` unless cancelled.
///
/// The task holds no lock while sleeping. When the sleep wins it takes the
/// write lock and checks `cancel` once more: a cancel sent while it was
/// queued on the lock still wins. A dropped sender counts as a cancel, so the
/// task also ends when the cache itself is dropped.
///
/// # Returns
/// A JoinHandle for the spawned task. Dropping it detaches the task.
pub(crate) fn spawn_expiry_waiter<V>(
    shared: Weak<Shared<V>>,
    key: String,
    lifetime: Duration,
    mut cancel: oneshot::Receiver<()>,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(lifetime) => {}
            _ = &mut cancel => {
                trace!(key = %key, "Expiry waiter stood down");
                return;
            }
        }

        let Some(shared) = shared.upgrade() else {
            return;
        };
        let mut data = shared.data.write().await;

        if !matches!(cancel.try_recv(), Err(TryRecvError::Empty)) {
            trace!(key = %key, "Expiry lost the race for the lock");
            return;
        }

        if data.remove(&key).is_some() {
            shared.stats.record_expiration();
            debug!(cache = %shared.config.name, key = %key, "Entry expired");
        }
    })
}
