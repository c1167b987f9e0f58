//! Cache Entry Module
//!
//! Defines a single cache slot and the handle to its pending expiry, if any.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

// == Expiry Handle ==
/// Handle to a live expiry waiter.
///
/// Sending on `cancel` is the only way to stop the waiter; the sender is
/// consumed by the send, so a waiter can be cancelled at most once.
#[derive(Debug)]
pub(crate) struct Expiry {
    cancel: oneshot::Sender<()>,
    /// None when the lifetime runs past what `Instant` can represent
    deadline: Option<Instant>,
}

/// Deadline for an expiry armed now, or None if `lifetime` overflows `Instant`.
pub(crate) fn expiry_deadline(lifetime: Duration) -> Option<Instant> {
    Instant::now().checked_add(lifetime)
}

// == Cache Entry ==
/// A single cached value and its optional expiry.
#[derive(Debug)]
pub(crate) struct Entry<V> {
    /// Key this entry is stored under, used by the waiter for cleanup
    key: String,
    /// The stored value
    pub(crate) value: V,
    /// Present iff a waiter task is alive for this entry
    expiry: Option<Expiry>,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates a permanent entry.
    pub(crate) fn new(key: String, value: V) -> Self {
        Self {
            key,
            value,
            expiry: None,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    // == Arm Expiry ==
    /// Records the cancel handle of a freshly spawned waiter.
    ///
    /// Expects the write lock to be held and any previous waiter to be gone.
    /// `deadline` comes from [`expiry_deadline`].
    pub(crate) fn arm_expiry(&mut self, cancel: oneshot::Sender<()>, deadline: Option<Instant>) {
        debug_assert!(
            self.expiry.is_none(),
            "entry {} already has a live expiry waiter",
            self.key
        );
        self.expiry = Some(Expiry { cancel, deadline });
    }

    // == Kill Potential Expiry ==
    /// Signals the pending waiter, if any, to stand down.
    ///
    /// Expects the write lock to be held. Returns true if a waiter was
    /// cancelled. The entry is permanent afterwards.
    pub(crate) fn kill_potential_expiry(&mut self) -> bool {
        match self.expiry.take() {
            Some(expiry) => {
                // The waiter may already be gone (cache dropped mid-flight).
                let _ = expiry.cancel.send(());
                true
            }
            None => false,
        }
    }

    /// Returns true if a waiter is pending for this entry.
    pub(crate) fn is_timed(&self) -> bool {
        self.expiry.is_some()
    }

    // == Time To Live ==
    /// Remaining nominal lifetime, or None for a permanent entry.
    ///
    /// Saturates at zero once the deadline has passed but the waiter has not
    /// yet taken the lock. An unrepresentable deadline reports `Duration::MAX`.
    pub(crate) fn ttl_remaining(&self) -> Option<Duration> {
        self.expiry.as_ref().map(|e| match e.deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        })
    }
}
