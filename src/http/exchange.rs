//! Exchange identifiers and in-flight tracking.
//!
//! # Responsibilities
//! - Generate unique exchange IDs for tracing
//! - Count exchanges whose response handler is still running
//! - Let callers wait until every exchange has finished

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Global atomic counter for exchange IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static EXCHANGE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one request/response exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeId(u64);

impl ExchangeId {
    /// Generate a new unique exchange ID.
    pub fn new() -> Self {
        Self(EXCHANGE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exchange-{}", self.0)
    }
}

/// Tracks exchanges in flight.
#[derive(Debug, Clone, Default)]
pub struct ExchangeTracker {
    inner: Arc<TrackerInner>,
}

#[derive(Debug, Default)]
struct TrackerInner {
    active: AtomicU64,
    idle: Notify,
}

impl ExchangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new exchange. Returns a guard that decrements on drop.
    pub fn track(&self) -> ExchangeGuard {
        self.inner.active.fetch_add(1, Ordering::SeqCst);
        ExchangeGuard {
            inner: Arc::clone(&self.inner),
            id: ExchangeId::new(),
        }
    }

    /// Get current in-flight exchange count.
    pub fn active_count(&self) -> u64 {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Wait until no exchange is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a guard dropped in between is not missed.
            notified.as_mut().enable();
            if self.active_count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Guard that tracks an exchange's lifetime.
/// Decrements the in-flight count when dropped.
#[derive(Debug)]
pub struct ExchangeGuard {
    inner: Arc<TrackerInner>,
    id: ExchangeId,
}

impl ExchangeGuard {
    /// Get this exchange's ID.
    pub fn id(&self) -> ExchangeId {
        self.id
    }
}

impl Drop for ExchangeGuard {
    fn drop(&mut self) {
        if self.inner.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.idle.notify_waiters();
        }
        tracing::trace!(exchange_id = %self.id, "Exchange finished");
    }
}
