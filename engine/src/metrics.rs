//! Refresh counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for refresh attempts.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
    /// Refreshes that acquired the refresh slot.
    pub refreshes_started: AtomicU64,
    /// Refreshes committed to the store.
    pub refreshes_succeeded: AtomicU64,
    /// Refreshes that failed after starting.
    pub refreshes_failed: AtomicU64,
    /// Refreshes turned away because one was already running.
    pub refreshes_rejected: AtomicU64,
    /// Row count of the last committed refresh.
    pub last_committed_rows: AtomicU64,
}

impl RefreshMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_started(&self) {
        self.refreshes_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_succeeded(&self, rows: usize) {
        self.refreshes_succeeded.fetch_add(1, Ordering::Relaxed);
        self.last_committed_rows.store(rows as u64, Ordering::Relaxed);
    }

    pub fn refresh_failed(&self) {
        self.refreshes_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn refresh_rejected(&self) {
        self.refreshes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters.
    pub fn snapshot(&self) -> RefreshMetricsSnapshot {
        RefreshMetricsSnapshot {
            refreshes_started: self.refreshes_started.load(Ordering::Relaxed),
            refreshes_succeeded: self.refreshes_succeeded.load(Ordering::Relaxed),
            refreshes_failed: self.refreshes_failed.load(Ordering::Relaxed),
            refreshes_rejected: self.refreshes_rejected.load(Ordering::Relaxed),
            last_committed_rows: self.last_committed_rows.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`RefreshMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshMetricsSnapshot {
    pub refreshes_started: u64,
    pub refreshes_succeeded: u64,
    pub refreshes_failed: u64,
    pub refreshes_rejected: u64,
    pub last_committed_rows: u64,
}
