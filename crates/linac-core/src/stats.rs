//! Atomic pool statistics for lock-free usage tracking.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Statistics for pool usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// `get` calls served from the idle collection.
    pub hits: u64,
    /// `get` calls that ran the factory.
    pub misses: u64,
    /// Objects constructed by `reserve`.
    pub reserved: u64,
    /// Objects handed back with `put` or `put_many`.
    pub released: u64,
    /// Idle objects dropped by `clear`.
    pub discarded: u64,
}

impl PoolStats {
    /// Objects the factory has built, on either path.
    pub fn constructed(&self) -> u64 {
        self.misses + self.reserved
    }
}

impl std::ops::Add for PoolStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            hits: self.hits + rhs.hits,
            misses: self.misses + rhs.misses,
            reserved: self.reserved + rhs.reserved,
            released: self.released + rhs.released,
            discarded: self.discarded + rhs.discarded,
        }
    }
}

/// Atomic pool statistics for lock-free updates.
#[derive(Debug, Default)]
pub struct AtomicPoolStats {
    hits: AtomicU64,
    misses: AtomicU64,
    reserved: AtomicU64,
    released: AtomicU64,
    discarded: AtomicU64,
}

impl AtomicPoolStats {
    /// Create new zeroed stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a snapshot of current stats.
    pub fn snapshot(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            reserved: self.reserved.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.reserved.store(0, Ordering::Relaxed);
        self.released.store(0, Ordering::Relaxed);
        self.discarded.store(0, Ordering::Relaxed);
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reserved(&self, count: u64) {
        self.reserved.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_released(&self, count: u64) {
        self.released.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: u64) {
        self.discarded.fetch_add(count, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stats_are_zeroed() {
        let snap = AtomicPoolStats::new().snapshot();
        assert_eq!(snap, PoolStats::default());
    }

    #[test]
    fn record_and_snapshot() {
        let stats = AtomicPoolStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_reserved(4);
        stats.record_released(3);
        stats.record_discarded(2);
        let snap = stats.snapshot();
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.misses, 1);
        assert_eq!(snap.reserved, 4);
        assert_eq!(snap.released, 3);
        assert_eq!(snap.discarded, 2);
        assert_eq!(snap.constructed(), 5);
    }

    #[test]
    fn reset_clears_counters() {
        let stats = AtomicPoolStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_discarded(1);
        stats.reset();
        assert_eq!(stats.snapshot(), PoolStats::default());
    }

    #[test]
    fn snapshots_add_fieldwise() {
        let a = PoolStats { hits: 1, misses: 2, reserved: 3, released: 4, discarded: 5 };
        let b = PoolStats { hits: 10, misses: 20, reserved: 30, released: 40, discarded: 50 };
        assert_eq!(
            a + b,
            PoolStats { hits: 11, misses: 22, reserved: 33, released: 44, discarded: 55 }
        );
    }

    #[test]
    fn snapshot_serializes() {
        let snap = PoolStats { hits: 1, ..PoolStats::default() };
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("\"hits\":1"));
        let back: PoolStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
