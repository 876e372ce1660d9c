//! Store statistics
//!
//! Lock-free counters bumped on the read and write paths.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by all threads using a store
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    fills: AtomicU64,
    writes: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `get` served from memory
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A `get` that found nothing in memory on its first look
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A miss that loaded the value from disk into memory
    pub fn record_fill(&self) {
        self.fills.fetch_add(1, Ordering::Relaxed);
    }

    /// A `set` that committed
    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self, entries: usize) -> StoreStats {
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fills: self.fills.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            entries,
        }
    }
}

/// Snapshot of store activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Reads served from memory
    pub hits: u64,
    /// Reads that missed memory on the fast path
    pub misses: u64,
    /// Misses that loaded a file into memory
    pub fills: u64,
    /// Committed writes
    pub writes: u64,
    /// Keys currently held in memory
    pub entries: usize,
}

impl StoreStats {
    /// hits / (hits + misses), or 0.0 before any read
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_counters() {
        let counters = CacheCounters::new();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        counters.record_fill();
        counters.record_write();

        let stats = counters.snapshot(3);
        assert_eq!(
            stats,
            StoreStats { hits: 2, misses: 1, fills: 1, writes: 1, entries: 3 }
        );
        assert!((stats.hit_rate() - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_rate_empty() {
        assert_eq!(StoreStats::default().hit_rate(), 0.0);
    }
}
