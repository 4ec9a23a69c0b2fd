//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, admissions, evictions and rejections.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Recorder ==
/// Lock-free counters updated by concurrent lookups and admissions.
#[derive(Debug, Default)]
pub struct StatsRecorder {
    hits: AtomicU64,
    misses: AtomicU64,
    admissions: AtomicU64,
    evictions: AtomicU64,
    rejections: AtomicU64,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_admission(&self) {
        self.admissions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Oversize payload turned away
    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters into a serializable snapshot.
    pub fn snapshot(&self, occupied_slots: usize, total_slots: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            admissions: self.admissions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            occupied_slots,
            total_slots,
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of cache activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a slot
    pub hits: u64,
    /// Lookups that found no matching slot
    pub misses: u64,
    /// Responses stored in a slot
    pub admissions: u64,
    /// Entries overwritten to make room for a different key
    pub evictions: u64,
    /// Responses refused for exceeding the object size limit
    pub rejections: u64,
    /// Slots currently holding a response
    pub occupied_slots: usize,
    /// Fixed slot count
    pub total_slots: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = StatsRecorder::new().snapshot(0, 10);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.total_slots, 10);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let recorder = StatsRecorder::new();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_hit();
        recorder.record_miss();
        assert_eq!(recorder.snapshot(1, 10).hit_rate(), 0.75);
    }

    #[test]
    fn test_counters_accumulate() {
        let recorder = StatsRecorder::new();
        recorder.record_admission();
        recorder.record_admission();
        recorder.record_eviction();
        recorder.record_rejection();

        let stats = recorder.snapshot(2, 2);
        assert_eq!(stats.admissions, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.rejections, 1);
        assert_eq!(stats.occupied_slots, 2);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(StatsRecorder::new().snapshot(0, 10)).unwrap();
        assert_eq!(json["total_slots"], 10);
        assert_eq!(json["hits"], 0);
    }
}
