//! Cache Statistics Module
//!
//! Tracks hits, misses and render attempts for the page cache.

use parking_lot::Mutex;
use serde::Serialize;

// == Stats Snapshot ==
/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Lookups answered from the store
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Render attempts, successful or not
    pub renders: u64,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Hit rate as a percentage in `0.0..=100.0`, or 0.0 with no lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    /// Hit rate formatted for the stats endpoint: `"0%"` with no lookups,
    /// otherwise two decimals such as `"75.00%"`.
    pub fn hit_rate_label(&self) -> String {
        if self.hits + self.misses == 0 {
            "0%".to_string()
        } else {
            format!("{:.2}%", self.hit_rate())
        }
    }
}

// == Cache Stats ==
/// Process-wide counters shared by every request handler.
///
/// All three counters sit behind one lock so a reset is observed as a single
/// step and no increment is lost.
#[derive(Debug, Default)]
pub struct CacheStats {
    counters: Mutex<StatsSnapshot>,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&self) {
        self.counters.lock().hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&self) {
        self.counters.lock().misses += 1;
    }

    // == Record Render ==
    /// Counts a render attempt. Incremented before the outcome is known.
    pub fn record_render(&self) {
        self.counters.lock().renders += 1;
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> StatsSnapshot {
        *self.counters.lock()
    }

    // == Reset ==
    /// Zeroes all three counters together.
    pub fn reset(&self) {
        *self.counters.lock() = StatsSnapshot::default();
    }
}
