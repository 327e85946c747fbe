//! Point-in-time copies of policy counters plus gauges taken at snapshot time.

use crate::metrics::metrics_impl::CoreMetrics;

/// Shared counters for any policy.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoreMetricsSnapshot {
    pub fetch_calls: u64,
    pub fetch_hits: u64,
    pub fetch_misses: u64,
    pub fills: u64,
    pub evicted_entries: u64,

    // gauges captured at snapshot time
    pub cache_len: usize,
    pub capacity: usize,
}

impl CoreMetricsSnapshot {
    pub(crate) fn from_metrics(metrics: &CoreMetrics, cache_len: usize, capacity: usize) -> Self {
        Self {
            fetch_calls: metrics.fetch_calls,
            fetch_hits: metrics.fetch_hits,
            fetch_misses: metrics.fetch_misses,
            fills: metrics.fills,
            evicted_entries: metrics.evicted_entries,
            cache_len,
            capacity,
        }
    }

    /// Fraction of fetches that hit, or `0.0` before the first fetch.
    pub fn hit_ratio(&self) -> f64 {
        if self.fetch_calls == 0 {
            0.0
        } else {
            self.fetch_hits as f64 / self.fetch_calls as f64
        }
    }
}

/// Clock/GClock snapshot composed from the core snapshot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClockMetricsSnapshot {
    pub core: CoreMetricsSnapshot,
    pub hand_advances: u64,
    pub reference_decays: u64,
}

impl ClockMetricsSnapshot {
    pub fn hit_ratio(&self) -> f64 {
        self.core.hit_ratio()
    }
}

/// Segmented LRU snapshot composed from the core snapshot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SlruMetricsSnapshot {
    pub core: CoreMetricsSnapshot,
    pub promotions: u64,
    pub demotions: u64,

    pub protected_len: usize,
    pub probationary_len: usize,
}

impl SlruMetricsSnapshot {
    pub fn hit_ratio(&self) -> f64 {
        self.core.hit_ratio()
    }
}

impl From<ClockMetricsSnapshot> for CoreMetricsSnapshot {
    fn from(snapshot: ClockMetricsSnapshot) -> Self {
        snapshot.core
    }
}

impl From<SlruMetricsSnapshot> for CoreMetricsSnapshot {
    fn from(snapshot: SlruMetricsSnapshot) -> Self {
        snapshot.core
    }
}
