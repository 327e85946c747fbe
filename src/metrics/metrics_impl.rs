use crate::metrics::traits::{ClockMetricsRecorder, CoreMetricsRecorder, SlruMetricsRecorder};

/// Counters shared by every policy.
#[derive(Debug, Default, Clone)]
pub struct CoreMetrics {
    pub fetch_calls: u64,
    pub fetch_hits: u64,
    pub fetch_misses: u64,
    pub fills: u64,
    pub evicted_entries: u64,
}

impl CoreMetricsRecorder for CoreMetrics {
    fn record_fetch_hit(&mut self) {
        self.fetch_calls += 1;
        self.fetch_hits += 1;
    }

    fn record_fetch_miss(&mut self) {
        self.fetch_calls += 1;
        self.fetch_misses += 1;
    }

    fn record_fill(&mut self) {
        self.fills += 1;
    }

    fn record_evicted_entry(&mut self) {
        self.evicted_entries += 1;
    }
}

/// Clock/GClock counters.
#[derive(Debug, Default, Clone)]
pub struct ClockMetrics {
    pub core: CoreMetrics,
    pub hand_advances: u64,
    pub reference_decays: u64,
}

impl CoreMetricsRecorder for ClockMetrics {
    fn record_fetch_hit(&mut self) {
        self.core.record_fetch_hit();
    }

    fn record_fetch_miss(&mut self) {
        self.core.record_fetch_miss();
    }

    fn record_fill(&mut self) {
        self.core.record_fill();
    }

    fn record_evicted_entry(&mut self) {
        self.core.record_evicted_entry();
    }
}

impl ClockMetricsRecorder for ClockMetrics {
    fn record_hand_advance(&mut self) {
        self.hand_advances += 1;
    }

    fn record_reference_decay(&mut self) {
        self.reference_decays += 1;
    }
}

/// Segmented LRU counters.
#[derive(Debug, Default, Clone)]
pub struct SlruMetrics {
    pub core: CoreMetrics,
    pub promotions: u64,
    pub demotions: u64,
}

impl CoreMetricsRecorder for SlruMetrics {
    fn record_fetch_hit(&mut self) {
        self.core.record_fetch_hit();
    }

    fn record_fetch_miss(&mut self) {
        self.core.record_fetch_miss();
    }

    fn record_fill(&mut self) {
        self.core.record_fill();
    }

    fn record_evicted_entry(&mut self) {
        self.core.record_evicted_entry();
    }
}

impl SlruMetricsRecorder for SlruMetrics {
    fn record_promotion(&mut self) {
        self.promotions += 1;
    }

    fn record_demotion(&mut self) {
        self.demotions += 1;
    }
}
