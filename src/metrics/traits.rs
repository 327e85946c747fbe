//! # Metrics Trait Hierarchy
//!
//! Recording, snapshotting and export are separate traits so that policy code
//! only ever sees the recorder side.
//!
//! ## Architecture
//!
//! ```text
//!                         ┌─────────────────────────────┐
//!                         │     CoreMetricsRecorder     │
//!                         │  fetch_hit / fetch_miss     │
//!                         │  fill / evicted_entry       │
//!                         └──────────────┬──────────────┘
//!                                        │
//!                  ┌─────────────────────┴─────────────────────┐
//!                  ▼                                           ▼
//!        ┌────────────────────┐                     ┌────────────────────┐
//!        │ClockMetricsRecorder│                     │SlruMetricsRecorder │
//!        │ hand_advance       │                     │ promotion          │
//!        │ reference_decay    │                     │ demotion           │
//!        └────────────────────┘                     └────────────────────┘
//!
//!   Consumption (decoupled from recording):
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │    │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```
//!
//! FIFO, Random and LRU only record the core counters. Clock and GClock add
//! sweep counters; SLRU adds segment movement.

/// Common counters for any page cache policy.
pub trait CoreMetricsRecorder {
    /// A fetch found its key resident.
    fn record_fetch_hit(&mut self);
    /// A fetch did not find its key.
    fn record_fetch_miss(&mut self);
    /// A miss was served from a never-used slot.
    fn record_fill(&mut self);
    /// A miss reclaimed a slot from another key.
    fn record_evicted_entry(&mut self);
}

/// Metrics for clock-hand sweeps (Clock and GClock).
pub trait ClockMetricsRecorder: CoreMetricsRecorder {
    fn record_hand_advance(&mut self);
    /// A reference bit was cleared or a reference counter decremented.
    fn record_reference_decay(&mut self);
}

/// Metrics for segmented LRU.
pub trait SlruMetricsRecorder: CoreMetricsRecorder {
    /// A probationary hit moved its key into the protected segment.
    fn record_promotion(&mut self);
    /// Protected overflow pushed its oldest key back into probation.
    fn record_demotion(&mut self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Export/publish metrics to monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
