//! Least-recently-used page replacement.
//!
//! Exact LRU on top of [`RecencyIndex`]: the index's recency list is the LRU
//! order, so a hit is one `make_newest` and an eviction is one `pop_oldest`.
//!
//! ## Architecture
//!
//! ```text
//!   index: RecencyIndex<SlotId>   capacity = n records
//!
//!   newest ─► [5:s5] ◄──► [8:s0] ◄──► [7:s7] ◄──► ... ◄──► [1:s1] ◄── oldest
//!                                                             │
//!                                   next miss reclaims s1 ────┘
//! ```
//!
//! ## Algorithm
//!
//! ```text
//! FETCH(key):
//!   hit  → make_newest(key)
//!   miss → slot = fresh arena slot, or pop_oldest().slot
//!          insert key → slot as newest
//! ```
//!
//! Both paths are O(1). Requires at least two slots.
//!
//! ## Example Usage
//!
//! ```
//! use pagekit::policy::lru::LruCache;
//! use pagekit::traits::PageCache;
//!
//! let mut cache = LruCache::try_new(64, 2).unwrap();
//! cache.fetch(1);
//! cache.fetch(2);
//! cache.fetch(1);
//!
//! cache.fetch(3);
//! assert!(cache.contains(1));
//! assert!(!cache.contains(2));
//! assert_eq!(cache.peek_lru(), Some(1));
//! ```

use crate::ds::{RecencyIndex, SlotArena, SlotId};
use crate::error::{CacheError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::CoreMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::CoreMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{CoreMetricsRecorder, MetricsSnapshotProvider};
use crate::policy::{INDEX_SIZED_FOR_CAPACITY, check_capacity};
use crate::traits::{Fetch, PageCache};

/// LRU page cache over a fixed slot arena.
#[derive(Debug)]
pub struct LruCache {
    arena: SlotArena,
    index: RecencyIndex<SlotId>,
    #[cfg(feature = "metrics")]
    metrics: CoreMetrics,
}

impl LruCache {
    /// Creates a cache of `capacity` slots of `slot_size` bytes.
    ///
    /// # Errors
    ///
    /// [`CacheError::Config`] if `capacity < 2`.
    pub fn try_new(slot_size: usize, capacity: usize) -> Result<Self, CacheError> {
        check_capacity("LRU", capacity, 2)?;
        let arena = SlotArena::try_new(slot_size, capacity)?;
        let index = RecencyIndex::try_with_capacity(capacity)?;
        Ok(Self {
            arena,
            index,
            #[cfg(feature = "metrics")]
            metrics: CoreMetrics::default(),
        })
    }

    /// Key the next eviction would reclaim, without touching recency.
    pub fn peek_lru(&self) -> Option<u64> {
        self.index.peek_oldest().map(|(key, _)| key)
    }

    /// Most recently fetched key.
    pub fn peek_mru(&self) -> Option<u64> {
        self.index.peek_newest().map(|(key, _)| key)
    }

    /// Resident keys from most to least recently used.
    pub fn keys_by_recency(&self) -> impl Iterator<Item = u64> + '_ {
        self.index.iter().map(|(key, _)| key)
    }
}

impl PageCache for LruCache {
    fn fetch(&mut self, key: u64) -> Fetch<'_> {
        if let Some(slot) = self.index.get(key) {
            self.index.make_newest(key);
            #[cfg(feature = "metrics")]
            self.metrics.record_fetch_hit();
            return Fetch::new(slot, true, self.arena.slot_mut(slot));
        }

        #[cfg(feature = "metrics")]
        self.metrics.record_fetch_miss();

        let slot = match self.arena.claim() {
            Some(slot) => {
                #[cfg(feature = "metrics")]
                self.metrics.record_fill();
                slot
            },
            None => {
                let (_, slot) = self.index.pop_oldest().expect(INDEX_SIZED_FOR_CAPACITY);
                #[cfg(feature = "metrics")]
                self.metrics.record_evicted_entry();
                slot
            },
        };
        self.index.insert(key, slot).expect(INDEX_SIZED_FOR_CAPACITY);
        Fetch::new(slot, false, self.arena.slot_mut(slot))
    }

    fn contains(&self, key: u64) -> bool {
        self.index.contains(key)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.arena.slot_count()
    }

    fn slot_size(&self) -> usize {
        self.arena.slot_size()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        self.index.check_invariants()?;
        if self.index.len() != self.arena.claimed() {
            return Err(InvariantError::new(format!(
                "{} keys indexed but {} slots claimed",
                self.index.len(),
                self.arena.claimed()
            )));
        }
        let mut seen = vec![false; self.arena.slot_count()];
        for (key, slot) in self.index.iter() {
            let i = slot.index();
            if i >= self.arena.claimed() || seen[i] {
                return Err(InvariantError::new(format!(
                    "key {key} maps to unclaimed or shared slot {i}"
                )));
            }
            seen[i] = true;
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
impl LruCache {
    /// Returns a snapshot of cache metrics.
    pub fn metrics_snapshot(&self) -> CoreMetricsSnapshot {
        CoreMetricsSnapshot::from_metrics(&self.metrics, self.len(), self.capacity())
    }
}

#[cfg(feature = "metrics")]
impl MetricsSnapshotProvider<CoreMetricsSnapshot> for LruCache {
    fn snapshot(&self) -> CoreMetricsSnapshot {
        self.metrics_snapshot()
    }
}
