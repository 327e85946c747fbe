//! First-in, first-out page replacement.
//!
//! Slots are reclaimed strictly in the order they were first filled. Hits do
//! nothing, so a key's residency depends only on how many misses followed its
//! insertion.
//!
//! ## Architecture
//!
//! ```text
//!   index: OpenIndex<SlotId>          key → slot
//!   keys:  [u64; capacity]            slot → key (for un-indexing victims)
//!
//!   slots  [0] [1] [2] [3] [4] [5] [6] [7]
//!           8   9   2   3   4   5   6   7
//!                   ▲
//!                  head   next victim, advances circularly
//! ```
//!
//! ## Algorithm
//!
//! ```text
//! FETCH(key):
//!   hit  → return slot
//!   miss → slot = fresh arena slot, or
//!          slot = head; head = (head + 1) % capacity; un-index keys[slot]
//!          keys[slot] = key; index key → slot
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use pagekit::policy::fifo::FifoCache;
//! use pagekit::traits::PageCache;
//!
//! let mut cache = FifoCache::try_new(64, 2).unwrap();
//! cache.fetch(1);
//! cache.fetch(2);
//! assert!(cache.fetch(1).is_hit());
//!
//! // 1 was inserted first, so it goes first regardless of the hit
//! cache.fetch(3);
//! assert!(!cache.contains(1));
//! ```

use crate::ds::{OpenIndex, SlotArena, SlotId};
use crate::error::{CacheError, InvariantError, try_vec};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::CoreMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::CoreMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{CoreMetricsRecorder, MetricsSnapshotProvider};
use crate::policy::{INDEX_SIZED_FOR_CAPACITY, check_capacity};
use crate::traits::{Fetch, PageCache};

/// FIFO page cache over a fixed slot arena.
#[derive(Debug)]
pub struct FifoCache {
    arena: SlotArena,
    index: OpenIndex<SlotId>,
    keys: Box<[u64]>,
    head: usize,
    #[cfg(feature = "metrics")]
    metrics: CoreMetrics,
}

impl FifoCache {
    /// Creates a cache of `capacity` slots of `slot_size` bytes.
    ///
    /// # Errors
    ///
    /// [`CacheError::Config`] if `capacity` is zero, [`CacheError::Alloc`] if
    /// the arena or index cannot be reserved.
    pub fn try_new(slot_size: usize, capacity: usize) -> Result<Self, CacheError> {
        check_capacity("FIFO", capacity, 1)?;
        let arena = SlotArena::try_new(slot_size, capacity)?;
        let index = OpenIndex::try_with_capacity(capacity)?;
        let mut keys = try_vec::<u64>(capacity)?;
        keys.resize(capacity, 0);
        Ok(Self {
            arena,
            index,
            keys: keys.into_boxed_slice(),
            head: 0,
            #[cfg(feature = "metrics")]
            metrics: CoreMetrics::default(),
        })
    }

    /// Slot the next eviction will reclaim once the arena is full.
    fn reclaim(&mut self) -> SlotId {
        let slot = SlotId(self.head);
        self.head = (self.head + 1) % self.keys.len();
        self.index.remove(self.keys[slot.0]);
        #[cfg(feature = "metrics")]
        self.metrics.record_evicted_entry();
        slot
    }
}

impl PageCache for FifoCache {
    fn fetch(&mut self, key: u64) -> Fetch<'_> {
        if let Some(slot) = self.index.get(key) {
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
            None => self.reclaim(),
        };
        self.keys[slot.0] = key;
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
        if !self.arena.is_exhausted() && self.head != 0 {
            return Err(InvariantError::new("head moved before the arena filled"));
        }
        for (i, &key) in self.keys.iter().enumerate().take(self.arena.claimed()) {
            if self.index.get(key) != Some(SlotId(i)) {
                return Err(InvariantError::new(format!(
                    "slot {i} holds key {key} but the index disagrees"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
impl FifoCache {
    /// Returns a snapshot of cache metrics.
    pub fn metrics_snapshot(&self) -> CoreMetricsSnapshot {
        CoreMetricsSnapshot::from_metrics(&self.metrics, self.len(), self.capacity())
    }
}

#[cfg(feature = "metrics")]
impl MetricsSnapshotProvider<CoreMetricsSnapshot> for FifoCache {
    fn snapshot(&self) -> CoreMetricsSnapshot {
        self.metrics_snapshot()
    }
}
