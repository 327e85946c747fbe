//! Clock (second-chance) page replacement.
//!
//! Approximates LRU with one reference bit per slot. A hit sets the bit; an
//! eviction sweeps a hand over the slots, clearing set bits, and reclaims the
//! first slot whose bit was already clear.
//!
//! ## Architecture
//!
//! ```text
//!   index: OpenIndex<SlotId>          key → slot
//!   pages: [Page; capacity]           slot → { key, referenced }
//!
//!     [0]   [1]   [2]   [3]   [4]   [5]   [6]   [7]
//!    ┌───┐ ┌───┐ ┌───┐ ┌───┐ ┌───┐ ┌───┐ ┌───┐ ┌───┐
//!    │ 8 │ │ 1 │ │ 0 │ │ 2 │ │ 3 │ │ 5 │ │ 6 │ │ 7 │
//!    │   │ │ref│ │   │ │   │ │   │ │   │ │   │ │   │
//!    └───┘ └───┘ └───┘ └───┘ └───┘ └───┘ └───┘ └───┘
//!                                    ▲
//!                                   hand
//! ```
//!
//! ## Algorithm
//!
//! ```text
//! FETCH(key):
//!   hit  → pages[slot].referenced = true
//!   miss → if a fresh slot remains: use it, referenced = false
//!          else:
//!            while pages[hand].referenced:
//!              pages[hand].referenced = false; hand = (hand + 1) % n
//!            slot = hand; hand = (hand + 1) % n
//!            un-index pages[slot].key
//!          pages[slot].key = key; index key → slot
//! ```
//!
//! The hand keeps its position between calls, so every referenced slot gets
//! exactly one pass of protection. A sweep terminates within one revolution
//! because it clears every bit it passes.
//!
//! ## Performance
//!
//! | Operation | Time | Notes |
//! |-----------|------|-------|
//! | hit       | O(1) | index probe + bit set |
//! | miss      | O(1)* | *amortized; a sweep visits at most `n` slots |
//!
//! ## Example Usage
//!
//! ```
//! use pagekit::policy::clock::ClockCache;
//! use pagekit::traits::PageCache;
//!
//! let mut cache = ClockCache::try_new(64, 2).unwrap();
//! cache.fetch(1);
//! cache.fetch(2);
//! cache.fetch(1); // second chance for 1
//!
//! cache.fetch(3);
//! assert!(cache.contains(1));
//! assert!(!cache.contains(2));
//! ```

use crate::ds::{OpenIndex, SlotArena, SlotId};
use crate::error::{CacheError, InvariantError, try_vec};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::ClockMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::{ClockMetricsSnapshot, CoreMetricsSnapshot};
#[cfg(feature = "metrics")]
use crate::metrics::traits::{ClockMetricsRecorder, CoreMetricsRecorder, MetricsSnapshotProvider};
use crate::policy::{INDEX_SIZED_FOR_CAPACITY, check_capacity};
use crate::traits::{Fetch, PageCache};

#[derive(Debug, Clone, Copy, Default)]
struct Page {
    referenced: bool,
    key: u64,
}

/// Clock page cache over a fixed slot arena.
#[derive(Debug)]
pub struct ClockCache {
    arena: SlotArena,
    index: OpenIndex<SlotId>,
    pages: Box<[Page]>,
    hand: usize,
    #[cfg(feature = "metrics")]
    metrics: ClockMetrics,
}

impl ClockCache {
    /// Creates a cache of `capacity` slots of `slot_size` bytes.
    pub fn try_new(slot_size: usize, capacity: usize) -> Result<Self, CacheError> {
        check_capacity("Clock", capacity, 1)?;
        let arena = SlotArena::try_new(slot_size, capacity)?;
        let index = OpenIndex::try_with_capacity(capacity)?;
        let mut pages = try_vec::<Page>(capacity)?;
        pages.resize(capacity, Page::default());
        Ok(Self {
            arena,
            index,
            pages: pages.into_boxed_slice(),
            hand: 0,
            #[cfg(feature = "metrics")]
            metrics: ClockMetrics::default(),
        })
    }

    #[inline]
    fn advance_hand(&mut self) {
        self.hand += 1;
        if self.hand >= self.pages.len() {
            self.hand = 0;
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_hand_advance();
    }

    /// Sweeps to the first unreferenced slot, un-indexes its key and leaves
    /// the hand just past it.
    fn reclaim(&mut self) -> SlotId {
        while self.pages[self.hand].referenced {
            self.pages[self.hand].referenced = false;
            #[cfg(feature = "metrics")]
            self.metrics.record_reference_decay();
            self.advance_hand();
        }
        let slot = SlotId(self.hand);
        self.advance_hand();
        self.index.remove(self.pages[slot.0].key);
        #[cfg(feature = "metrics")]
        self.metrics.record_evicted_entry();
        slot
    }
}

impl PageCache for ClockCache {
    fn fetch(&mut self, key: u64) -> Fetch<'_> {
        if let Some(slot) = self.index.get(key) {
            self.pages[slot.0].referenced = true;
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
        self.pages[slot.0] = Page {
            referenced: false,
            key,
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
        if self.hand >= self.pages.len() {
            return Err(InvariantError::new("clock hand out of range"));
        }
        for (i, page) in self.pages.iter().enumerate().take(self.arena.claimed()) {
            if self.index.get(page.key) != Some(SlotId(i)) {
                return Err(InvariantError::new(format!(
                    "slot {i} holds key {} but the index disagrees",
                    page.key
                )));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
impl ClockCache {
    /// Returns a snapshot of cache metrics.
    pub fn metrics_snapshot(&self) -> ClockMetricsSnapshot {
        ClockMetricsSnapshot {
            core: CoreMetricsSnapshot::from_metrics(
                &self.metrics.core,
                self.len(),
                self.capacity(),
            ),
            hand_advances: self.metrics.hand_advances,
            reference_decays: self.metrics.reference_decays,
        }
    }
}

#[cfg(feature = "metrics")]
impl MetricsSnapshotProvider<ClockMetricsSnapshot> for ClockCache {
    fn snapshot(&self) -> ClockMetricsSnapshot {
        self.metrics_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fetches `key` and asserts whether it hit, checking or writing a
    /// key-derived fill.
    #[track_caller]
    fn expect(cache: &mut ClockCache, key: u64, hit: bool) {
        let mut page = cache.fetch(key);
        assert_eq!(page.is_hit(), hit, "key {key}");
        if hit {
            assert!(page.data().iter().all(|&b| b == key as u8), "key {key} lost its data");
        } else {
            page.data_mut().fill(key as u8);
        }
    }

    fn filled(capacity: u64) -> ClockCache {
        let mut cache = ClockCache::try_new(10, capacity as usize).unwrap();
        for k in 0..capacity {
            expect(&mut cache, k, false);
        }
        cache
    }

    mod basic_operations {
        use super::*;

        #[test]
        fn test_zero_capacity_is_rejected() {
            assert!(ClockCache::try_new(1, 0).is_err());
        }

        #[test]
        fn test_no_eviction_below_capacity() {
            let mut cache = ClockCache::try_new(10, 8).unwrap();
            expect(&mut cache, 0, false);
            expect(&mut cache, 0, true);
            expect(&mut cache, 1, false);
            expect(&mut cache, 0, true);
            expect(&mut cache, 1, true);
            for k in 2..8 {
                expect(&mut cache, k, false);
            }
            for k in 0..8 {
                expect(&mut cache, k, true);
            }
            cache.check_invariants().unwrap();
        }
    }

    mod eviction_order {
        use super::*;

        #[test]
        fn test_unreferenced_slot_at_hand_goes_first() {
            let mut cache = filled(8);
            expect(&mut cache, 1, true);

            // hand at 0, bit clear
            expect(&mut cache, 8, false);
            assert!(!cache.contains(0));

            // 1 gets its second chance, 2 goes
            expect(&mut cache, 0, false);
            assert!(cache.contains(1));
            assert!(!cache.contains(2));
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_hand_resumes_across_calls() {
            let mut cache = filled(8);
            expect(&mut cache, 1, true);
            expect(&mut cache, 8, false); // evicts 0
            expect(&mut cache, 0, false); // evicts 2
            expect(&mut cache, 1, true);
            expect(&mut cache, 2, false); // evicts 3
            expect(&mut cache, 3, false); // evicts 4
            assert!(!cache.contains(4));

            for k in [1, 0, 2, 3, 5, 6, 7] {
                expect(&mut cache, k, true);
            }
            // every bit but 8's is set: the sweep clears 5..7 and takes 8
            expect(&mut cache, 9, false);
            assert!(!cache.contains(8));
            // second sweep clears 1, 0, 2, 3 and lands on 5
            expect(&mut cache, 8, false);
            assert!(!cache.contains(5));
            for k in [9, 1, 0, 2, 3, 6, 7, 8] {
                assert!(cache.contains(k), "key {k}");
            }
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_all_referenced_sweeps_full_revolution() {
            let mut cache = filled(4);
            for k in 0..4 {
                expect(&mut cache, k, true);
            }
            // every bit cleared, then the hand's original slot is taken
            expect(&mut cache, 10, false);
            assert!(!cache.contains(0));
            expect(&mut cache, 11, false);
            assert!(!cache.contains(1));
        }
    }

    #[cfg(feature = "metrics")]
    mod metrics {
        use super::*;

        #[test]
        fn test_sweep_is_counted() {
            let mut cache = filled(4);
            for k in 0..4 {
                expect(&mut cache, k, true);
            }
            expect(&mut cache, 10, false);
            let snapshot = cache.metrics_snapshot();
            assert_eq!(snapshot.reference_decays, 4);
            assert_eq!(snapshot.hand_advances, 5);
            assert_eq!(snapshot.core.evicted_entries, 1);
            assert_eq!(snapshot.core.fills, 4);
        }
    }
}
