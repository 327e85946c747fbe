//! Generalized Clock page replacement.
//!
//! Like [`clock`](crate::policy::clock) but each slot carries a small
//! saturating reference counter instead of a single bit. A hit adds one
//! reference up to `max_references`; each time the sweeping hand passes a
//! slot it removes one. A slot is reclaimed when the hand reaches it with no
//! references left.
//!
//! With the default cap of 1 the eviction order is identical to Clock.
//! Larger caps let frequently hit pages survive several sweeps.
//!
//! ```text
//!   counters  [0]=2  [1]=1  [2]=0        hand → 0, cap 2
//!
//!   miss 3:   [0] 2→1, [1] 1→0, [2] taken          hand → 0
//!   miss 4:   [0] 1→0, [1] taken                   hand → 2
//!   miss 5:   [2] taken (key 3, never hit)         hand → 0
//!   miss 6:   [0] taken
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use pagekit::policy::gclock::GClockCache;
//! use pagekit::traits::PageCache;
//!
//! let mut cache = GClockCache::try_with_max_references(64, 2, 3).unwrap();
//! assert_eq!(cache.max_references(), 3);
//! cache.fetch(1);
//! cache.fetch(1);
//! cache.fetch(2);
//! cache.fetch(3);
//! assert!(cache.contains(1));
//! ```

use crate::ds::{OpenIndex, SlotArena, SlotId};
use crate::error::{CacheError, ConfigError, InvariantError, try_vec};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::ClockMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::{ClockMetricsSnapshot, CoreMetricsSnapshot};
#[cfg(feature = "metrics")]
use crate::metrics::traits::{ClockMetricsRecorder, CoreMetricsRecorder, MetricsSnapshotProvider};
use crate::policy::{INDEX_SIZED_FOR_CAPACITY, check_capacity};
use crate::traits::{Fetch, PageCache};

/// Reference cap used by [`GClockCache::try_new`].
pub const DEFAULT_MAX_REFERENCES: u8 = 1;

#[derive(Debug, Clone, Copy, Default)]
struct Page {
    references: u8,
    key: u64,
}

/// GClock page cache over a fixed slot arena.
#[derive(Debug)]
pub struct GClockCache {
    arena: SlotArena,
    index: OpenIndex<SlotId>,
    pages: Box<[Page]>,
    hand: usize,
    max_references: u8,
    #[cfg(feature = "metrics")]
    metrics: ClockMetrics,
}

impl GClockCache {
    /// Creates a cache of `capacity` slots of `slot_size` bytes with
    /// [`DEFAULT_MAX_REFERENCES`].
    pub fn try_new(slot_size: usize, capacity: usize) -> Result<Self, CacheError> {
        Self::try_with_max_references(slot_size, capacity, DEFAULT_MAX_REFERENCES)
    }

    /// Creates a cache whose per-slot counters saturate at `max_references`.
    ///
    /// # Errors
    ///
    /// [`CacheError::Config`] if `capacity` or `max_references` is zero.
    pub fn try_with_max_references(
        slot_size: usize,
        capacity: usize,
        max_references: u8,
    ) -> Result<Self, CacheError> {
        check_capacity("GClock", capacity, 1)?;
        if max_references == 0 {
            return Err(ConfigError::new("GClock max_references must be at least 1").into());
        }
        let arena = SlotArena::try_new(slot_size, capacity)?;
        let index = OpenIndex::try_with_capacity(capacity)?;
        let mut pages = try_vec::<Page>(capacity)?;
        pages.resize(capacity, Page::default());
        Ok(Self {
            arena,
            index,
            pages: pages.into_boxed_slice(),
            hand: 0,
            max_references,
            #[cfg(feature = "metrics")]
            metrics: ClockMetrics::default(),
        })
    }

    /// Saturation point of the per-slot reference counters.
    pub fn max_references(&self) -> u8 {
        self.max_references
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

    fn reclaim(&mut self) -> SlotId {
        while self.pages[self.hand].references > 0 {
            self.pages[self.hand].references -= 1;
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

impl PageCache for GClockCache {
    fn fetch(&mut self, key: u64) -> Fetch<'_> {
        if let Some(slot) = self.index.get(key) {
            let page = &mut self.pages[slot.0];
            if page.references < self.max_references {
                page.references += 1;
            }
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
        self.pages[slot.0] = Page { references: 0, key };
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
            if page.references > self.max_references {
                return Err(InvariantError::new(format!(
                    "slot {i} has {} references, cap is {}",
                    page.references, self.max_references
                )));
            }
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
impl GClockCache {
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
impl MetricsSnapshotProvider<ClockMetricsSnapshot> for GClockCache {
    fn snapshot(&self) -> ClockMetricsSnapshot {
        self.metrics_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn expect(cache: &mut GClockCache, key: u64, hit: bool) {
        let mut page = cache.fetch(key);
        assert_eq!(page.is_hit(), hit, "key {key}");
        if hit {
            assert!(page.data().iter().all(|&b| b == key as u8), "key {key} lost its data");
        } else {
            page.data_mut().fill(key as u8);
        }
    }

    mod configuration {
        use super::*;

        #[test]
        fn test_default_cap_is_one() {
            let cache = GClockCache::try_new(8, 4).unwrap();
            assert_eq!(cache.max_references(), DEFAULT_MAX_REFERENCES);
            assert_eq!(cache.max_references(), 1);
        }

        #[test]
        fn test_zero_cap_is_rejected() {
            let err = GClockCache::try_with_max_references(8, 4, 0).unwrap_err();
            assert!(matches!(err, CacheError::Config(_)));
        }

        #[test]
        fn test_zero_capacity_is_rejected() {
            assert!(GClockCache::try_new(8, 0).is_err());
        }
    }

    mod eviction_order {
        use super::*;

        #[test]
        fn test_default_cap_matches_clock_example() {
            let mut cache = GClockCache::try_new(10, 8).unwrap();
            for k in 0..8 {
                expect(&mut cache, k, false);
            }
            expect(&mut cache, 1, true);
            expect(&mut cache, 8, false);
            assert!(!cache.contains(0));
            expect(&mut cache, 0, false);
            assert!(cache.contains(1));
            assert!(!cache.contains(2));
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_repeated_hits_saturate_at_one() {
            let mut cache = GClockCache::try_new(1, 2).unwrap();
            expect(&mut cache, 0, false);
            expect(&mut cache, 1, false);
            for _ in 0..5 {
                expect(&mut cache, 0, true);
            }
            // one pass clears 0's single reference, 1 goes
            expect(&mut cache, 2, false);
            assert!(!cache.contains(1));
            // then 0 goes on the next miss: five hits bought only one pass
            expect(&mut cache, 3, false);
            assert!(!cache.contains(0));
        }

        #[test]
        fn test_higher_cap_survives_more_sweeps() {
            let mut cache = GClockCache::try_with_max_references(1, 3, 2).unwrap();
            for k in 0..3 {
                expect(&mut cache, k, false);
            }
            expect(&mut cache, 0, true);
            expect(&mut cache, 0, true);
            expect(&mut cache, 1, true);

            expect(&mut cache, 3, false);
            assert!(!cache.contains(2));
            expect(&mut cache, 4, false);
            assert!(!cache.contains(1));
            expect(&mut cache, 5, false);
            assert!(!cache.contains(3));
            assert!(cache.contains(0));
            expect(&mut cache, 6, false);
            assert!(!cache.contains(0));
            cache.check_invariants().unwrap();
        }
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::policy::clock::ClockCache;
    use proptest::prelude::*;

    proptest! {
        /// Property: with a cap of one, GClock reclaims exactly the slots
        /// Clock does
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_cap_one_behaves_like_clock(
            capacity in 1usize..10,
            keys in prop::collection::vec(0u64..24, 0..300)
        ) {
            let mut gclock = GClockCache::try_new(1, capacity).unwrap();
            let mut clock = ClockCache::try_new(1, capacity).unwrap();
            for key in keys {
                let g = gclock.fetch(key);
                let c = clock.fetch(key);
                prop_assert_eq!(g.is_hit(), c.is_hit());
                prop_assert_eq!(g.slot_id(), c.slot_id());
            }
            prop_assert!(gclock.check_invariants().is_ok());
        }

        /// Property: counters never exceed the cap
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_counters_respect_cap(
            cap in 1u8..5,
            keys in prop::collection::vec(0u64..16, 0..300)
        ) {
            let mut cache = GClockCache::try_with_max_references(1, 6, cap).unwrap();
            for key in keys {
                cache.fetch(key);
            }
            prop_assert!(cache.check_invariants().is_ok());
            prop_assert!(cache.len() <= 6);
        }
    }
}
