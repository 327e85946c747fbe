//! Random page replacement.
//!
//! Once every slot is in use, a miss reclaims a slot drawn uniformly from
//! `[0, capacity)`. Hits do no bookkeeping. Mostly useful as a baseline when
//! comparing hit ratios.
//!
//! ## Architecture
//!
//! ```text
//!   index: OpenIndex<SlotId>      key → slot
//!   keys:  [u64; capacity]        slot → key
//!   rng:   XorShift64 state
//!
//!   miss (full):  i = xorshift() % capacity
//!                 un-index keys[i]; keys[i] = key; index key → i
//! ```
//!
//! The generator is XorShift64 so that eviction sequences are reproducible
//! for a given seed and independent of platform randomness.
//!
//! ## Example Usage
//!
//! ```
//! use pagekit::policy::random::RandomCache;
//! use pagekit::traits::PageCache;
//!
//! let mut cache = RandomCache::try_with_seed(64, 4, 42).unwrap();
//! for key in 0..10 {
//!     cache.fetch(key);
//! }
//! assert_eq!(cache.len(), 4);
//! assert!(cache.contains(9));
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

/// Random-eviction page cache over a fixed slot arena.
#[derive(Debug)]
pub struct RandomCache {
    arena: SlotArena,
    index: OpenIndex<SlotId>,
    keys: Box<[u64]>,
    /// XorShift64 state; never zero.
    rng_state: u64,
    #[cfg(feature = "metrics")]
    metrics: CoreMetrics,
}

impl RandomCache {
    /// Creates a cache of `capacity` slots of `slot_size` bytes, seeded from
    /// the capacity.
    pub fn try_new(slot_size: usize, capacity: usize) -> Result<Self, CacheError> {
        let seed = (capacity as u64).wrapping_add(0x9e3779b97f4a7c15);
        Self::try_with_seed(slot_size, capacity, seed)
    }

    /// Creates a cache whose victim sequence is determined by `seed`.
    ///
    /// A zero seed is replaced by a fixed non-zero constant, since XorShift
    /// never leaves the zero state.
    pub fn try_with_seed(slot_size: usize, capacity: usize, seed: u64) -> Result<Self, CacheError> {
        check_capacity("Random", capacity, 1)?;
        let arena = SlotArena::try_new(slot_size, capacity)?;
        let index = OpenIndex::try_with_capacity(capacity)?;
        let mut keys = try_vec::<u64>(capacity)?;
        keys.resize(capacity, 0);
        Ok(Self {
            arena,
            index,
            keys: keys.into_boxed_slice(),
            rng_state: if seed == 0 { 0x9e3779b97f4a7c15 } else { seed },
            #[cfg(feature = "metrics")]
            metrics: CoreMetrics::default(),
        })
    }

    #[inline]
    fn next_random(&mut self) -> u64 {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        x
    }

    fn reclaim(&mut self) -> SlotId {
        let slot = SlotId((self.next_random() % self.keys.len() as u64) as usize);
        self.index.remove(self.keys[slot.0]);
        #[cfg(feature = "metrics")]
        self.metrics.record_evicted_entry();
        slot
    }
}

impl PageCache for RandomCache {
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
impl RandomCache {
    /// Returns a snapshot of cache metrics.
    pub fn metrics_snapshot(&self) -> CoreMetricsSnapshot {
        CoreMetricsSnapshot::from_metrics(&self.metrics, self.len(), self.capacity())
    }
}

#[cfg(feature = "metrics")]
impl MetricsSnapshotProvider<CoreMetricsSnapshot> for RandomCache {
    fn snapshot(&self) -> CoreMetricsSnapshot {
        self.metrics_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_misses(cache: &mut RandomCache, keys: impl IntoIterator<Item = u64>) -> usize {
        keys.into_iter()
            .filter(|&k| {
                let mut page = cache.fetch(k);
                if page.is_hit() {
                    assert!(page.data().iter().all(|&b| b == k as u8));
                    false
                } else {
                    page.data_mut().fill(k as u8);
                    true
                }
            })
            .count()
    }

    mod basic_operations {
        use super::*;

        #[test]
        fn test_zero_capacity_is_rejected() {
            assert!(RandomCache::try_new(8, 0).is_err());
        }

        #[test]
        fn test_no_eviction_while_everything_fits() {
            let mut cache = RandomCache::try_new(10, 8).unwrap();
            assert_eq!(count_misses(&mut cache, [0, 0]), 1);
            assert_eq!(count_misses(&mut cache, [1, 0, 1]), 1);
            assert_eq!(count_misses(&mut cache, 2..8), 6);
            assert_eq!(count_misses(&mut cache, [3, 0, 2, 6, 1, 7, 4, 5]), 0);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_zero_seed_is_usable() {
            let mut cache = RandomCache::try_with_seed(1, 2, 0).unwrap();
            for k in 0..50 {
                cache.fetch(k);
            }
            assert_eq!(cache.len(), 2);
            assert!(cache.contains(49));
        }
    }

    mod eviction {
        use super::*;

        #[test]
        fn test_each_miss_evicts_exactly_one_key() {
            let mut cache = RandomCache::try_new(4, 8).unwrap();
            count_misses(&mut cache, 0..8);
            for k in 8..100 {
                assert_eq!(count_misses(&mut cache, [k]), 1);
                assert_eq!(cache.len(), 8);
                assert!(cache.contains(k));
                let resident = (0..=k).filter(|&r| cache.contains(r)).count();
                assert_eq!(resident, 8);
            }
            cache.check_invariants().unwrap();
        }

        #[test]
        fn test_same_seed_same_victims() {
            let mut a = RandomCache::try_with_seed(1, 4, 7).unwrap();
            let mut b = RandomCache::try_with_seed(1, 4, 7).unwrap();
            for k in 0..64 {
                assert_eq!(a.fetch(k).slot_id(), b.fetch(k).slot_id());
            }
        }

        #[test]
        fn test_victims_spread_over_all_slots() {
            let mut cache = RandomCache::try_new(1, 4).unwrap();
            count_misses(&mut cache, 0..4);
            let mut seen = [false; 4];
            for k in 4..200 {
                seen[cache.fetch(k).slot_id().index()] = true;
            }
            assert!(seen.iter().all(|&s| s));
        }
    }
}
