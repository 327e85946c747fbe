//! Segmented LRU page replacement.
//!
//! Residents are split between two LRU segments:
//!
//! - **probationary**: every new key enters here as newest; evictions come
//!   from its oldest end
//! - **protected**: keys hit while probationary are promoted here, up to
//!   `protected_max = max(1, capacity / 2)` entries
//!
//! One-off keys therefore churn through probation without disturbing keys
//! that have been accessed at least twice. When promotion overflows the
//! protected segment, its oldest key is demoted back to the newest end of
//! probation instead of being discarded, giving it one more probationary
//! lifetime before eviction.
//!
//! ## Architecture
//!
//! ```text
//!   protected:    newest ─► [5] ◄──► [4] ◄──► [3] ◄──► [1] ◄── oldest
//!                   ▲ promote on probationary hit          │ demote on overflow
//!                   │                                      ▼
//!   probationary: newest ─► [0] ◄──► [9] ◄──► [8] ◄──► [7] ◄── oldest
//!                   ▲ new keys                              │ evict
//!                                                           ▼
//! ```
//!
//! Each segment is a [`RecencyIndex`] mapping key → slot. Slots never move
//! between keys except on eviction, so promotion and demotion only relink
//! index records.
//!
//! ## Algorithm
//!
//! ```text
//! FETCH(key):
//!   in protected    → make_newest there
//!   in probationary → move to protected as newest
//!                     if |protected| > protected_max:
//!                       move protected oldest to probationary newest
//!   miss            → slot = fresh arena slot, or
//!                     slot of probationary oldest (protected oldest if
//!                     probation is empty), which is evicted
//!                     insert key → slot into probationary as newest
//! ```
//!
//! While fresh slots remain, misses always fill probation even past its
//! nominal share, so no key is evicted before the arena is full.
//!
//! ## Example Usage
//!
//! ```
//! use pagekit::policy::slru::SlruCache;
//! use pagekit::traits::PageCache;
//!
//! let mut cache = SlruCache::try_new(64, 4).unwrap();
//! cache.fetch(1);
//! cache.fetch(1); // promoted
//! for key in 10..20 {
//!     cache.fetch(key); // scan churns through probation only
//! }
//! assert!(cache.contains(1));
//! assert_eq!(cache.protected_len(), 1);
//! ```

use crate::ds::{RecencyIndex, SlotArena, SlotId};
use crate::error::{CacheError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::SlruMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::{CoreMetricsSnapshot, SlruMetricsSnapshot};
#[cfg(feature = "metrics")]
use crate::metrics::traits::{CoreMetricsRecorder, MetricsSnapshotProvider, SlruMetricsRecorder};
use crate::policy::{INDEX_SIZED_FOR_CAPACITY, check_capacity};
use crate::traits::{Fetch, PageCache};

/// Segmented LRU page cache over a fixed slot arena.
#[derive(Debug)]
pub struct SlruCache {
    arena: SlotArena,
    protected: RecencyIndex<SlotId>,
    probationary: RecencyIndex<SlotId>,
    protected_max: usize,
    #[cfg(feature = "metrics")]
    metrics: SlruMetrics,
}

impl SlruCache {
    /// Creates a cache of `capacity` slots of `slot_size` bytes.
    ///
    /// # Errors
    ///
    /// [`CacheError::Config`] if `capacity < 2`.
    pub fn try_new(slot_size: usize, capacity: usize) -> Result<Self, CacheError> {
        check_capacity("SLRU", capacity, 2)?;
        let arena = SlotArena::try_new(slot_size, capacity)?;
        // probation may hold every key during warm-up
        let protected = RecencyIndex::try_with_capacity(capacity)?;
        let probationary = RecencyIndex::try_with_capacity(capacity)?;
        Ok(Self {
            arena,
            protected,
            probationary,
            protected_max: (capacity / 2).clamp(1, capacity),
            #[cfg(feature = "metrics")]
            metrics: SlruMetrics::default(),
        })
    }

    /// Maximum size of the protected segment.
    pub fn protected_max(&self) -> usize {
        self.protected_max
    }

    /// Nominal size of the probationary segment once the arena is full.
    pub fn probationary_max(&self) -> usize {
        self.capacity() - self.protected_max
    }

    pub fn protected_len(&self) -> usize {
        self.protected.len()
    }

    pub fn probationary_len(&self) -> usize {
        self.probationary.len()
    }

    /// Returns `true` if `key` is resident in the protected segment.
    pub fn is_protected(&self, key: u64) -> bool {
        self.protected.contains(key)
    }

    /// Key the next eviction would reclaim.
    pub fn peek_victim(&self) -> Option<u64> {
        self.probationary
            .peek_oldest()
            .or_else(|| self.protected.peek_oldest())
            .map(|(key, _)| key)
    }

    fn promote(&mut self, key: u64, slot: SlotId) {
        self.probationary.remove(key);
        self.protected.insert(key, slot).expect(INDEX_SIZED_FOR_CAPACITY);
        #[cfg(feature = "metrics")]
        self.metrics.record_promotion();

        if self.protected.len() > self.protected_max {
            let (demoted, demoted_slot) =
                self.protected.pop_oldest().expect(INDEX_SIZED_FOR_CAPACITY);
            self.probationary
                .insert(demoted, demoted_slot)
                .expect(INDEX_SIZED_FOR_CAPACITY);
            #[cfg(feature = "metrics")]
            self.metrics.record_demotion();
        }
    }

    fn evict(&mut self) -> SlotId {
        let (_, slot) = self
            .probationary
            .pop_oldest()
            .or_else(|| self.protected.pop_oldest())
            .expect(INDEX_SIZED_FOR_CAPACITY);
        #[cfg(feature = "metrics")]
        self.metrics.record_evicted_entry();
        slot
    }
}

impl PageCache for SlruCache {
    fn fetch(&mut self, key: u64) -> Fetch<'_> {
        if let Some(slot) = self.protected.get(key) {
            self.protected.make_newest(key);
            #[cfg(feature = "metrics")]
            self.metrics.record_fetch_hit();
            return Fetch::new(slot, true, self.arena.slot_mut(slot));
        }

        if let Some(slot) = self.probationary.get(key) {
            self.promote(key, slot);
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
            None => self.evict(),
        };
        self.probationary
            .insert(key, slot)
            .expect(INDEX_SIZED_FOR_CAPACITY);
        Fetch::new(slot, false, self.arena.slot_mut(slot))
    }

    fn contains(&self, key: u64) -> bool {
        self.protected.contains(key) || self.probationary.contains(key)
    }

    fn len(&self) -> usize {
        self.protected.len() + self.probationary.len()
    }

    fn capacity(&self) -> usize {
        self.arena.slot_count()
    }

    fn slot_size(&self) -> usize {
        self.arena.slot_size()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        self.protected.check_invariants()?;
        self.probationary.check_invariants()?;
        if self.len() != self.arena.claimed() {
            return Err(InvariantError::new(format!(
                "{} keys resident but {} slots claimed",
                self.len(),
                self.arena.claimed()
            )));
        }
        if self.protected.len() > self.protected_max {
            return Err(InvariantError::new(format!(
                "protected segment holds {} of {}",
                self.protected.len(),
                self.protected_max
            )));
        }
        let mut seen = vec![false; self.arena.slot_count()];
        for (key, slot) in self.protected.iter().chain(self.probationary.iter()) {
            let i = slot.index();
            if i >= self.arena.claimed() || seen[i] {
                return Err(InvariantError::new(format!(
                    "key {key} maps to unclaimed or shared slot {i}"
                )));
            }
            seen[i] = true;
        }
        for (key, _) in self.protected.iter() {
            if self.probationary.contains(key) {
                return Err(InvariantError::new(format!("key {key} is in both segments")));
            }
        }
        Ok(())
    }
}

#[cfg(feature = "metrics")]
impl SlruCache {
    /// Returns a snapshot of cache metrics.
    pub fn metrics_snapshot(&self) -> SlruMetricsSnapshot {
        SlruMetricsSnapshot {
            core: CoreMetricsSnapshot::from_metrics(
                &self.metrics.core,
                self.len(),
                self.capacity(),
            ),
            promotions: self.metrics.promotions,
            demotions: self.metrics.demotions,
            protected_len: self.protected.len(),
            probationary_len: self.probationary.len(),
        }
    }
}

#[cfg(feature = "metrics")]
impl MetricsSnapshotProvider<SlruMetricsSnapshot> for SlruCache {
    fn snapshot(&self) -> SlruMetricsSnapshot {
        self.metrics_snapshot()
    }
}
