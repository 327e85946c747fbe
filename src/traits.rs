//! # Page Cache Trait
//!
//! Every replacement policy exposes the same single-call contract: ask for a
//! key, get back a slot. The policy decides whether the key was resident and,
//! if not, which slot to reclaim for it.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────┐
//!   │                 PageCache                    │
//!   │                                              │
//!   │  fetch(&mut, u64) → Fetch<'_>                │
//!   │  contains(&, u64) → bool                     │
//!   │  len / is_empty / capacity / slot_size       │
//!   │  check_invariants(&) → Result<(), _>         │
//!   └──────────────────────┬───────────────────────┘
//!                          │
//!     ┌──────┬──────┬──────┼──────┬──────┬──────┐
//!     ▼      ▼      ▼      ▼      ▼      ▼      ▼
//!   Fifo  Random  Clock  GClock  Lru   Slru   Cache (enum façade)
//! ```
//!
//! ## Fetch lifetime
//!
//! ```text
//!   let f = cache.fetch(7);        // &mut cache borrowed by f
//!   if f.is_miss() { init(f.data_mut()) }
//!   drop(f);                       // borrow ends
//!   cache.fetch(8);                // may reclaim key 7's slot
//! ```
//!
//! A [`Fetch`] holds the cache mutably, so slot bytes cannot outlive the next
//! call that might reclaim them.
//!
//! ## Example Usage
//!
//! ```
//! use pagekit::policy::clock::ClockCache;
//! use pagekit::traits::PageCache;
//!
//! fn load<C: PageCache>(cache: &mut C, key: u64) -> u8 {
//!     let mut page = cache.fetch(key);
//!     if page.is_miss() {
//!         page.data_mut().fill(key as u8);
//!     }
//!     page.data()[0]
//! }
//!
//! let mut cache = ClockCache::try_new(16, 4).unwrap();
//! assert_eq!(load(&mut cache, 3), 3);
//! assert!(cache.contains(3));
//! ```

use crate::ds::SlotId;
use crate::error::InvariantError;

/// Result of [`PageCache::fetch`]: the slot now bound to the key and whether
/// it already held that key's data.
///
/// On a hit the bytes are exactly as the caller last left them. On a miss the
/// bytes are whatever the slot's previous occupant (if any) left behind and
/// must be initialized by the caller.
#[derive(Debug)]
pub struct Fetch<'a> {
    slot: SlotId,
    hit: bool,
    data: &'a mut [u8],
}

impl<'a> Fetch<'a> {
    #[inline]
    pub(crate) fn new(slot: SlotId, hit: bool, data: &'a mut [u8]) -> Self {
        Self { slot, hit, data }
    }

    /// `true` if the key was already resident.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit
    }

    /// `true` if the slot was (re)assigned to the key by this call.
    #[inline]
    pub fn is_miss(&self) -> bool {
        !self.hit
    }

    /// Arena position of the slot.
    #[inline]
    pub fn slot_id(&self) -> SlotId {
        self.slot
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.data
    }

    /// Releases the hit flag and keeps only the slot bytes.
    #[inline]
    pub fn into_data(self) -> &'a mut [u8] {
        self.data
    }
}

/// Fixed-capacity cache of `slot_size`-byte pages keyed by `u64`.
pub trait PageCache {
    /// Returns the slot for `key`, reclaiming one by the policy's rule if the
    /// key is not resident and every slot is in use.
    fn fetch(&mut self, key: u64) -> Fetch<'_>;

    /// Returns `true` if `key` is resident. Performs no policy bookkeeping.
    fn contains(&self, key: u64) -> bool;

    /// Number of resident keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of resident keys.
    fn capacity(&self) -> usize;

    /// Size of each slot in bytes.
    fn slot_size(&self) -> usize;

    /// Verifies the policy's internal bookkeeping.
    fn check_invariants(&self) -> Result<(), InvariantError>;
}
