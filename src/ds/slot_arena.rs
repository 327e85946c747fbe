//! Contiguous pre-allocated arena of fixed-size byte slots.
//!
//! All slot memory is reserved once at construction; the arena never
//! reallocates. Slots are handed out in index order by [`SlotArena::claim`]
//! until every slot has been claimed, after which policies recycle slots
//! through their own eviction rule.
//!
//! ```text
//!   data: [ slot 0 | slot 1 | slot 2 | ... | slot n-1 ]
//!           ▲                 ▲
//!           base              base + 2 * slot_size
//!
//!   claimed = 3  ──►  next claim() returns SlotId(3)
//! ```

use crate::error::{AllocError, try_vec};

/// Index of a slot inside a [`SlotArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    /// Returns the slot's position in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Fixed set of `slot_size`-byte regions carved from one allocation.
#[derive(Debug)]
pub struct SlotArena {
    data: Box<[u8]>,
    slot_size: usize,
    slots: usize,
    claimed: usize,
}

impl SlotArena {
    /// Reserves `slots` zeroed slots of `slot_size` bytes each.
    pub fn try_new(slot_size: usize, slots: usize) -> Result<Self, AllocError> {
        let bytes = slot_size
            .checked_mul(slots)
            .ok_or(AllocError::new(usize::MAX))?;
        let mut data = try_vec::<u8>(bytes)?;
        data.resize(bytes, 0);
        Ok(Self {
            data: data.into_boxed_slice(),
            slot_size,
            slots,
            claimed: 0,
        })
    }

    /// Hands out the next never-used slot, or `None` once all are claimed.
    #[inline]
    pub fn claim(&mut self) -> Option<SlotId> {
        if self.claimed == self.slots {
            return None;
        }
        let id = SlotId(self.claimed);
        self.claimed += 1;
        Some(id)
    }

    /// Number of slots handed out so far.
    #[inline]
    pub fn claimed(&self) -> usize {
        self.claimed
    }

    /// Returns `true` once every slot has been claimed.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.claimed == self.slots
    }

    /// Total number of slots.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots
    }

    /// Size of each slot in bytes.
    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Returns the bytes of slot `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    #[inline]
    pub fn slot(&self, id: SlotId) -> &[u8] {
        let start = id.0 * self.slot_size;
        &self.data[start..start + self.slot_size]
    }

    /// Returns the bytes of slot `id` for writing.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    #[inline]
    pub fn slot_mut(&mut self, id: SlotId) -> &mut [u8] {
        let start = id.0 * self.slot_size;
        &mut self.data[start..start + self.slot_size]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_arena_claims_in_order_until_exhausted() {
        let mut arena = SlotArena::try_new(16, 3).unwrap();
        assert_eq!(arena.claim(), Some(SlotId(0)));
        assert_eq!(arena.claim(), Some(SlotId(1)));
        assert!(!arena.is_exhausted());
        assert_eq!(arena.claim(), Some(SlotId(2)));
        assert!(arena.is_exhausted());
        assert_eq!(arena.claim(), None);
        assert_eq!(arena.claimed(), 3);
    }

    #[test]
    fn slot_arena_slots_are_disjoint_and_sized() {
        let mut arena = SlotArena::try_new(8, 4).unwrap();
        for i in 0..4 {
            arena.slot_mut(SlotId(i)).fill(i as u8 + 1);
        }
        for i in 0..4 {
            let slot = arena.slot(SlotId(i));
            assert_eq!(slot.len(), 8);
            assert!(slot.iter().all(|&b| b == i as u8 + 1));
        }
    }

    #[test]
    fn slot_addresses_are_base_plus_index_times_size() {
        let arena = SlotArena::try_new(32, 4).unwrap();
        let base = arena.slot(SlotId(0)).as_ptr() as usize;
        for i in 0..4 {
            assert_eq!(arena.slot(SlotId(i)).as_ptr() as usize, base + i * 32);
        }
    }

    #[test]
    fn zero_sized_slots_are_empty() {
        let mut arena = SlotArena::try_new(0, 5).unwrap();
        let id = arena.claim().unwrap();
        assert!(arena.slot(id).is_empty());
    }

    #[test]
    fn overflowing_size_is_an_alloc_error() {
        let err = SlotArena::try_new(usize::MAX, 2).unwrap_err();
        assert_eq!(err.bytes(), usize::MAX);
    }

    #[test]
    #[should_panic]
    fn out_of_range_slot_panics() {
        let arena = SlotArena::try_new(4, 2).unwrap();
        let _ = arena.slot(SlotId(2));
    }
}
