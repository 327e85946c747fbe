//! Open-addressing `u64` key index with 4-record probe blocks.
//!
//! Records are grouped in blocks of four. Each block carries one byte of
//! state holding two bits per record: empty, occupied or tombstoned. A key's
//! home position is `hash64shift(key) % record_count`; its block is
//! `pos >> 2` and its record within the block `pos & 3`. Collisions probe
//! linearly across blocks, wrapping at the end of the table.
//!
//! ## Architecture
//!
//! ```text
//!   blocks: [Block; n]          record_count = 4 * n ≈ 1.4 * capacity
//!
//!   Block ┌───────┬──────────┬──────────┬──────────┬──────────┐
//!         │ state │ rec 0    │ rec 1    │ rec 2    │ rec 3    │
//!         │ 8 bit │ key, val │ key, val │ key, val │ key, val │
//!         └───────┴──────────┴──────────┴──────────┴──────────┘
//!           bits: [r3 r3 | r2 r2 | r1 r1 | r0 r0]
//!           00 = empty, 01 = tombstone, 10 = occupied
//! ```
//!
//! ## Probing
//!
//! - `get`/`remove` stop at the first *empty* record. Tombstones do not end a
//!   probe: they mark a key that once lived on this path, so keys placed
//!   after it may still sit further along.
//! - `insert` places the key in the first non-occupied record on its path,
//!   unless the key is already present further along, in which case the
//!   existing record is overwritten.
//! - `remove` leaves a tombstone. A tombstone directly followed by an empty
//!   record can never lead a probe anywhere, so such trailing tombstones are
//!   turned back into empty records. A tombstone with an occupied record
//!   after it is always kept, so no lookup result changes; reclaiming only
//!   keeps probe paths short under insert/remove churn.
//!
//! ## Performance
//! - `get` / `insert` / `remove`: O(1) expected at the ~71% load the policies run at
//! - No allocation after construction

use rustc_hash::FxHashSet;

use crate::ds::hash::bucket_of;
use crate::ds::slot_arena::SlotId;
use crate::error::{CacheError, ConfigError, InvariantError, TableFullError, try_vec};

const STATE_EMPTY: u8 = 0;
const STATE_TOMBSTONE: u8 = 1;
const STATE_OCCUPIED: u8 = 2;

const RECORDS_PER_BLOCK: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
struct Record<V> {
    key: u64,
    value: V,
}

#[derive(Debug, Clone, Copy, Default)]
struct Block<V> {
    state: u8,
    records: [Record<V>; RECORDS_PER_BLOCK],
}

impl<V> Block<V> {
    #[inline]
    fn record_state(&self, record: usize) -> u8 {
        (self.state >> (record << 1)) & 3
    }

    #[inline]
    fn set_record_state(&mut self, record: usize, state: u8) {
        self.state = (self.state & !(3 << (record << 1))) | ((state & 3) << (record << 1));
    }
}

/// Fixed-size open-addressing map from `u64` keys to small `Copy` values.
#[derive(Debug)]
pub struct OpenIndex<V = SlotId> {
    blocks: Box<[Block<V>]>,
    record_count: usize,
    capacity: usize,
    len: usize,
    tombstones: usize,
}

impl<V> OpenIndex<V>
where
    V: Copy + Default,
{
    /// Creates an index sized for `capacity` live entries.
    ///
    /// The table holds `floor(capacity * 1.4) / 4 + 1` blocks, keeping the
    /// load factor at or below roughly 71% when `capacity` entries are live.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, CacheError> {
        let scaled = capacity
            .checked_mul(7)
            .map(|n| n / 5)
            .ok_or_else(|| ConfigError::new(format!("capacity {capacity} is too large to index")))?;
        let block_count = scaled / RECORDS_PER_BLOCK + 1;
        let mut blocks = try_vec::<Block<V>>(block_count)?;
        blocks.resize_with(block_count, Block::default);
        Ok(Self {
            blocks: blocks.into_boxed_slice(),
            record_count: block_count * RECORDS_PER_BLOCK,
            capacity,
            len: 0,
            tombstones: 0,
        })
    }

    /// Number of live entries the index was sized for.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of records (four per block).
    #[inline]
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Number of occupied records.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no record is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of tombstoned records.
    #[inline]
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Returns `true` if `key` is present.
    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        self.find(key).is_some()
    }

    /// Looks up the value stored for `key`.
    #[inline]
    pub fn get(&self, key: u64) -> Option<V> {
        self.find(key).map(|pos| self.record(pos).value)
    }

    /// Stores `value` for `key`, returning the previous value if the key was
    /// already present.
    pub fn insert(&mut self, key: u64, value: V) -> Result<Option<V>, TableFullError> {
        let mut pos = bucket_of(key, self.record_count);
        let mut reusable = None;

        for _ in 0..self.record_count {
            match self.state(pos) {
                STATE_EMPTY => {
                    self.place(reusable.unwrap_or(pos), key, value);
                    return Ok(None);
                },
                STATE_TOMBSTONE => {
                    if reusable.is_none() {
                        reusable = Some(pos);
                    }
                },
                _ => {
                    let record = self.record_mut(pos);
                    if record.key == key {
                        return Ok(Some(std::mem::replace(&mut record.value, value)));
                    }
                },
            }
            pos = self.next(pos);
        }

        match reusable {
            Some(pos) => {
                self.place(pos, key, value);
                Ok(None)
            },
            None => Err(TableFullError::new(self.record_count)),
        }
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: u64) -> Option<V> {
        let pos = self.find(key)?;
        let value = self.record(pos).value;
        self.set_state(pos, STATE_TOMBSTONE);
        self.len -= 1;
        self.tombstones += 1;
        self.reclaim_tombstones(pos);
        Some(value)
    }

    /// Drops every entry and tombstone.
    pub fn clear(&mut self) {
        for block in self.blocks.iter_mut() {
            block.state = STATE_EMPTY;
        }
        self.len = 0;
        self.tombstones = 0;
    }

    /// Iterates `(key, value)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, V)> + '_ {
        (0..self.record_count)
            .filter(|&pos| self.state(pos) == STATE_OCCUPIED)
            .map(|pos| {
                let record = self.record(pos);
                (record.key, record.value)
            })
    }

    /// Verifies occupancy counters, key uniqueness and probe reachability.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut seen = FxHashSet::default();
        let mut occupied = 0usize;
        let mut tombstones = 0usize;

        for pos in 0..self.record_count {
            match self.state(pos) {
                STATE_OCCUPIED => {
                    occupied += 1;
                    let key = self.record(pos).key;
                    if !seen.insert(key) {
                        return Err(InvariantError::new(format!("key {key} stored twice")));
                    }
                    if self.find(key) != Some(pos) {
                        return Err(InvariantError::new(format!(
                            "key {key} at record {pos} is unreachable from its home position"
                        )));
                    }
                },
                STATE_TOMBSTONE => tombstones += 1,
                STATE_EMPTY => {},
                state => {
                    return Err(InvariantError::new(format!(
                        "record {pos} has invalid state {state}"
                    )));
                },
            }
        }

        if occupied != self.len {
            return Err(InvariantError::new(format!(
                "len is {} but {occupied} records are occupied",
                self.len
            )));
        }
        if tombstones != self.tombstones {
            return Err(InvariantError::new(format!(
                "tombstone count is {} but {tombstones} records are tombstoned",
                self.tombstones
            )));
        }
        Ok(())
    }

    /// Returns the record position holding `key`.
    fn find(&self, key: u64) -> Option<usize> {
        let mut pos = bucket_of(key, self.record_count);
        for _ in 0..self.record_count {
            match self.state(pos) {
                STATE_EMPTY => return None,
                STATE_OCCUPIED if self.record(pos).key == key => return Some(pos),
                _ => {},
            }
            pos = self.next(pos);
        }
        None
    }

    fn place(&mut self, pos: usize, key: u64, value: V) {
        if self.state(pos) == STATE_TOMBSTONE {
            self.tombstones -= 1;
        }
        *self.record_mut(pos) = Record { key, value };
        self.set_state(pos, STATE_OCCUPIED);
        self.len += 1;
    }

    /// Turns the tombstone run ending at `pos` back into empty records if the
    /// record after it is empty.
    fn reclaim_tombstones(&mut self, mut pos: usize) {
        if self.state(self.next(pos)) != STATE_EMPTY {
            return;
        }
        while self.state(pos) == STATE_TOMBSTONE {
            self.set_state(pos, STATE_EMPTY);
            self.tombstones -= 1;
            pos = self.prev(pos);
        }
    }

    #[inline]
    fn next(&self, pos: usize) -> usize {
        if pos + 1 >= self.record_count { 0 } else { pos + 1 }
    }

    #[inline]
    fn prev(&self, pos: usize) -> usize {
        if pos == 0 { self.record_count - 1 } else { pos - 1 }
    }

    #[inline]
    fn state(&self, pos: usize) -> u8 {
        self.blocks[pos / RECORDS_PER_BLOCK].record_state(pos % RECORDS_PER_BLOCK)
    }

    #[inline]
    fn set_state(&mut self, pos: usize, state: u8) {
        self.blocks[pos / RECORDS_PER_BLOCK].set_record_state(pos % RECORDS_PER_BLOCK, state);
    }

    #[inline]
    fn record(&self, pos: usize) -> &Record<V> {
        &self.blocks[pos / RECORDS_PER_BLOCK].records[pos % RECORDS_PER_BLOCK]
    }

    #[inline]
    fn record_mut(&mut self, pos: usize) -> &mut Record<V> {
        &mut self.blocks[pos / RECORDS_PER_BLOCK].records[pos % RECORDS_PER_BLOCK]
    }
}
