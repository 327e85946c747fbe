//! Chained `u64` key index with an embedded recency list.
//!
//! All records live in one pre-allocated pool and are addressed by position.
//! Three intrusive structures share that pool:
//!
//! - **hash chains**: singly linked through `chain_next`, one chain per bucket
//! - **free list**: unused records, also linked through `chain_next`
//! - **recency list**: occupied records, doubly linked newest → oldest
//!
//! ## Architecture
//!
//! ```text
//!   buckets: [Option<usize>; capacity]
//!   ┌────┬────┬────┬────┐
//!   │ 0  │ 1  │ 2  │ 3  │          records (pool)
//!   └─┬──┴────┴─┬──┴────┘          ┌───┬──────────────────────────────┐
//!     │         └──────────────────► 2 │ key=9  chain_next=None       │
//!     └─────────────────────────────► 0 │ key=4  chain_next=Some(3)    │
//!                                   │ 3 │ key=12 chain_next=None       │
//!   free ──► 1 ──► None             │ 1 │ (free)                       │
//!                                   └───┴──────────────────────────────┘
//!
//!   newest ─► [0:4] ◄──► [2:9] ◄──► [3:12] ◄── oldest
//! ```
//!
//! `insert` takes a record from the free list and links it as newest. Moving
//! an entry inside the recency list (`make_newest` / `make_oldest`) never
//! touches its chain; removing an entry unlinks it from both and returns the
//! record to the free list.
//!
//! ## Performance
//! - `get` / `insert` / `remove`: O(1) expected (chain length)
//! - `peek_*` / `pop_*` / `make_*`: O(1) plus one chain walk for the pops
//! - No allocation after construction
//!
//! `check_invariants()` walks every structure and is intended for tests.

use rustc_hash::FxHashSet;

use crate::ds::hash::bucket_of;
use crate::ds::slot_arena::SlotId;
use crate::error::{CacheError, InvariantError, TableFullError, try_vec};

#[derive(Debug, Clone, Copy)]
struct Record<V> {
    key: u64,
    value: V,
    chain_next: Option<usize>,
    newer: Option<usize>,
    older: Option<usize>,
}

/// Fixed-capacity chained map from `u64` keys to `Copy` values that also
/// tracks the relative recency of its entries.
#[derive(Debug)]
pub struct RecencyIndex<V = SlotId> {
    records: Box<[Record<V>]>,
    buckets: Box<[Option<usize>]>,
    free: Option<usize>,
    newest: Option<usize>,
    oldest: Option<usize>,
    len: usize,
}

impl<V> RecencyIndex<V>
where
    V: Copy + Default,
{
    /// Creates an index holding at most `capacity` entries, with every record
    /// on the free list.
    pub fn try_with_capacity(capacity: usize) -> Result<Self, CacheError> {
        let mut records = try_vec::<Record<V>>(capacity)?;
        records.extend((0..capacity).map(|i| Record {
            key: 0,
            value: V::default(),
            chain_next: (i + 1 < capacity).then_some(i + 1),
            newer: None,
            older: None,
        }));

        let bucket_count = capacity.max(1);
        let mut buckets = try_vec::<Option<usize>>(bucket_count)?;
        buckets.resize(bucket_count, None);

        Ok(Self {
            records: records.into_boxed_slice(),
            buckets: buckets.into_boxed_slice(),
            free: (capacity > 0).then_some(0),
            newest: None,
            oldest: None,
            len: 0,
        })
    }

    /// Maximum number of entries.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if the free list is exhausted.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.free.is_none()
    }

    /// Returns `true` if `key` is present. Does not affect recency.
    #[inline]
    pub fn contains(&self, key: u64) -> bool {
        self.find(key).is_some()
    }

    /// Looks up `key` without affecting recency.
    #[inline]
    pub fn get(&self, key: u64) -> Option<V> {
        self.find(key).map(|pos| self.records[pos].value)
    }

    /// Inserts `key` as the newest entry.
    ///
    /// If `key` is already present its value is overwritten in place and its
    /// recency position is left unchanged; the previous value is returned.
    pub fn insert(&mut self, key: u64, value: V) -> Result<Option<V>, TableFullError> {
        if let Some(pos) = self.find(key) {
            return Ok(Some(std::mem::replace(&mut self.records[pos].value, value)));
        }

        let pos = self.free.ok_or(TableFullError::new(self.capacity()))?;
        self.free = self.records[pos].chain_next;

        let bucket = self.bucket(key);
        let record = &mut self.records[pos];
        record.key = key;
        record.value = value;
        record.chain_next = self.buckets[bucket];
        self.buckets[bucket] = Some(pos);

        self.attach_newest(pos);
        self.len += 1;
        Ok(None)
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: u64) -> Option<V> {
        let pos = self.unlink_chain(key)?;
        self.detach(pos);
        self.release(pos);
        Some(self.records[pos].value)
    }

    /// Returns the most recently promoted or inserted entry.
    #[inline]
    pub fn peek_newest(&self) -> Option<(u64, V)> {
        self.newest.map(|pos| self.entry(pos))
    }

    /// Returns the least recently promoted or inserted entry.
    #[inline]
    pub fn peek_oldest(&self) -> Option<(u64, V)> {
        self.oldest.map(|pos| self.entry(pos))
    }

    /// Removes and returns the newest entry.
    pub fn pop_newest(&mut self) -> Option<(u64, V)> {
        let (key, value) = self.peek_newest()?;
        self.remove(key);
        Some((key, value))
    }

    /// Removes and returns the oldest entry.
    pub fn pop_oldest(&mut self) -> Option<(u64, V)> {
        let (key, value) = self.peek_oldest()?;
        self.remove(key);
        Some((key, value))
    }

    /// Moves `key` to the newest end. Returns `false` if absent.
    pub fn make_newest(&mut self, key: u64) -> bool {
        let Some(pos) = self.find(key) else {
            return false;
        };
        if self.newest != Some(pos) {
            self.detach(pos);
            self.attach_newest(pos);
        }
        true
    }

    /// Moves `key` to the oldest end. Returns `false` if absent.
    pub fn make_oldest(&mut self, key: u64) -> bool {
        let Some(pos) = self.find(key) else {
            return false;
        };
        if self.oldest != Some(pos) {
            self.detach(pos);
            self.attach_oldest(pos);
        }
        true
    }

    /// Iterates entries from newest to oldest.
    pub fn iter(&self) -> RecencyIter<'_, V> {
        RecencyIter {
            index: self,
            current: self.newest,
            remaining: self.len,
        }
    }

    /// Drops every entry and relinks all records onto the free list.
    pub fn clear(&mut self) {
        let capacity = self.capacity();
        for (i, record) in self.records.iter_mut().enumerate() {
            record.chain_next = (i + 1 < capacity).then_some(i + 1);
            record.newer = None;
            record.older = None;
        }
        self.buckets.fill(None);
        self.free = (capacity > 0).then_some(0);
        self.newest = None;
        self.oldest = None;
        self.len = 0;
    }

    /// Verifies that the chains, the free list and the recency list are
    /// consistent and together partition the record pool.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let capacity = self.capacity();

        // recency list, newest → oldest
        let mut listed = FxHashSet::default();
        let mut prev = None;
        let mut cursor = self.newest;
        while let Some(pos) = cursor {
            if pos >= capacity || !listed.insert(pos) {
                return Err(InvariantError::new(format!(
                    "recency list revisits or overruns record {pos}"
                )));
            }
            if self.records[pos].newer != prev {
                return Err(InvariantError::new(format!(
                    "record {pos} has a broken newer link"
                )));
            }
            prev = Some(pos);
            cursor = self.records[pos].older;
        }
        if prev != self.oldest {
            return Err(InvariantError::new("oldest does not match the list tail"));
        }
        if listed.len() != self.len {
            return Err(InvariantError::new(format!(
                "len is {} but the recency list holds {}",
                self.len,
                listed.len()
            )));
        }

        // hash chains hold exactly the listed records, each in its own bucket
        let mut chained = 0usize;
        for (bucket, head) in self.buckets.iter().enumerate() {
            let mut cursor = *head;
            while let Some(pos) = cursor {
                if !listed.contains(&pos) {
                    return Err(InvariantError::new(format!(
                        "chain {bucket} holds unlisted record {pos}"
                    )));
                }
                if self.bucket(self.records[pos].key) != bucket {
                    return Err(InvariantError::new(format!(
                        "record {pos} is chained in the wrong bucket"
                    )));
                }
                chained += 1;
                if chained > self.len {
                    return Err(InvariantError::new("hash chains hold too many records"));
                }
                cursor = self.records[pos].chain_next;
            }
        }
        if chained != self.len {
            return Err(InvariantError::new(format!(
                "{chained} records are chained but {} are listed",
                self.len
            )));
        }

        // free list covers the rest
        let mut free = 0usize;
        let mut cursor = self.free;
        while let Some(pos) = cursor {
            if listed.contains(&pos) {
                return Err(InvariantError::new(format!(
                    "record {pos} is both free and listed"
                )));
            }
            free += 1;
            if free > capacity {
                return Err(InvariantError::new("free list cycles"));
            }
            cursor = self.records[pos].chain_next;
        }
        if free + self.len != capacity {
            return Err(InvariantError::new(format!(
                "free ({free}) + listed ({}) != capacity ({capacity})",
                self.len
            )));
        }
        Ok(())
    }

    #[inline]
    fn bucket(&self, key: u64) -> usize {
        bucket_of(key, self.buckets.len())
    }

    #[inline]
    fn entry(&self, pos: usize) -> (u64, V) {
        let record = &self.records[pos];
        (record.key, record.value)
    }

    fn find(&self, key: u64) -> Option<usize> {
        let mut cursor = self.buckets[self.bucket(key)];
        while let Some(pos) = cursor {
            if self.records[pos].key == key {
                return Some(pos);
            }
            cursor = self.records[pos].chain_next;
        }
        None
    }

    /// Removes `key`'s record from its chain, returning its position.
    fn unlink_chain(&mut self, key: u64) -> Option<usize> {
        let bucket = self.bucket(key);
        let mut prev: Option<usize> = None;
        let mut cursor = self.buckets[bucket];
        while let Some(pos) = cursor {
            let next = self.records[pos].chain_next;
            if self.records[pos].key == key {
                match prev {
                    Some(p) => self.records[p].chain_next = next,
                    None => self.buckets[bucket] = next,
                }
                return Some(pos);
            }
            prev = cursor;
            cursor = next;
        }
        None
    }

    fn release(&mut self, pos: usize) {
        self.records[pos].chain_next = self.free;
        self.free = Some(pos);
        self.len -= 1;
    }

    fn detach(&mut self, pos: usize) {
        let Record { newer, older, .. } = self.records[pos];
        match newer {
            Some(n) => self.records[n].older = older,
            None => self.newest = older,
        }
        match older {
            Some(o) => self.records[o].newer = newer,
            None => self.oldest = newer,
        }
        self.records[pos].newer = None;
        self.records[pos].older = None;
    }

    fn attach_newest(&mut self, pos: usize) {
        self.records[pos].newer = None;
        self.records[pos].older = self.newest;
        match self.newest {
            Some(n) => self.records[n].newer = Some(pos),
            None => self.oldest = Some(pos),
        }
        self.newest = Some(pos);
    }

    fn attach_oldest(&mut self, pos: usize) {
        self.records[pos].older = None;
        self.records[pos].newer = self.oldest;
        match self.oldest {
            Some(o) => self.records[o].older = Some(pos),
            None => self.newest = Some(pos),
        }
        self.oldest = Some(pos);
    }
}

/// Iterator over `(key, value)` pairs from newest to oldest.
pub struct RecencyIter<'a, V> {
    index: &'a RecencyIndex<V>,
    current: Option<usize>,
    remaining: usize,
}

impl<V> Iterator for RecencyIter<'_, V>
where
    V: Copy,
{
    type Item = (u64, V);

    fn next(&mut self) -> Option<Self::Item> {
        let pos = self.current?;
        let record = &self.index.records[pos];
        self.current = record.older;
        self.remaining -= 1;
        Some((record.key, record.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for RecencyIter<'_, V> where V: Copy {}
