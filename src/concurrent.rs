//! Lock wrapper for sharing one page cache between threads.
//!
//! Caches are single-owner. [`SharedCache`] puts one behind a
//! `parking_lot::RwLock`: `fetch_with` takes the write lock for the whole
//! closure, lookups that do no bookkeeping take the read lock. The slot
//! borrow lives only inside the closure, so it can never outlive the lock.
//!
//! ```text
//!   thread A ──┐
//!   thread B ──┼──► RwLock<C: PageCache> ──► fetch / contains / len
//!   thread C ──┘
//! ```
//!
//! ## Example Usage
//!
//! ```
//! use std::sync::Arc;
//! use pagekit::concurrent::SharedCache;
//! use pagekit::policy::lru::LruCache;
//!
//! let cache = Arc::new(SharedCache::new(LruCache::try_new(8, 4).unwrap()));
//! let worker = {
//!     let cache = Arc::clone(&cache);
//!     std::thread::spawn(move || {
//!         cache.fetch_with(1, |page| page.data_mut().fill(1));
//!     })
//! };
//! worker.join().unwrap();
//!
//! let first = cache.fetch_with(1, |page| page.data()[0]);
//! assert_eq!(first, 1);
//! ```

use std::fmt;

use parking_lot::RwLock;

use crate::error::InvariantError;
use crate::traits::{Fetch, PageCache};

/// A page cache behind a read-write lock.
pub struct SharedCache<C> {
    inner: RwLock<C>,
}

impl<C: PageCache> SharedCache<C> {
    pub fn new(cache: C) -> Self {
        Self {
            inner: RwLock::new(cache),
        }
    }

    /// Fetches `key` and runs `f` on the slot while holding the write lock.
    pub fn fetch_with<R>(&self, key: u64, f: impl FnOnce(&mut Fetch<'_>) -> R) -> R {
        let mut cache = self.inner.write();
        let mut page = cache.fetch(key);
        f(&mut page)
    }

    pub fn contains(&self, key: u64) -> bool {
        self.inner.read().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.read().capacity()
    }

    /// Runs `f` with shared access to the wrapped cache.
    pub fn with_read<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.read().check_invariants()
    }

    /// Unwraps the cache.
    pub fn into_inner(self) -> C {
        self.inner.into_inner()
    }
}

impl<C: fmt::Debug> fmt::Debug for SharedCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Some(cache) => f.debug_struct("SharedCache").field("inner", &*cache).finish(),
            None => f.debug_struct("SharedCache").field("inner", &"<locked>").finish(),
        }
    }
}
