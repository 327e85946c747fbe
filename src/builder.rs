//! Unified cache builder for all replacement policies.
//!
//! Picks a policy at runtime and hides the concrete cache type behind
//! [`Cache`], which implements [`PageCache`] by dispatching to the policy.
//!
//! ## Example
//!
//! ```rust
//! use pagekit::builder::{CacheBuilder, CachePolicy};
//! use pagekit::traits::PageCache;
//!
//! let mut cache = CacheBuilder::new(128).slot_size(512).build(CachePolicy::Lru).unwrap();
//! assert!(cache.fetch(1).is_miss());
//! assert!(cache.fetch(1).is_hit());
//! assert_eq!(cache.slot_size(), 512);
//!
//! let policy: CachePolicy = "gclock:3".parse().unwrap();
//! assert_eq!(policy, CachePolicy::GClock { max_references: 3 });
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{CacheError, ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::CoreMetricsSnapshot;
use crate::policy::clock::ClockCache;
use crate::policy::fifo::FifoCache;
use crate::policy::gclock::{DEFAULT_MAX_REFERENCES, GClockCache};
use crate::policy::lru::LruCache;
use crate::policy::random::RandomCache;
use crate::policy::slru::SlruCache;
use crate::traits::{Fetch, PageCache};

/// Number of slots used when none is given.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Slot size in bytes used when none is given.
pub const DEFAULT_SLOT_SIZE: usize = 4096;

/// Available page replacement policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// First in, first out.
    Fifo,
    /// Uniform random victim; `None` seeds from the capacity.
    Random { seed: Option<u64> },
    /// Second-chance clock.
    Clock,
    /// Clock with saturating reference counters.
    GClock { max_references: u8 },
    /// Least recently used.
    Lru,
    /// Segmented LRU with protected and probationary segments.
    Slru,
}

impl CachePolicy {
    /// One of each policy with default parameters, in reporting order.
    pub const ALL: [CachePolicy; 6] = [
        CachePolicy::Fifo,
        CachePolicy::Random { seed: None },
        CachePolicy::Clock,
        CachePolicy::GClock {
            max_references: DEFAULT_MAX_REFERENCES,
        },
        CachePolicy::Lru,
        CachePolicy::Slru,
    ];

    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            CachePolicy::Fifo => "fifo",
            CachePolicy::Random { .. } => "random",
            CachePolicy::Clock => "clock",
            CachePolicy::GClock { .. } => "gclock",
            CachePolicy::Lru => "lru",
            CachePolicy::Slru => "slru",
        }
    }

    /// Smallest capacity the policy accepts.
    pub fn min_capacity(&self) -> usize {
        match self {
            CachePolicy::Lru | CachePolicy::Slru => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CachePolicy::Random { seed: Some(seed) } => write!(f, "random:{seed}"),
            CachePolicy::GClock { max_references } if *max_references != DEFAULT_MAX_REFERENCES => {
                write!(f, "gclock:{max_references}")
            },
            other => f.write_str(other.name()),
        }
    }
}

/// Parses `name` or `name:param`, case-insensitively.
///
/// `random:<seed>` sets the generator seed and `gclock:<max>` the reference
/// cap; the other policies take no parameter.
impl FromStr for CachePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let (name, param) = match lowered.split_once(':') {
            Some((name, param)) => (name, Some(param)),
            None => (lowered.as_str(), None),
        };

        let bad_param =
            |param: &str| ConfigError::new(format!("invalid parameter {param:?} for policy {name}"));

        let policy = match (name, param) {
            ("fifo", None) => CachePolicy::Fifo,
            ("clock", None) => CachePolicy::Clock,
            ("lru", None) => CachePolicy::Lru,
            ("slru", None) => CachePolicy::Slru,
            ("random", None) => CachePolicy::Random { seed: None },
            ("random", Some(p)) => CachePolicy::Random {
                seed: Some(p.parse().map_err(|_| bad_param(p))?),
            },
            ("gclock", None) => CachePolicy::GClock {
                max_references: DEFAULT_MAX_REFERENCES,
            },
            ("gclock", Some(p)) => CachePolicy::GClock {
                max_references: p.parse().map_err(|_| bad_param(p))?,
            },
            ("fifo" | "clock" | "lru" | "slru", Some(p)) => return Err(bad_param(p)),
            _ => {
                return Err(ConfigError::new(format!(
                    "unknown policy {s:?} (expected fifo, random, clock, gclock, lru or slru)"
                )));
            },
        };
        Ok(policy)
    }
}

/// Page cache whose policy is chosen at runtime.
#[derive(Debug)]
pub struct Cache {
    policy: CachePolicy,
    inner: CacheInner,
}

#[derive(Debug)]
enum CacheInner {
    Fifo(FifoCache),
    Random(RandomCache),
    Clock(ClockCache),
    GClock(GClockCache),
    Lru(LruCache),
    Slru(SlruCache),
}

macro_rules! dispatch {
    ($inner:expr, $cache:ident => $body:expr) => {
        match $inner {
            CacheInner::Fifo($cache) => $body,
            CacheInner::Random($cache) => $body,
            CacheInner::Clock($cache) => $body,
            CacheInner::GClock($cache) => $body,
            CacheInner::Lru($cache) => $body,
            CacheInner::Slru($cache) => $body,
        }
    };
}

impl Cache {
    /// Policy this cache was built with.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Core counters of the underlying policy.
    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> CoreMetricsSnapshot {
        match &self.inner {
            CacheInner::Fifo(c) => c.metrics_snapshot(),
            CacheInner::Random(c) => c.metrics_snapshot(),
            CacheInner::Clock(c) => c.metrics_snapshot().into(),
            CacheInner::GClock(c) => c.metrics_snapshot().into(),
            CacheInner::Lru(c) => c.metrics_snapshot(),
            CacheInner::Slru(c) => c.metrics_snapshot().into(),
        }
    }
}

impl PageCache for Cache {
    fn fetch(&mut self, key: u64) -> Fetch<'_> {
        dispatch!(&mut self.inner, c => c.fetch(key))
    }

    fn contains(&self, key: u64) -> bool {
        dispatch!(&self.inner, c => c.contains(key))
    }

    fn len(&self) -> usize {
        dispatch!(&self.inner, c => c.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(&self.inner, c => c.capacity())
    }

    fn slot_size(&self) -> usize {
        dispatch!(&self.inner, c => c.slot_size())
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        dispatch!(&self.inner, c => c.check_invariants())
    }
}

/// Builder for creating cache instances.
#[derive(Debug, Clone, Copy)]
pub struct CacheBuilder {
    capacity: usize,
    slot_size: usize,
}

impl Default for CacheBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CacheBuilder {
    /// Create a new cache builder with the specified number of slots and
    /// [`DEFAULT_SLOT_SIZE`]-byte slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slot_size: DEFAULT_SLOT_SIZE,
        }
    }

    /// Sets the size of each slot in bytes.
    pub fn slot_size(mut self, bytes: usize) -> Self {
        self.slot_size = bytes;
        self
    }

    /// Build a cache with the specified policy.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pagekit::builder::{CacheBuilder, CachePolicy};
    ///
    /// let builder = CacheBuilder::new(64).slot_size(128);
    /// for policy in CachePolicy::ALL {
    ///     assert!(builder.build(policy).is_ok());
    /// }
    /// assert!(CacheBuilder::new(1).build(CachePolicy::Slru).is_err());
    /// ```
    pub fn build(self, policy: CachePolicy) -> Result<Cache, CacheError> {
        let Self {
            capacity,
            slot_size,
        } = self;
        let inner = match policy {
            CachePolicy::Fifo => CacheInner::Fifo(FifoCache::try_new(slot_size, capacity)?),
            CachePolicy::Random { seed: None } => {
                CacheInner::Random(RandomCache::try_new(slot_size, capacity)?)
            },
            CachePolicy::Random { seed: Some(seed) } => {
                CacheInner::Random(RandomCache::try_with_seed(slot_size, capacity, seed)?)
            },
            CachePolicy::Clock => CacheInner::Clock(ClockCache::try_new(slot_size, capacity)?),
            CachePolicy::GClock { max_references } => CacheInner::GClock(
                GClockCache::try_with_max_references(slot_size, capacity, max_references)?,
            ),
            CachePolicy::Lru => CacheInner::Lru(LruCache::try_new(slot_size, capacity)?),
            CachePolicy::Slru => CacheInner::Slru(SlruCache::try_new(slot_size, capacity)?),
        };

        Ok(Cache { policy, inner })
    }
}
