pub use crate::builder::{Cache, CacheBuilder, CachePolicy};
pub use crate::ds::{OpenIndex, RecencyIndex, SlotArena, SlotId};
pub use crate::error::{CacheError, ConfigError, InvariantError};
pub use crate::policy::clock::ClockCache;
pub use crate::policy::fifo::FifoCache;
pub use crate::policy::gclock::GClockCache;
pub use crate::policy::lru::LruCache;
pub use crate::policy::random::RandomCache;
pub use crate::policy::slru::SlruCache;
pub use crate::traits::{Fetch, PageCache};

#[cfg(feature = "concurrency")]
pub use crate::concurrent::SharedCache;
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::CoreMetricsSnapshot;
