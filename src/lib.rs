//! pagekit: fixed-capacity page caches over a pre-allocated slot arena.
//!
//! Every cache maps a `u64` key to one fixed-size byte slot. A
//! [`fetch`](traits::PageCache::fetch) either finds the key (a hit, the slot
//! still holds what the caller wrote) or assigns it a slot (a miss, the
//! caller fills it). Capacity is fixed at construction and no allocation
//! happens afterwards.
//!
//! Policies: FIFO, Random, Clock, GClock, LRU and SLRU, in [`policy`]. The
//! index structures they share live in [`ds`]. [`builder`] picks a policy at
//! runtime and [`trace`] replays key traces against any of them.

pub mod builder;
#[cfg(feature = "concurrency")]
pub mod concurrent;
pub mod ds;
pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod policy;
pub mod prelude;
pub mod trace;
pub mod traits;
