pub mod hash;
pub mod open_index;
pub mod recency_index;
pub mod slot_arena;

pub use hash::{bucket_of, hash64shift};
pub use open_index::OpenIndex;
pub use recency_index::{RecencyIndex, RecencyIter};
pub use slot_arena::{SlotArena, SlotId};
