//! Cache Module
//!
//! Provides the fixed-slot, concurrently accessed response cache with
//! approximate LRU eviction.

mod entry;
mod key;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use key::{normalize_key, HTTP_SCHEME};
pub use lru::{select_victim, RecencyClock, SlotView};
pub use stats::{CacheStats, StatsRecorder};
pub use store::{Admission, CacheStore};
