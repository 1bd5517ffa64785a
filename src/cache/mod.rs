//! Cache Module
//!
//! Provides a byte-bounded in-memory cache of HTTP validators and file bodies
//! with LRU eviction.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Public Constants ==
/// Default byte budget of the cache
pub const DEFAULT_CAPACITY: usize = 200 * 1024; // 200 KiB
