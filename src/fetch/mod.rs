//! Fetch Module
//!
//! Conditional HTTP GET on top of the byte-bounded cache: validators from
//! earlier responses are replayed so unchanged files come from memory.

mod client;
mod digest;
mod fetcher;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::CacheStore;

pub use client::{HttpGet, HttpResponse, ReqwestClient};
pub use digest::md5_hex;
pub use fetcher::{FetchOutcome, FetchSource, FileFetcher};

/// Cache shared between fetch tasks. Every cache call needs the write lock
/// because reads update recency.
pub type SharedCache = Arc<RwLock<CacheStore>>;

// == Header Names ==
pub const ETAG: &str = "ETag";
pub const LAST_MODIFIED: &str = "Last-Modified";
pub const IF_NONE_MATCH: &str = "If-None-Match";
pub const IF_MODIFIED_SINCE: &str = "If-Modified-Since";

/// Wraps a store for sharing between tasks.
pub fn shared(store: CacheStore) -> SharedCache {
    Arc::new(RwLock::new(store))
}
