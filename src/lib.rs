//! Image Cache - fetch files over HTTP and keep a local cache of them
//!
//! Response validators and file bodies live in a byte-bounded LRU cache;
//! repeat fetches send conditional requests and reuse the cached body on 304.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;

pub use cache::CacheStore;
pub use config::Config;
pub use fetch::{FileFetcher, ReqwestClient, SharedCache};
