//! Error types for the cache and the fetcher
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Errors reported by the byte-bounded cache.
///
/// None of these leave the store in a modified state: a rejected write is a
/// no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Construction with a zero byte budget
    #[error("Invalid capacity: cache capacity must be at least 1 byte")]
    InvalidCapacity,

    /// A single header value or body larger than the whole cache
    #[error("Oversized item: {size} bytes for '{key}' exceeds cache capacity of {capacity} bytes")]
    OversizedItem {
        key: String,
        size: usize,
        capacity: usize,
    },
}

// == Fetch Error Enum ==
/// Errors surfaced by the conditional-GET fetcher.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network or protocol failure in the HTTP client
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Origin answered with something other than 200 or 304
    #[error("Unhandled status code: {0}")]
    UnexpectedStatus(u16),

    /// Cache refused an operation the fetch cannot continue without
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Failure from an `HttpGet` implementation that is not reqwest-backed
    #[error("{0}")]
    Other(String),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
