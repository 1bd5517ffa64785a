//! Configuration Module
//!
//! Handles loading and managing fetcher configuration from environment variables.

use std::env;

use crate::cache::DEFAULT_CAPACITY;

/// Host the default image paths are served from
pub const DEFAULT_HOST: &str = "static.rbxcdn.com";

/// Paths fetched when none are configured
pub const DEFAULT_URLS: [&str; 3] = [
    "/images/landing/Rollercoaster/whatsroblox_12072017.jpg",
    "/images/landing/Rollercoaster/gameimage3_12072017.jpg",
    "/images/landing/Rollercoaster/devices_people_12072017.png",
];

/// Fetcher configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Byte budget of the cache
    pub capacity: usize,
    /// Origin host, `hostname[:port]`
    pub host: String,
    /// URL scheme used to reach the host
    pub scheme: String,
    /// Paths to fetch, each starting with `/`
    pub urls: Vec<String>,
    /// Times each path is fetched
    pub rounds: usize,
    /// Debug-level logging and a cache dump at the end
    pub verbose: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Cache size in bytes (default: 204800)
    /// - `FETCH_HOST` - Origin host (default: static.rbxcdn.com)
    /// - `FETCH_SCHEME` - `https` or `http` (default: https)
    /// - `FETCH_URLS` - Comma separated paths (default: three sample images)
    /// - `FETCH_ROUNDS` - Fetches per path (default: 2)
    /// - `VERBOSE` - `1`/`true` for debug output (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.capacity),
            host: env::var("FETCH_HOST").unwrap_or(defaults.host),
            scheme: env::var("FETCH_SCHEME").unwrap_or(defaults.scheme),
            urls: env::var("FETCH_URLS")
                .ok()
                .map(|v| split_urls(&v))
                .filter(|urls| !urls.is_empty())
                .unwrap_or(defaults.urls),
            rounds: parse_var("FETCH_ROUNDS").unwrap_or(defaults.rounds),
            verbose: env::var("VERBOSE")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.verbose),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            host: DEFAULT_HOST.to_string(),
            scheme: "https".to_string(),
            urls: DEFAULT_URLS.iter().map(|u| u.to_string()).collect(),
            rounds: 2,
            verbose: false,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn split_urls(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
