//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! byte usage.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads that found the requested header or body
    pub hits: u64,
    /// Reads where the key or the field was absent
    pub misses: u64,
    /// Number of entries evicted due to LRU policy
    pub evictions: u64,
    /// Writes refused because the item alone exceeds capacity
    pub rejections: u64,
    /// Bytes currently accounted for
    pub used_bytes: usize,
    /// Byte budget of the cache
    pub capacity: usize,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Record Rejection ==
    pub fn record_rejection(&mut self) {
        self.rejections += 1;
    }

    // == Update Gauges ==
    /// Updates the byte usage and entry count.
    pub fn set_usage(&mut self, used_bytes: usize, total_entries: usize) {
        self.used_bytes = used_bytes;
        self.total_entries = total_entries;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new(1024);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.evictions, 0);
        assert_eq!(stats.rejections, 0);
        assert_eq!(stats.used_bytes, 0);
        assert_eq!(stats.capacity, 1024);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new(1);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new(1);
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_record_eviction_and_rejection() {
        let mut stats = CacheStats::new(1);
        stats.record_eviction();
        stats.record_eviction();
        stats.record_rejection();
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.rejections, 1);
    }

    #[test]
    fn test_stats_serialize() {
        let mut stats = CacheStats::new(40);
        stats.set_usage(20, 2);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["used_bytes"], 20);
        assert_eq!(json["capacity"], 40);
        assert_eq!(json["total_entries"], 2);
    }
}
