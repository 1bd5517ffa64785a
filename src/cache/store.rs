//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking and a byte
//! budget.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::error::{CacheError, Result};

/// Header values longer than this are elided in the `Display` dump.
const DISPLAY_VALUE_LIMIT: usize = 70;

/// Which part of an entry a write targets.
#[derive(Debug, Clone, Copy)]
enum Field<'a> {
    Header(&'a str),
    Body,
}

// == Cache Store ==
/// Byte-bounded cache of response headers and file bodies with LRU eviction.
///
/// All operations take `&mut self`: reads promote recency. Wrap it in a lock
/// to share it (see [`crate::fetch::SharedCache`]).
#[derive(Debug)]
pub struct CacheStore {
    /// Key to entry storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker, holds exactly the keys of `entries`
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum total bytes across all entries
    capacity: usize,
    /// Sum of the sizes of all entries
    used: usize,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store holding at most `capacity` bytes.
    ///
    /// A zero capacity is rejected with [`CacheError::InvalidCapacity`].
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity);
        }

        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(capacity),
            capacity,
            used: 0,
        })
    }

    // == Set Header ==
    /// Stores `value` under header `name` for `key`, creating the entry if
    /// needed.
    ///
    /// Least recently used entries are evicted to make room for the growth
    /// of the entry only; replacing a value with one of equal or smaller
    /// length never evicts. A value longer than the whole capacity is
    /// rejected and the store is left untouched.
    pub fn set_header(&mut self, key: &str, name: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        self.prepare_write(key, Field::Header(name), value.len())?;

        let new_len = value.len();
        let entry = self.entries.entry(key.to_string()).or_default();
        let old_len = entry.set_header(name, value);
        self.commit_write(key, old_len, new_len);

        debug!(key, header = name, size = new_len, used = self.used, "Cached header");
        Ok(())
    }

    // == Set File ==
    /// Stores the file body for `key`. Same rules as [`Self::set_header`].
    pub fn set_file(&mut self, key: &str, body: impl Into<Bytes>) -> Result<()> {
        let body = body.into();
        self.prepare_write(key, Field::Body, body.len())?;

        let new_len = body.len();
        let entry = self.entries.entry(key.to_string()).or_default();
        let old_len = entry.set_body(body);
        self.commit_write(key, old_len, new_len);

        debug!(key, size = new_len, used = self.used, "Cached file");
        Ok(())
    }

    // == Get Header ==
    /// Returns header `name` of `key`, if cached.
    ///
    /// A present key becomes the most recently used one, even when the
    /// header itself is missing.
    pub fn get_header(&mut self, key: &str, name: &str) -> Option<String> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return None;
        };

        let value = entry.header(name).map(str::to_string);
        self.lru.touch(key);
        self.record_lookup(value.is_some());
        value
    }

    // == Get File ==
    /// Returns the cached body of `key`, if any. Promotes a present key.
    pub fn get_file(&mut self, key: &str) -> Option<Bytes> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return None;
        };

        let body = entry.body().cloned();
        self.lru.touch(key);
        self.record_lookup(body.is_some());
        body
    }

    // == Remove Header ==
    /// Drops header `name` of `key`, returning its value. Recency is left
    /// alone.
    pub fn remove_header(&mut self, key: &str, name: &str) -> Option<String> {
        let value = self.entries.get_mut(key)?.remove_header(name)?;
        self.used = self.used.saturating_sub(value.len());
        debug!(key, header = name, used = self.used, "Removed header");
        Some(value)
    }

    // == Used Bytes ==
    /// Returns the number of bytes held by all entries.
    pub fn used_bytes(&self) -> usize {
        self.used
    }

    // == Capacity ==
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Contains ==
    /// Checks for a key without touching its recency.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Clear ==
    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.used = 0;
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_usage(self.used, self.entries.len());
        stats
    }

    // == Write Path ==
    /// Rejects items that can never fit, then evicts until the growth of
    /// `key` fits.
    fn prepare_write(&mut self, key: &str, field: Field<'_>, new_len: usize) -> Result<()> {
        if new_len > self.capacity {
            self.stats.record_rejection();
            warn!(
                key,
                size = new_len,
                capacity = self.capacity,
                "Item can never fit in cache, write dropped"
            );
            return Err(CacheError::OversizedItem {
                key: key.to_string(),
                size: new_len,
                capacity: self.capacity,
            });
        }

        self.evict_for(key, field, new_len);
        Ok(())
    }

    fn commit_write(&mut self, key: &str, old_len: usize, new_len: usize) {
        self.used = self.used.saturating_sub(old_len) + new_len;
        self.lru.touch(key);
    }

    fn stored_len(&self, key: &str, field: Field<'_>) -> usize {
        self.entries.get(key).map_or(0, |entry| match field {
            Field::Header(name) => entry.header_len(name),
            Field::Body => entry.body_len(),
        })
    }

    // == Eviction ==
    /// Evicts least recently used entries while the growth of `field` under
    /// `key` would reach the capacity. Stops early once nothing is left.
    ///
    /// The growth is recomputed on every pass: if `key` itself is the victim,
    /// the write rebuilds it from scratch and needs the full `new_len`.
    fn evict_for(&mut self, key: &str, field: Field<'_>, new_len: usize) {
        loop {
            let incoming = new_len.saturating_sub(self.stored_len(key, field));
            if incoming == 0 || self.used + incoming < self.capacity {
                break;
            }
            let Some(victim) = self.lru.evict_oldest() else {
                break;
            };
            let recovered = self.entries.remove(&victim).map_or(0, |e| e.size());

            self.used = match self.used.checked_sub(recovered) {
                Some(used) => used,
                None => {
                    warn!(
                        used = self.used,
                        recovered, "Cache accounting drift, clamping used bytes to zero"
                    );
                    0
                }
            };
            self.stats.record_eviction();

            debug!(
                key = %victim,
                recovered,
                used = self.used,
                "Evicted least recently used entry"
            );
        }
    }

    fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
    }

    /// Checks the bookkeeping invariants, describing the first violation.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> std::result::Result<(), String> {
        let total: usize = self.entries.values().map(CacheEntry::recomputed_size).sum();
        if total != self.used {
            return Err(format!("used {} != recomputed {}", self.used, total));
        }
        if let Some((key, entry)) = self
            .entries
            .iter()
            .find(|(_, e)| e.size() != e.recomputed_size())
        {
            return Err(format!("entry '{}' size drifted ({})", key, entry.size()));
        }
        if self.used > self.capacity {
            return Err(format!("used {} > capacity {}", self.used, self.capacity));
        }
        if self.lru.len() != self.entries.len()
            || self.lru.iter().any(|k| !self.entries.contains_key(k))
        {
            return Err("recency order and entries disagree".to_string());
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn recency(&self) -> Vec<String> {
        self.lru.iter().map(str::to_string).collect()
    }
}

// == Display ==
impl fmt::Display for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.entries.len() == 1 { "" } else { "s" };
        writeln!(f, "{} cache item{}:", self.entries.len(), plural)?;

        for key in self.lru.iter() {
            let Some(entry) = self.entries.get(key) else {
                continue;
            };
            writeln!(f, "  {}", key)?;

            let mut names: Vec<&String> = entry.headers().keys().collect();
            names.sort();
            for name in names {
                let value = entry.header(name).unwrap_or_default();
                if value.len() <= DISPLAY_VALUE_LIMIT {
                    writeln!(f, "    {}: {}", name, value)?;
                } else {
                    writeln!(f, "    {}: ...", name)?;
                }
            }
            if let Some(body) = entry.body() {
                writeln!(f, "    file: {} bytes", body.len())?;
            }
        }

        write!(
            f,
            "capacity: {} bytes, used: {} bytes, unused: {} bytes",
            self.capacity,
            self.used,
            self.capacity - self.used
        )
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const VALUE: &str = "abcdefghij";
    const FILE: &[u8] = b"0123456789";

    fn store(capacity: usize) -> CacheStore {
        CacheStore::new(capacity).unwrap()
    }

    #[test]
    fn test_store_new() {
        let store = store(40);
        assert_eq!(store.used_bytes(), 0);
        assert_eq!(store.capacity(), 40);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_zero_capacity_rejected() {
        assert!(matches!(
            CacheStore::new(0),
            Err(CacheError::InvalidCapacity)
        ));
    }

    #[test]
    fn test_reference_scenario() {
        let mut store = store(40);

        store.set_header("url1", "header1", VALUE).unwrap();
        assert_eq!(store.used_bytes(), 10);
        assert_eq!(store.get_header("url1", "header1").as_deref(), Some(VALUE));

        // Same header again uses no more space
        store.set_header("url1", "header1", VALUE).unwrap();
        assert_eq!(store.used_bytes(), 10);

        store.set_file("url1", FILE).unwrap();
        assert_eq!(store.used_bytes(), 20);
        assert_eq!(store.get_file("url1").as_deref(), Some(FILE));

        store.set_file("url1", FILE).unwrap();
        assert_eq!(store.used_bytes(), 20);

        store.set_header("url2", "header1", VALUE).unwrap();
        assert_eq!(store.used_bytes(), 30);

        // 30 + 10 reaches capacity, url1 is the LRU entry
        store.set_header("url3", "header1", VALUE).unwrap();
        assert_eq!(store.used_bytes(), 20);
        assert!(!store.contains_key("url1"));
        assert!(store.contains_key("url2"));
        assert!(store.contains_key("url3"));
        assert_eq!(store.stats().evictions, 1);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_same_length_different_value_is_free() {
        let mut store = store(40);

        store.set_header("k", "h", "aaaa").unwrap();
        store.set_header("k", "h", "bbbb").unwrap();

        assert_eq!(store.used_bytes(), 4);
        assert_eq!(store.get_header("k", "h").as_deref(), Some("bbbb"));
    }

    #[test]
    fn test_shrinking_write_does_not_evict() {
        let mut store = store(30);

        store.set_header("a", "h", "x".repeat(10)).unwrap();
        store.set_header("b", "h", "x".repeat(15)).unwrap();
        store.set_header("b", "h", "x".repeat(5)).unwrap();

        assert_eq!(store.used_bytes(), 15);
        assert!(store.contains_key("a"));
        assert_eq!(store.stats().evictions, 0);
    }

    #[test]
    fn test_growth_only_counts_delta() {
        let mut store = store(30);

        store.set_header("a", "h", "x".repeat(10)).unwrap();
        store.set_header("b", "h", "x".repeat(10)).unwrap();
        // Growing b by 5 bytes: 20 + 5 < 30, nothing evicted
        store.set_header("b", "h", "x".repeat(15)).unwrap();

        assert_eq!(store.used_bytes(), 25);
        assert!(store.contains_key("a"));
    }

    #[test]
    fn test_oversized_header_rejected() {
        let mut store = store(10);
        store.set_header("a", "h", "abc").unwrap();

        let err = store.set_header("b", "h", "x".repeat(11)).unwrap_err();

        assert!(matches!(err, CacheError::OversizedItem { size: 11, capacity: 10, .. }));
        assert_eq!(store.used_bytes(), 3);
        assert!(!store.contains_key("b"));
        assert_eq!(store.recency(), vec!["a".to_string()]);
        assert_eq!(store.stats().rejections, 1);
    }

    #[test]
    fn test_oversized_file_leaves_existing_body() {
        let mut store = store(10);
        store.set_file("a", FILE).unwrap();

        assert!(store.set_file("a", vec![0u8; 11]).is_err());

        assert_eq!(store.get_file("a").as_deref(), Some(FILE));
        assert_eq!(store.used_bytes(), 10);
    }

    #[test]
    fn test_item_equal_to_capacity_fits_when_alone() {
        let mut store = store(10);
        store.set_header("a", "h", "abc").unwrap();

        store.set_file("b", FILE).unwrap();

        assert_eq!(store.used_bytes(), 10);
        assert!(!store.contains_key("a"));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_written_key_evicted_when_least_recent() {
        let mut store = store(30);
        store.set_header("a", "h", "x".repeat(10)).unwrap();
        store.set_header("b", "h", "x".repeat(10)).unwrap();

        // a is the LRU entry: it goes, then comes back holding only its body
        store.set_file("a", FILE).unwrap();

        assert!(store.contains_key("b"));
        assert_eq!(store.get_header("a", "h"), None);
        assert_eq!(store.get_file("a").as_deref(), Some(FILE));
        assert_eq!(store.used_bytes(), 20);
        assert_eq!(store.stats().evictions, 1);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_evicted_overwrite_needs_full_length() {
        let mut store = store(30);
        store.set_header("a", "h", "x".repeat(10)).unwrap();
        store.set_header("b", "h", "x".repeat(15)).unwrap();

        // Growth of 6 evicts a itself, after which 16 bytes no longer fit
        // beside b
        store.set_header("a", "h", "y".repeat(16)).unwrap();

        assert!(!store.contains_key("b"));
        assert_eq!(store.get_header("a", "h"), Some("y".repeat(16)));
        assert_eq!(store.used_bytes(), 16);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_header() {
        let mut store = store(40);
        store.set_header("a", "ETag", "\"v1\"").unwrap();
        store.set_file("a", FILE).unwrap();

        assert_eq!(store.remove_header("a", "ETag").as_deref(), Some("\"v1\""));
        assert_eq!(store.remove_header("a", "ETag"), None);
        assert_eq!(store.remove_header("nope", "ETag"), None);

        assert_eq!(store.used_bytes(), 10);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_entry_outgrowing_capacity_is_replaced() {
        let mut store = store(20);
        store.set_header("a", "h", "x".repeat(15)).unwrap();

        // 15 + 10 can't fit even alone, so the old entry goes too
        store.set_file("a", FILE).unwrap();

        assert_eq!(store.used_bytes(), 10);
        assert_eq!(store.get_header("a", "h"), None);
        assert_eq!(store.get_file("a").as_deref(), Some(FILE));
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_get_promotes_recency() {
        let mut store = store(30);
        store.set_header("a", "h", "x".repeat(10)).unwrap();
        store.set_header("b", "h", "x".repeat(10)).unwrap();

        // Touch a, so b becomes the eviction candidate
        store.get_header("a", "h");
        store.set_header("c", "h", "x".repeat(10)).unwrap();

        assert!(store.contains_key("a"));
        assert!(!store.contains_key("b"));
    }

    #[test]
    fn test_get_missing_field_still_promotes() {
        let mut store = store(40);
        store.set_header("a", "h", "1").unwrap();
        store.set_header("b", "h", "2").unwrap();

        assert_eq!(store.get_file("a"), None);

        assert_eq!(store.recency(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_get_missing_key_does_not_track() {
        let mut store = store(40);

        assert_eq!(store.get_header("nope", "ETag"), None);
        assert_eq!(store.get_file("nope"), None);

        assert!(store.recency().is_empty());
        assert_eq!(store.stats().misses, 2);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_stats_hits_and_misses() {
        let mut store = store(40);
        store.set_header("a", "h", "1").unwrap();

        store.get_header("a", "h");
        store.get_header("a", "other");
        store.get_file("b");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.used_bytes, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_clear() {
        let mut store = store(40);
        store.set_header("a", "h", VALUE).unwrap();
        store.set_file("a", FILE).unwrap();

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.used_bytes(), 0);
        store.check_invariants().unwrap();
    }

    #[test]
    fn test_display_dump() {
        let mut store = store(200);
        store.set_header("url1", "ETag", "\"abc\"").unwrap();
        store.set_header("url1", "Long", "x".repeat(71)).unwrap();
        store.set_file("url1", FILE).unwrap();

        let dump = store.to_string();

        assert!(dump.starts_with("1 cache item:"));
        assert!(dump.contains("ETag: \"abc\""));
        assert!(dump.contains("Long: ..."));
        assert!(dump.contains("file: 10 bytes"));
        assert!(dump.contains("used: 86 bytes"));
    }
}
