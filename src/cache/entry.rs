//! Cache Entry Module
//!
//! Defines everything cached under one key: named header values and an
//! optional file body, together with their byte size.

use std::collections::HashMap;

use bytes::Bytes;

// == Cache Entry ==
/// Header values and optional body stored under one key.
///
/// `size` is the sum of the byte lengths of all header values plus the body
/// length. It is kept in step with every mutation so the store never has to
/// walk the entry to learn its footprint.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    headers: HashMap<String, String>,
    body: Option<Bytes>,
    size: usize,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an empty entry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Accessors ==
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Bytes this entry accounts for.
    pub fn size(&self) -> usize {
        self.size
    }

    // == Sizing ==
    /// Byte length currently stored under header `name` (0 if absent).
    pub fn header_len(&self, name: &str) -> usize {
        self.headers.get(name).map_or(0, String::len)
    }

    /// Byte length of the body (0 if absent).
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Bytes::len)
    }

    /// Size computed from scratch; always equal to `size()`.
    pub fn recomputed_size(&self) -> usize {
        self.headers.values().map(String::len).sum::<usize>() + self.body_len()
    }

    // == Mutation ==
    /// Replaces header `name`, returning the length of the previous value.
    pub fn set_header(&mut self, name: &str, value: String) -> usize {
        let new_len = value.len();
        let old_len = self
            .headers
            .insert(name.to_string(), value)
            .map_or(0, |old| old.len());
        self.size = self.size - old_len + new_len;
        old_len
    }

    /// Removes header `name`, returning its value.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let old = self.headers.remove(name)?;
        self.size -= old.len();
        Some(old)
    }

    /// Replaces the body, returning the length of the previous one.
    pub fn set_body(&mut self, body: Bytes) -> usize {
        let new_len = body.len();
        let old_len = self.body.replace(body).map_or(0, |old| old.len());
        self.size = self.size - old_len + new_len;
        old_len
    }
}
