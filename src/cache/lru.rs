//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::HashMap;

// == Node ==
/// A slot in the arena-backed doubly-linked list.
#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys live in a doubly-linked list stored in a `Vec` arena, with a
/// key -> slot index for O(1) lookup:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// `touch`, `remove` and `evict_oldest` are all O(1). A key is never
/// tracked twice.
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Arena of list nodes, `None` marks a free slot
    nodes: Vec<Option<Node>>,
    /// Free slots available for reuse
    free: Vec<usize>,
    /// Key to arena slot
    index: HashMap<String, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as recently used (moves to front).
    ///
    /// If key exists, it is unlinked and relinked at the head.
    /// If key is new, a node is allocated at the head.
    pub fn touch(&mut self, key: &str) {
        if let Some(&slot) = self.index.get(key) {
            if self.head != Some(slot) {
                self.unlink(slot);
                self.push_front(slot);
            }
            return;
        }

        let node = Node {
            key: key.to_string(),
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.index.insert(key.to_string(), slot);
        self.push_front(slot);
    }

    // == Remove ==
    /// Removes a key from the tracker. Returns whether it was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.index.remove(key) {
            Some(slot) => {
                self.unlink(slot);
                self.release(slot);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let slot = self.tail?;
        self.unlink(slot);
        let node = self.release(slot)?;
        self.index.remove(&node.key);
        Some(node.key)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    // == Iterate ==
    /// Iterates keys from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        std::iter::successors(self.head.and_then(|slot| self.node(slot)), |node| {
            node.next.and_then(|slot| self.node(slot))
        })
        .map(|node| node.key.as_str())
    }

    // == Internals ==
    fn node(&self, slot: usize) -> Option<&Node> {
        self.nodes.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node> {
        self.nodes.get_mut(slot).and_then(Option::as_mut)
    }

    /// Detaches a node from its neighbours, leaving it allocated.
    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.node_mut(slot) {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    /// Links a detached node in as the new head.
    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(node) = self.node_mut(slot) {
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => {
                if let Some(node) = self.node_mut(h) {
                    node.prev = Some(slot);
                }
            }
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn release(&mut self, slot: usize) -> Option<Node> {
        let node = self.nodes.get_mut(slot)?.take();
        if node.is_some() {
            self.free.push(slot);
        }
        node
    }
}
