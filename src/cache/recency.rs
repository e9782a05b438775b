//! Recency Tracker Module
//!
//! Orders keys by access for LRU eviction and LRU/MRU listing.

use std::collections::{BTreeMap, HashMap};

// == Recency Tracker ==
/// Tracks access order for keys held in a store.
///
/// Every touch stamps the key with a fresh sequence number, so ordering
/// follows the actual order of accesses even when several land in the same
/// clock millisecond. Lowest sequence = least recently used.
#[derive(Debug, Default)]
pub struct RecencyTracker {
    /// Sequence number -> key, ascending = oldest first
    by_seq: BTreeMap<u64, String>,
    /// Key -> its current sequence number
    seq_of: HashMap<String, u64>,
    next_seq: u64,
}

impl RecencyTracker {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, tracking it if new.
    pub fn touch(&mut self, key: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;

        match self.seq_of.get_mut(key) {
            Some(old) => {
                self.by_seq.remove(&*old);
                *old = seq;
            }
            None => {
                self.seq_of.insert(key.to_string(), seq);
            }
        }
        self.by_seq.insert(seq, key.to_string());
    }

    // == Remove ==
    /// Stops tracking a key. No-op if absent.
    pub fn remove(&mut self, key: &str) {
        if let Some(seq) = self.seq_of.remove(key) {
            self.by_seq.remove(&seq);
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_seq.pop_first()?;
        self.seq_of.remove(&key);
        Some(key)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.by_seq.values().next().map(String::as_str)
    }

    // == Ordered Iteration ==
    /// Keys from least to most recently used.
    pub fn oldest_first(&self) -> impl DoubleEndedIterator<Item = &str> + '_ {
        self.by_seq.values().map(String::as_str)
    }

    /// Keys from most to least recently used.
    pub fn newest_first(&self) -> impl Iterator<Item = &str> + '_ {
        self.oldest_first().rev()
    }

    pub fn clear(&mut self) {
        self.by_seq.clear();
        self.seq_of.clear();
    }

    pub fn len(&self) -> usize {
        self.seq_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq_of.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seq_of.contains_key(key)
    }
}
