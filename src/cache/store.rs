//! TTL Store Module
//!
//! Bounded key-value storage combining lazy TTL expiry, LRU eviction and
//! regex-based invalidation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, Clock, PatternRegistry, RecencyTracker};
use crate::error::Result;

// == TTL Store ==
/// Bounded key-value store with expiry and pattern invalidation.
///
/// Expiry is lazy: stale entries stay resident (and count against
/// `max_size`) until they are read or pushed out by LRU eviction.
#[derive(Debug)]
pub struct TtlStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Access order for eviction and LRU/MRU listing
    recency: RecencyTracker,
    /// Registered invalidation patterns
    patterns: PatternRegistry,
    /// Maximum number of resident entries
    max_size: usize,
    /// TTL applied when neither the caller nor a pattern supplies one
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlStore<V> {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `max_size` - Maximum number of entries held at once
    /// * `default_ttl` - TTL used when no override applies
    /// * `clock` - Time source for entry timestamps
    pub fn new(max_size: usize, default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            recency: RecencyTracker::new(),
            patterns: PatternRegistry::new(),
            max_size,
            default_ttl,
            clock,
        }
    }

    // == Get ==
    /// Returns the value if present and unexpired.
    ///
    /// Staleness is judged by the first registered pattern TTL matching the
    /// key, else the default TTL. A hit refreshes the access timestamp; an
    /// expired entry is deleted.
    pub fn get(&mut self, key: &str) -> Option<V> {
        self.lookup(key, None)
    }

    // == Get With Custom TTL ==
    /// Like [`get`](Self::get), but staleness is judged by `ttl` alone.
    pub fn get_with_custom_ttl(&mut self, key: &str, ttl: Duration) -> Option<V> {
        self.lookup(key, Some(ttl))
    }

    fn lookup(&mut self, key: &str, explicit_ttl: Option<Duration>) -> Option<V> {
        let ttl = self.effective_ttl(key, explicit_ttl);
        let now = self.clock.now_ms();

        let entry = self.entries.get_mut(key)?;
        if entry.is_expired(ttl, now) {
            debug!(key, ttl_secs = ttl.as_secs(), "Entry expired, removing");
            self.delete(key);
            return None;
        }

        entry.touch(now);
        let value = entry.value.clone();
        self.recency.touch(key);
        Some(value)
    }

    // == Effective TTL ==
    /// Resolves the TTL for `key`: explicit argument, then the first matching
    /// pattern TTL in registration order, then the default.
    pub fn effective_ttl(&self, key: &str, explicit_ttl: Option<Duration>) -> Duration {
        explicit_ttl
            .or_else(|| self.patterns.ttl_for(key))
            .unwrap_or(self.default_ttl)
    }

    // == Set ==
    /// Inserts or overwrites a value, stamping it as just accessed and updated.
    ///
    /// Inserting a new key into a full store first evicts the entry with the
    /// oldest access.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        let now = self.clock.now_ms();

        if let Some(entry) = self.entries.get_mut(&key) {
            entry.replace(value, now);
            self.recency.touch(&key);
            return;
        }

        if self.max_size == 0 {
            debug!(key = %key, "Store has zero capacity, value not cached");
            return;
        }

        while self.entries.len() >= self.max_size {
            match self.recency.evict_oldest() {
                Some(evicted) => {
                    self.entries.remove(&evicted);
                    debug!(key = %evicted, "Evicted least recently used entry");
                }
                None => break,
            }
        }

        self.entries.insert(key.clone(), CacheEntry::new(value, now));
        self.recency.touch(&key);
    }

    // == Delete ==
    /// Removes an entry. Returns whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        self.recency.remove(key);
        self.entries.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry. Registered patterns are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    // == Pattern Registration ==
    /// Registers a pattern, optionally with a TTL for the keys it matches.
    ///
    /// Fails with `CacheError::InvalidPattern` if `pattern` does not compile.
    pub fn add_invalidation_pattern(
        &mut self,
        pattern: &str,
        custom_ttl: Option<Duration>,
    ) -> Result<()> {
        self.patterns.register(pattern, custom_ttl)
    }

    /// Unregisters a pattern. No-op if it was never registered.
    pub fn remove_invalidation_pattern(&mut self, pattern: &str) -> bool {
        self.patterns.remove(pattern)
    }

    pub fn patterns(&self) -> &PatternRegistry {
        &self.patterns
    }

    // == Invalidate By Pattern ==
    /// Deletes every key matching `pattern` and returns how many were removed.
    ///
    /// The pattern is compiled ad hoc and need not be registered. An invalid
    /// pattern is logged and removes nothing.
    pub fn invalidate_by_pattern(&mut self, pattern: &str) -> usize {
        match Regex::new(pattern) {
            Ok(regex) => self.invalidate_where(|key| regex.is_match(key)),
            Err(err) => {
                warn!(pattern, error = %err, "Ignoring invalid invalidation pattern");
                0
            }
        }
    }

    // == Invalidate Where ==
    /// Deletes every key satisfying `predicate` and returns the count.
    pub fn invalidate_where(&mut self, predicate: impl Fn(&str) -> bool) -> usize {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| predicate(key.as_str()))
            .cloned()
            .collect();

        for key in &doomed {
            self.delete(key);
        }
        doomed.len()
    }

    // == LRU / MRU Listing ==
    /// Up to `n` unexpired entries, least recently used first.
    ///
    /// Listing does not count as an access.
    pub fn get_lru_items(&self, n: usize) -> Vec<(String, V)> {
        self.collect_items(self.recency.oldest_first(), n)
    }

    /// Up to `n` unexpired entries, most recently used first.
    pub fn get_mru_items(&self, n: usize) -> Vec<(String, V)> {
        self.collect_items(self.recency.newest_first(), n)
    }

    fn collect_items<'a>(
        &'a self,
        keys: impl Iterator<Item = &'a str>,
        n: usize,
    ) -> Vec<(String, V)> {
        let now = self.clock.now_ms();
        keys.filter_map(|key| {
            let entry = self.entries.get(key)?;
            if entry.is_expired(self.effective_ttl(key, None), now) {
                return None;
            }
            Some((key.to_string(), entry.value.clone()))
        })
        .take(n)
        .collect()
    }

    // == Rebuild ==
    /// Replaces this store with one of a new capacity and default TTL.
    ///
    /// Patterns carry over. Entries that are already stale are dropped; of
    /// the rest, the `max_size` most recently used survive and are
    /// re-inserted oldest first, so their relative recency is kept. Survivors
    /// start a fresh TTL window. Returns the number of entries dropped.
    pub fn rebuild(&mut self, max_size: usize, default_ttl: Duration) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();

        let live: Vec<String> = self
            .recency
            .oldest_first()
            .filter(|key| {
                self.entries
                    .get(*key)
                    .is_some_and(|e| !e.is_expired(self.effective_ttl(key, None), now))
            })
            .map(str::to_string)
            .collect();
        let skip = live.len().saturating_sub(max_size);

        let mut old_entries = std::mem::take(&mut self.entries);
        let mut rebuilt = TtlStore::new(max_size, default_ttl, Arc::clone(&self.clock));
        rebuilt.patterns = std::mem::take(&mut self.patterns);

        for key in live.into_iter().skip(skip) {
            if let Some(entry) = old_entries.remove(&key) {
                rebuilt.set(key, entry.value);
            }
        }

        *self = rebuilt;
        before - self.entries.len()
    }

    // == Accessors ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Timestamps of a resident entry without touching it.
    pub fn peek_entry(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }
}
