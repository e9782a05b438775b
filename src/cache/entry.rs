//! Cache Entry Module
//!
//! Defines a stored value together with its access and update timestamps.

use std::time::Duration;

// == Cache Entry ==
/// A single cached value with recency metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value, opaque to the cache
    pub value: V,
    /// Last read or write (Unix milliseconds)
    pub last_access_ms: u64,
    /// Last write (Unix milliseconds); TTL age is measured from here
    pub last_update_ms: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry stamped as both accessed and updated at `now_ms`.
    pub fn new(value: V, now_ms: u64) -> Self {
        Self {
            value,
            last_access_ms: now_ms,
            last_update_ms: now_ms,
        }
    }

    // == Touch ==
    /// Records a read at `now_ms`.
    ///
    /// The access timestamp never moves backwards, even if the clock does.
    pub fn touch(&mut self, now_ms: u64) {
        self.last_access_ms = self.last_access_ms.max(now_ms);
    }

    // == Replace ==
    /// Overwrites the value and stamps both timestamps.
    pub fn replace(&mut self, value: V, now_ms: u64) {
        self.value = value;
        self.touch(now_ms);
        self.last_update_ms = self.last_update_ms.max(now_ms);
    }

    // == Age ==
    /// Milliseconds since the last write.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_update_ms)
    }

    // == Is Expired ==
    /// Checks the entry against a TTL.
    ///
    /// An entry is expired once its age reaches the TTL, so a zero TTL
    /// expires immediately.
    pub fn is_expired(&self, ttl: Duration, now_ms: u64) -> bool {
        self.age_ms(now_ms) >= ttl.as_millis() as u64
    }

    /// Remaining lifetime under `ttl`, zero once expired.
    pub fn ttl_remaining(&self, ttl: Duration, now_ms: u64) -> Duration {
        ttl.saturating_sub(Duration::from_millis(self.age_ms(now_ms)))
    }
}
