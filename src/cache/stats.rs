//! Access Statistics Module
//!
//! Tracks hits, misses and lookup latency for one logical cache.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Access Statistics ==
/// Per-domain lookup counters.
///
/// `hits + misses == access_count` holds after every call.
#[derive(Debug, Clone, Default)]
pub struct AccessStatistics {
    hits: u64,
    misses: u64,
    access_count: u64,
    total_access_time: Duration,
    last_access_time: Option<DateTime<Utc>>,
}

impl AccessStatistics {
    // == Constructor ==
    /// Creates statistics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Records a lookup that was served from the cache.
    pub fn record_hit(&mut self, access_time: Duration, at: DateTime<Utc>) {
        self.hits += 1;
        self.record_access(access_time, at);
    }

    // == Record Miss ==
    /// Records a lookup that was not served from the cache.
    pub fn record_miss(&mut self, access_time: Duration, at: DateTime<Utc>) {
        self.misses += 1;
        self.record_access(access_time, at);
    }

    fn record_access(&mut self, access_time: Duration, at: DateTime<Utc>) {
        self.access_count += 1;
        self.total_access_time += access_time;
        self.last_access_time = Some(at);
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups were made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Average Access Time ==
    /// Mean lookup latency in milliseconds, or 0.0 if no lookups were made.
    pub fn average_access_time_ms(&self) -> f64 {
        if self.access_count == 0 {
            0.0
        } else {
            self.total_access_time.as_secs_f64() / self.access_count as f64 * 1000.0
        }
    }

    // == Reset ==
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    pub fn total_access_time(&self) -> Duration {
        self.total_access_time
    }

    pub fn last_access_time(&self) -> Option<DateTime<Utc>> {
        self.last_access_time
    }
}

// == Domain Stats ==
/// Snapshot of one domain, as reported by `TicketCache::get_stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainStats {
    /// Entries currently resident, including ones not yet found expired
    pub size: usize,
    pub max_size: usize,
    /// Default TTL in seconds
    pub ttl: u64,
    pub hit_rate: f64,
    pub avg_access_time_ms: f64,
    pub access_count: u64,
    pub hits: u64,
    pub misses: u64,
    pub last_access_time: Option<DateTime<Utc>>,
}
