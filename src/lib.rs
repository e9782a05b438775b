//! Ticket Cache - an in-process caching layer for a remote ticketing API
//!
//! Provides independently configured TTL stores per domain with pattern
//! invalidation, LRU eviction and hit/miss statistics.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Domain, DomainStats, ManualClock, SystemClock, TicketCache};
pub use config::{CacheConfig, DomainConfig, LockStrategy};
pub use error::{CacheError, Result};
