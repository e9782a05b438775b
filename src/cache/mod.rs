//! Cache Module
//!
//! Provides TTL-bounded per-domain stores with pattern invalidation, LRU
//! eviction and access statistics, composed behind the `TicketCache` facade.

mod clock;
mod domain;
mod entry;
mod facade;
mod pattern;
mod policy;
mod recency;
mod stats;
mod store;


// Re-export public types
pub use clock::{to_datetime, Clock, ManualClock, SystemClock};
pub use domain::Domain;
pub use entry::CacheEntry;
pub use facade::TicketCache;
pub use pattern::{InvalidationPattern, PatternRegistry};
pub use policy::{empty_collection_policy, IsEmptyCollection, MissPolicy};
pub use recency::RecencyTracker;
pub use stats::{AccessStatistics, DomainStats};
pub use store::TtlStore;
