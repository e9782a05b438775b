//! Error types for the ticket cache
//!
//! Provides unified error handling using thiserror. Only configuration
//! mistakes surface as errors; misses and failed invalidation sweeps never do.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the ticket cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// An invalidation pattern could not be compiled at registration time
    #[error("Invalid invalidation pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A domain name did not match any configured domain
    #[error("Unknown cache domain: {0}")]
    UnknownDomain(String),
}

// == Result Type Alias ==
/// Convenience Result type for the ticket cache.
pub type Result<T> = std::result::Result<T, CacheError>;
