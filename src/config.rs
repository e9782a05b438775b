//! Configuration Module
//!
//! Per-domain capacity and TTL settings, loadable from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::Domain;

// == Domain Config ==
/// Capacity and default TTL of one domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Maximum number of entries held at once
    pub max_size: usize,
    /// Default TTL in seconds
    pub ttl_seconds: u64,
}

impl DomainConfig {
    pub fn new(max_size: usize, ttl_seconds: u64) -> Self {
        Self {
            max_size,
            ttl_seconds,
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

// == Lock Strategy ==
/// How the facade serializes access to its domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockStrategy {
    /// One reentrant lock shared by every domain; cross-domain operations
    /// such as `clear_all` are atomic.
    #[default]
    Global,
    /// One lock per domain; unrelated domains never block each other.
    PerDomain,
}

impl FromStr for LockStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(LockStrategy::Global),
            "per-domain" | "per_domain" => Ok(LockStrategy::PerDomain),
            other => Err(format!("unknown lock strategy '{}'", other)),
        }
    }
}

// == Cache Config ==
/// Construction parameters for `TicketCache`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub collections: DomainConfig,
    pub entities: DomainConfig,
    pub principals: DomainConfig,
    pub lock_strategy: LockStrategy,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_COLLECTIONS_TTL` / `CACHE_COLLECTIONS_MAX_SIZE` (default: 900s / 100)
    /// - `CACHE_ENTITIES_TTL` / `CACHE_ENTITIES_MAX_SIZE` (default: 300s / 1000)
    /// - `CACHE_PRINCIPALS_TTL` / `CACHE_PRINCIPALS_MAX_SIZE` (default: 1800s / 500)
    /// - `CACHE_LOCK_STRATEGY` - `global` or `per-domain` (default: global)
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let domain = |prefix: &str, fallback: DomainConfig| DomainConfig {
            max_size: parse_var(&lookup, &format!("CACHE_{}_MAX_SIZE", prefix))
                .unwrap_or(fallback.max_size),
            ttl_seconds: parse_var(&lookup, &format!("CACHE_{}_TTL", prefix))
                .unwrap_or(fallback.ttl_seconds),
        };

        Self {
            collections: domain("COLLECTIONS", defaults.collections),
            entities: domain("ENTITIES", defaults.entities),
            principals: domain("PRINCIPALS", defaults.principals),
            lock_strategy: parse_var(&lookup, "CACHE_LOCK_STRATEGY")
                .unwrap_or(defaults.lock_strategy),
        }
    }

    /// Settings for one domain.
    pub fn domain(&self, domain: Domain) -> DomainConfig {
        match domain {
            Domain::Collections => self.collections,
            Domain::Entities => self.entities,
            Domain::Principals => self.principals,
        }
    }

    pub fn with_domain(mut self, domain: Domain, config: DomainConfig) -> Self {
        match domain {
            Domain::Collections => self.collections = config,
            Domain::Entities => self.entities = config,
            Domain::Principals => self.principals = config,
        }
        self
    }

    pub fn with_lock_strategy(mut self, lock_strategy: LockStrategy) -> Self {
        self.lock_strategy = lock_strategy;
        self
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|v| v.trim().parse().ok())
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            collections: DomainConfig::new(100, 900),
            entities: DomainConfig::new(1000, 300),
            principals: DomainConfig::new(500, 1800),
            lock_strategy: LockStrategy::Global,
        }
    }
}
