//! Invalidation Pattern Module
//!
//! Registry of regular expressions that can carry a per-key TTL override.

use std::time::Duration;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::{CacheError, Result};

// == Invalidation Pattern ==
/// A compiled pattern with an optional TTL for the keys it matches.
#[derive(Debug, Clone)]
pub struct InvalidationPattern {
    regex: Regex,
    custom_ttl: Option<Duration>,
}

impl InvalidationPattern {
    /// Compiles `pattern`, failing with `CacheError::InvalidPattern`.
    pub fn compile(pattern: &str, custom_ttl: Option<Duration>) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| CacheError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex, custom_ttl })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn custom_ttl(&self) -> Option<Duration> {
        self.custom_ttl
    }

    /// Unanchored search, so `ticket-1` matches inside `list:ticket-12`.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

// == Pattern Registry ==
/// Patterns keyed by their source text, kept in registration order.
///
/// Re-registering the same text replaces the pattern in place, so it keeps
/// its original position for TTL resolution.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    patterns: IndexMap<String, InvalidationPattern>,
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Compiles and stores a pattern. Nothing changes if compilation fails.
    pub fn register(&mut self, pattern: &str, custom_ttl: Option<Duration>) -> Result<()> {
        let compiled = InvalidationPattern::compile(pattern, custom_ttl)?;
        self.patterns.insert(pattern.to_string(), compiled);
        Ok(())
    }

    // == Remove ==
    /// Removes a pattern by its source text. Returns whether it was present.
    pub fn remove(&mut self, pattern: &str) -> bool {
        self.patterns.shift_remove(pattern).is_some()
    }

    // == TTL Lookup ==
    /// TTL of the first registered pattern that matches `key` and defines one.
    pub fn ttl_for(&self, key: &str) -> Option<Duration> {
        self.patterns
            .values()
            .filter(|p| p.custom_ttl.is_some())
            .find(|p| p.matches(key))
            .and_then(|p| p.custom_ttl)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InvalidationPattern)> + '_ {
        self.patterns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
