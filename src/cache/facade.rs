//! Cache Facade Module
//!
//! `TicketCache` owns one TTL store and one statistics tracker per domain and
//! exposes domain-scoped operations plus cross-domain administration.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, info, warn};

use crate::cache::clock::to_datetime;
use crate::cache::{
    empty_collection_policy, AccessStatistics, Clock, Domain, DomainStats, IsEmptyCollection,
    MissPolicy, SystemClock, TtlStore,
};
use crate::config::{CacheConfig, LockStrategy};
use crate::error::Result;

// == Shard ==
/// Everything owned by one domain.
struct Shard<V> {
    store: TtlStore<V>,
    stats: AccessStatistics,
    miss_policy: Option<MissPolicy<V>>,
}

// == Ticket Cache ==
/// In-process cache fronting the remote ticketing API.
///
/// Construct one at the application's composition root and share it with
/// `Arc`. Values are opaque; one value type serves all three domains.
///
/// With [`LockStrategy::Global`] every operation first takes a single
/// reentrant lock, so cross-domain operations like [`clear_all`] are atomic.
/// With [`LockStrategy::PerDomain`] only the affected domain is locked.
/// Consumer code (including miss policies) never runs while a lock is held.
///
/// [`clear_all`]: TicketCache::clear_all
pub struct TicketCache<V> {
    lock_strategy: LockStrategy,
    global: ReentrantMutex<()>,
    shards: [Mutex<Shard<V>>; 3],
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TicketCache<V> {
    // == Constructors ==
    /// Creates a cache driven by the system clock.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit time source.
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let shard = |domain: Domain| {
            let settings = config.domain(domain);
            Mutex::new(Shard {
                store: TtlStore::new(settings.max_size, settings.ttl(), Arc::clone(&clock)),
                stats: AccessStatistics::new(),
                miss_policy: None,
            })
        };

        Self {
            lock_strategy: config.lock_strategy,
            global: ReentrantMutex::new(()),
            shards: Domain::ALL.map(shard),
            clock,
        }
    }

    /// Installs a predicate that turns matching cached values into misses.
    pub fn with_miss_policy(self, domain: Domain, policy: MissPolicy<V>) -> Self {
        self.set_miss_policy(domain, Some(policy));
        self
    }

    /// Replaces or removes a domain's miss policy.
    pub fn set_miss_policy(&self, domain: Domain, policy: Option<MissPolicy<V>>) {
        self.with_shard(domain, |shard| shard.miss_policy = policy);
    }

    pub fn lock_strategy(&self) -> LockStrategy {
        self.lock_strategy
    }

    // == Locking ==
    fn global_guard(&self) -> Option<ReentrantMutexGuard<'_, ()>> {
        match self.lock_strategy {
            LockStrategy::Global => Some(self.global.lock()),
            LockStrategy::PerDomain => None,
        }
    }

    fn with_shard<R>(&self, domain: Domain, f: impl FnOnce(&mut Shard<V>) -> R) -> R {
        let _global = self.global_guard();
        let mut shard = self.shards[domain.index()].lock();
        f(&mut shard)
    }

    // == Get ==
    /// Looks up `key` in `domain`, recording a hit or miss.
    ///
    /// With `custom_ttl` the entry's age is judged by that TTL alone and a
    /// stale entry is deleted. A value rejected by the domain's miss policy
    /// is reported (and counted) as a miss but left in place.
    pub fn get(&self, domain: Domain, key: &str, custom_ttl: Option<Duration>) -> Option<V> {
        let started = Instant::now();

        let (found, policy) = self.with_shard(domain, |shard| {
            let found = match custom_ttl {
                Some(ttl) => shard.store.get_with_custom_ttl(key, ttl),
                None => shard.store.get(key),
            };
            (found, shard.miss_policy.clone())
        });

        let value = match (found, policy) {
            (Some(value), Some(policy)) if policy(&value) => {
                warn!(%domain, key, "Cached value rejected by miss policy, forcing refresh");
                None
            }
            (found, _) => found,
        };

        let hit = value.is_some();
        let elapsed = started.elapsed();
        let at = to_datetime(self.clock.now_ms());
        self.with_shard(domain, |shard| {
            if hit {
                shard.stats.record_hit(elapsed, at);
            } else {
                shard.stats.record_miss(elapsed, at);
            }
        });

        debug!(%domain, key, hit, "Cache lookup");
        value
    }

    // == Set ==
    /// Stores `value` under `key`, evicting the domain's LRU entry if full.
    pub fn set(&self, domain: Domain, key: impl Into<String>, value: V) -> &Self {
        self.with_shard(domain, |shard| shard.store.set(key, value));
        self
    }

    // == Delete ==
    /// Removes one key. Returns whether it was present.
    pub fn delete(&self, domain: Domain, key: &str) -> bool {
        self.with_shard(domain, |shard| shard.store.delete(key))
    }

    // == Invalidate All ==
    /// Empties one domain. Registered patterns and statistics are kept.
    pub fn invalidate_all(&self, domain: Domain) {
        let removed = self.with_shard(domain, |shard| {
            let removed = shard.store.len();
            shard.store.clear();
            removed
        });
        info!(%domain, removed, "Invalidated domain");
    }

    // == Invalidate By Pattern ==
    /// Deletes keys matching an ad hoc regex. Never fails; an invalid
    /// pattern is logged and removes nothing.
    pub fn invalidate_by_pattern(&self, domain: Domain, pattern: &str) -> usize {
        let removed = self.with_shard(domain, |shard| shard.store.invalidate_by_pattern(pattern));
        info!(%domain, pattern, removed, "Pattern invalidation");
        removed
    }

    // == Pattern Registry ==
    /// Registers an invalidation pattern, optionally with a TTL for the keys
    /// it matches.
    pub fn add_invalidation_pattern(
        &self,
        domain: Domain,
        pattern: &str,
        custom_ttl: Option<Duration>,
    ) -> Result<()> {
        self.with_shard(domain, |shard| {
            shard.store.add_invalidation_pattern(pattern, custom_ttl)
        })?;
        debug!(%domain, pattern, ?custom_ttl, "Registered invalidation pattern");
        Ok(())
    }

    pub fn remove_invalidation_pattern(&self, domain: Domain, pattern: &str) -> bool {
        self.with_shard(domain, |shard| shard.store.remove_invalidation_pattern(pattern))
    }

    /// Registered patterns with their TTL overrides, in registration order.
    pub fn invalidation_patterns(&self, domain: Domain) -> Vec<(String, Option<Duration>)> {
        self.with_shard(domain, |shard| {
            shard
                .store
                .patterns()
                .iter()
                .map(|(text, pattern)| (text.to_string(), pattern.custom_ttl()))
                .collect()
        })
    }

    /// Number of resident entries, including ones not yet found expired.
    pub fn len(&self, domain: Domain) -> usize {
        self.with_shard(domain, |shard| shard.store.len())
    }

    pub fn is_empty(&self, domain: Domain) -> bool {
        self.len(domain) == 0
    }

    // == Collections ==
    pub fn get_collection(&self, key: &str, custom_ttl: Option<Duration>) -> Option<V> {
        self.get(Domain::Collections, key, custom_ttl)
    }

    pub fn set_collection(&self, key: impl Into<String>, value: V) -> &Self {
        self.set(Domain::Collections, key, value)
    }

    pub fn invalidate_collections(&self) {
        self.invalidate_all(Domain::Collections)
    }

    pub fn invalidate_collections_by_pattern(&self, pattern: &str) -> usize {
        self.invalidate_by_pattern(Domain::Collections, pattern)
    }

    pub fn add_collections_invalidation_pattern(
        &self,
        pattern: &str,
        custom_ttl: Option<Duration>,
    ) -> Result<()> {
        self.add_invalidation_pattern(Domain::Collections, pattern, custom_ttl)
    }

    // == Entities ==
    pub fn get_entity(&self, key: &str, custom_ttl: Option<Duration>) -> Option<V> {
        self.get(Domain::Entities, key, custom_ttl)
    }

    pub fn set_entity(&self, key: impl Into<String>, value: V) -> &Self {
        self.set(Domain::Entities, key, value)
    }

    pub fn invalidate_entities(&self) {
        self.invalidate_all(Domain::Entities)
    }

    /// Deletes every entity key containing `id` as a plain substring.
    ///
    /// When nothing matches, nothing is removed; call
    /// [`invalidate_entities`](Self::invalidate_entities) to wipe the domain.
    pub fn invalidate_entity(&self, id: &str) -> usize {
        let removed = self.with_shard(Domain::Entities, |shard| {
            shard.store.invalidate_where(|key| key.contains(id))
        });
        if removed == 0 {
            debug!(id, "No entity keys contain id, nothing invalidated");
        } else {
            info!(id, removed, "Invalidated entity");
        }
        removed
    }

    pub fn invalidate_entities_by_pattern(&self, pattern: &str) -> usize {
        self.invalidate_by_pattern(Domain::Entities, pattern)
    }

    pub fn add_entities_invalidation_pattern(
        &self,
        pattern: &str,
        custom_ttl: Option<Duration>,
    ) -> Result<()> {
        self.add_invalidation_pattern(Domain::Entities, pattern, custom_ttl)
    }

    // == Principals ==
    pub fn get_principal(&self, key: &str, custom_ttl: Option<Duration>) -> Option<V> {
        self.get(Domain::Principals, key, custom_ttl)
    }

    pub fn set_principal(&self, key: impl Into<String>, value: V) -> &Self {
        self.set(Domain::Principals, key, value)
    }

    pub fn invalidate_principals(&self) {
        self.invalidate_all(Domain::Principals)
    }

    pub fn invalidate_principals_by_pattern(&self, pattern: &str) -> usize {
        self.invalidate_by_pattern(Domain::Principals, pattern)
    }

    pub fn add_principals_invalidation_pattern(
        &self,
        pattern: &str,
        custom_ttl: Option<Duration>,
    ) -> Result<()> {
        self.add_invalidation_pattern(Domain::Principals, pattern, custom_ttl)
    }

    // == Administration ==
    /// Rebuilds a domain's store with a new default TTL.
    ///
    /// Patterns carry over; unexpired entries are re-inserted with a fresh
    /// TTL window. Fails with `CacheError::UnknownDomain`.
    pub fn set_custom_ttl(&self, domain: impl AsRef<str>, ttl: Duration) -> Result<()> {
        let domain: Domain = domain.as_ref().parse()?;
        let dropped = self.with_shard(domain, |shard| {
            let max_size = shard.store.max_size();
            shard.store.rebuild(max_size, ttl)
        });
        info!(%domain, ttl_secs = ttl.as_secs(), dropped, "Rebuilt domain with new TTL");
        Ok(())
    }

    /// Rebuilds a domain's store with a new capacity.
    ///
    /// When shrinking, the most recently used entries survive. Fails with
    /// `CacheError::UnknownDomain`.
    pub fn set_custom_cache_size(&self, domain: impl AsRef<str>, max_size: usize) -> Result<()> {
        let domain: Domain = domain.as_ref().parse()?;
        let dropped = self.with_shard(domain, |shard| {
            let ttl = shard.store.default_ttl();
            shard.store.rebuild(max_size, ttl)
        });
        info!(%domain, max_size, dropped, "Rebuilt domain with new capacity");
        Ok(())
    }

    /// Empties every domain.
    pub fn clear_all(&self) {
        let _global = self.global_guard();
        for domain in Domain::ALL {
            self.invalidate_all(domain);
        }
    }

    /// Zeroes every domain's statistics.
    pub fn reset_statistics(&self) {
        let _global = self.global_guard();
        for domain in Domain::ALL {
            self.with_shard(domain, |shard| shard.stats.reset());
        }
        info!("Reset cache statistics");
    }

    /// Snapshot of every domain's size, configuration and statistics.
    pub fn get_stats(&self) -> BTreeMap<Domain, DomainStats> {
        let _global = self.global_guard();
        Domain::ALL
            .into_iter()
            .map(|domain| (domain, self.with_shard(domain, |shard| snapshot(shard))))
            .collect()
    }

    /// Raw statistics of one domain.
    pub fn statistics(&self, domain: Domain) -> AccessStatistics {
        self.with_shard(domain, |shard| shard.stats.clone())
    }

    /// Up to `n` entries of a domain, least recently used first.
    pub fn get_lru_items(&self, domain: impl AsRef<str>, n: usize) -> Result<Vec<(String, V)>> {
        let domain: Domain = domain.as_ref().parse()?;
        Ok(self.with_shard(domain, |shard| shard.store.get_lru_items(n)))
    }

    /// Up to `n` entries of a domain, most recently used first.
    pub fn get_mru_items(&self, domain: impl AsRef<str>, n: usize) -> Result<Vec<(String, V)>> {
        let domain: Domain = domain.as_ref().parse()?;
        Ok(self.with_shard(domain, |shard| shard.store.get_mru_items(n)))
    }
}

impl<V> TicketCache<V>
where
    V: Clone + IsEmptyCollection + 'static,
{
    /// Treats empty cached collections in the collections domain as misses.
    pub fn with_empty_collection_guard(self) -> Self {
        self.with_miss_policy(Domain::Collections, empty_collection_policy())
    }
}

fn snapshot<V: Clone>(shard: &Shard<V>) -> DomainStats {
    DomainStats {
        size: shard.store.len(),
        max_size: shard.store.max_size(),
        ttl: shard.store.default_ttl().as_secs(),
        hit_rate: shard.stats.hit_rate(),
        avg_access_time_ms: shard.stats.average_access_time_ms(),
        access_count: shard.stats.access_count(),
        hits: shard.stats.hits(),
        misses: shard.stats.misses(),
        last_access_time: shard.stats.last_access_time(),
    }
}

impl<V> fmt::Debug for TicketCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketCache")
            .field("lock_strategy", &self.lock_strategy)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::config::DomainConfig;
    use crate::error::CacheError;
    use serde_json::{json, Value};

    fn cache_with(config: CacheConfig) -> (TicketCache<Value>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        (TicketCache::with_clock(config, clock.clone()), clock)
    }

    fn cache() -> (TicketCache<Value>, Arc<ManualClock>) {
        cache_with(CacheConfig::default())
    }

    #[test]
    fn test_domains_are_independent() {
        let (cache, _) = cache();

        cache.set_entity("t-1", json!({"id": 1}));
        assert_eq!(cache.get_entity("t-1", None), Some(json!({"id": 1})));
        assert_eq!(cache.get_principal("t-1", None), None);
        assert_eq!(cache.get_collection("t-1", None), None);
    }

    #[test]
    fn test_set_chains() {
        let (cache, _) = cache();

        cache
            .set_principal("u-1", json!("alice"))
            .set_principal("u-2", json!("bob"));
        assert_eq!(cache.len(Domain::Principals), 2);
    }

    #[test]
    fn test_domain_ttls_from_config() {
        let (cache, clock) = cache();

        cache.set_entity("t-1", json!(1));
        cache.set_collection("open", json!([1]));
        clock.advance(Duration::from_secs(301));

        assert_eq!(cache.get_entity("t-1", None), None);
        assert_eq!(cache.get_collection("open", None), Some(json!([1])));
    }

    #[test]
    fn test_custom_ttl_on_get() {
        let (cache, clock) = cache();

        cache.set_principal("u-1", json!("alice"));
        clock.advance(Duration::from_secs(61));

        assert_eq!(cache.get_principal("u-1", Some(Duration::from_secs(60))), None);
        assert_eq!(cache.len(Domain::Principals), 0);
    }

    #[test]
    fn test_stats_record_hits_and_misses() {
        let (cache, _) = cache();

        cache.set_entity("t-1", json!(1));
        cache.get_entity("t-1", None);
        cache.get_entity("t-1", None);
        cache.get_entity("t-2", None);

        let stats = cache.get_stats();
        let entities = &stats[&Domain::Entities];
        assert_eq!(entities.hits, 2);
        assert_eq!(entities.misses, 1);
        assert_eq!(entities.access_count, 3);
        assert!((entities.hit_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(entities.size, 1);
        assert_eq!(entities.max_size, 1000);
        assert_eq!(entities.ttl, 300);
        assert_eq!(stats[&Domain::Principals].access_count, 0);
    }

    #[test]
    fn test_empty_collection_guard() {
        let (cache, _) = cache();
        let cache = cache.with_empty_collection_guard();

        cache.set_collection("open", json!([]));
        cache.set_entity("empty", json!([]));

        assert_eq!(cache.get_collection("open", None), None);
        assert_eq!(cache.get_entity("empty", None), Some(json!([])));
        assert_eq!(cache.len(Domain::Collections), 1, "rejected value stays resident");

        let stats = cache.statistics(Domain::Collections);
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.hits(), 0);
    }

    #[test]
    fn test_without_guard_empty_collection_is_hit() {
        let (cache, _) = cache();
        cache.set_collection("open", json!([]));
        assert_eq!(cache.get_collection("open", None), Some(json!([])));
    }

    #[test]
    fn test_custom_miss_policy() {
        let (cache, _) = cache();
        let cache =
            cache.with_miss_policy(Domain::Principals, Arc::new(|v: &Value| v.is_null()));

        cache.set_principal("ghost", Value::Null);
        assert_eq!(cache.get_principal("ghost", None), None);

        cache.set_miss_policy(Domain::Principals, None);
        assert_eq!(cache.get_principal("ghost", None), Some(Value::Null));
    }

    #[test]
    fn test_invalidate_entity_substring() {
        let (cache, _) = cache();
        cache.set_entity("ticket:12", json!(12));
        cache.set_entity("ticket:123", json!(123));
        cache.set_entity("ticket:45", json!(45));

        assert_eq!(cache.invalidate_entity("12"), 2);
        assert_eq!(cache.len(Domain::Entities), 1);
    }

    #[test]
    fn test_invalidate_entity_literal_not_regex() {
        let (cache, _) = cache();
        cache.set_entity("ticket:1", json!(1));
        cache.set_entity("ticket:a.b", json!(2));

        assert_eq!(cache.invalidate_entity("."), 1);
        assert!(cache.get_entity("ticket:1", None).is_some());
    }

    #[test]
    fn test_invalidate_entity_no_match_is_noop() {
        let (cache, _) = cache();
        cache.set_entity("ticket:1", json!(1));

        assert_eq!(cache.invalidate_entity("999"), 0);
        assert_eq!(cache.len(Domain::Entities), 1);
    }

    #[test]
    fn test_pattern_operations() {
        let (cache, clock) = cache();

        cache
            .add_collections_invalidation_pattern("^status:open", Some(Duration::from_secs(30)))
            .unwrap();
        assert!(matches!(
            cache.add_collections_invalidation_pattern("(", None),
            Err(CacheError::InvalidPattern { .. })
        ));
        assert_eq!(
            cache.invalidation_patterns(Domain::Collections),
            vec![("^status:open".to_string(), Some(Duration::from_secs(30)))]
        );

        cache.set_collection("status:open|page:1", json!([1]));
        cache.set_collection("status:closed|page:1", json!([2]));
        clock.advance(Duration::from_secs(31));

        assert_eq!(cache.get_collection("status:open|page:1", None), None);
        assert!(cache.get_collection("status:closed|page:1", None).is_some());

        assert!(cache.remove_invalidation_pattern(Domain::Collections, "^status:open"));
        assert!(cache.invalidation_patterns(Domain::Collections).is_empty());
    }

    #[test]
    fn test_invalidate_by_pattern_per_domain() {
        let (cache, _) = cache();
        cache.set_principal("user-123-a", json!(1));
        cache.set_principal("user-123-b", json!(2));
        cache.set_entity("user-123-c", json!(3));

        assert_eq!(cache.invalidate_principals_by_pattern("user-123-.*"), 2);
        assert_eq!(cache.invalidate_principals_by_pattern("[bad"), 0);
        assert_eq!(cache.len(Domain::Entities), 1);
    }

    #[test]
    fn test_set_custom_ttl() {
        let (cache, clock) = cache();
        cache.add_entities_invalidation_pattern("^t-", None).unwrap();
        cache.set_entity("t-1", json!(1));

        cache.set_custom_ttl("entities", Duration::from_secs(10)).unwrap();
        assert_eq!(cache.get_stats()[&Domain::Entities].ttl, 10);
        assert_eq!(cache.invalidation_patterns(Domain::Entities).len(), 1);
        assert_eq!(cache.get_entity("t-1", None), Some(json!(1)));

        clock.advance(Duration::from_secs(11));
        assert_eq!(cache.get_entity("t-1", None), None);
    }

    #[test]
    fn test_set_custom_cache_size() {
        let (cache, clock) = cache();
        for i in 0..5 {
            cache.set_principal(format!("u-{}", i), json!(i));
            clock.advance(Duration::from_millis(1));
        }
        cache.get_principal("u-0", None);

        cache.set_custom_cache_size(Domain::Principals, 2).unwrap();

        assert_eq!(cache.len(Domain::Principals), 2);
        assert_eq!(cache.get_principal("u-0", None), Some(json!(0)));
        assert_eq!(cache.get_principal("u-4", None), Some(json!(4)));
        assert_eq!(cache.get_stats()[&Domain::Principals].max_size, 2);
    }

    #[test]
    fn test_admin_unknown_domain() {
        let (cache, _) = cache();

        assert!(matches!(
            cache.set_custom_ttl("tickets", Duration::from_secs(1)),
            Err(CacheError::UnknownDomain(_))
        ));
        assert!(matches!(
            cache.set_custom_cache_size("tickets", 1),
            Err(CacheError::UnknownDomain(_))
        ));
        assert!(cache.get_lru_items("tickets", 1).is_err());
        assert!(cache.get_mru_items("tickets", 1).is_err());
    }

    #[test]
    fn test_lru_mru_items_by_name() {
        let (cache, _) = cache();
        cache.set_entity("a", json!(1)).set_entity("b", json!(2));
        cache.get_entity("a", None);

        let lru = cache.get_lru_items("entities", 1).unwrap();
        let mru = cache.get_mru_items(Domain::Entities, 1).unwrap();
        assert_eq!(lru, vec![("b".to_string(), json!(2))]);
        assert_eq!(mru, vec![("a".to_string(), json!(1))]);
    }

    #[test]
    fn test_clear_all_and_reset_statistics() {
        let (cache, _) = cache_with(
            CacheConfig::default().with_lock_strategy(LockStrategy::PerDomain),
        );
        cache.set_collection("c", json!([1]));
        cache.set_entity("e", json!(1));
        cache.set_principal("p", json!(1));
        cache.get_entity("e", None);
        cache.add_principals_invalidation_pattern("^p", None).unwrap();

        cache.clear_all();
        cache.reset_statistics();

        for (domain, stats) in cache.get_stats() {
            assert_eq!(stats.size, 0, "{} should be empty", domain);
            assert_eq!(stats.access_count, 0);
            assert!(stats.last_access_time.is_none());
        }
        assert_eq!(cache.invalidation_patterns(Domain::Principals).len(), 1);
    }

    #[test]
    fn test_global_lock_is_reentrant_for_admin_ops() {
        let (cache, _) = cache();
        assert_eq!(cache.lock_strategy(), LockStrategy::Global);

        cache.set_entity("e", json!(1));
        cache.clear_all();
        assert!(cache.is_empty(Domain::Entities));
    }

    #[test]
    fn test_concrete_scenario() {
        let config =
            CacheConfig::default().with_domain(Domain::Entities, DomainConfig::new(2, 5));
        let (cache, _) = cache_with(config);

        cache.set_entity("t-1", json!("A"));
        cache.set_entity("t-2", json!("B"));
        cache.set_entity("t-3", json!("C"));

        assert_eq!(cache.len(Domain::Entities), 2);
        assert_eq!(cache.get_entity("t-1", None), None);

        assert_eq!(cache.invalidate_entity("2"), 1);
        assert_eq!(cache.get_stats()[&Domain::Entities].size, 1);
    }
}
