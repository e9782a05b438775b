//! Ticket Cache - composition root
//!
//! Builds the cache from environment configuration, runs a short
//! read-through session against a stand-in ticket source and prints the
//! resulting statistics as JSON.

use std::sync::Arc;

use anyhow::Context;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticket_cache::{CacheConfig, TicketCache};

/// Stand-in for the remote ticketing API.
fn fetch_ticket(id: u64) -> Value {
    json!({ "id": id, "subject": format!("Ticket #{}", id), "status": "open" })
}

/// Read-through lookup, the way a consumer of the cache uses it.
fn ticket(cache: &TicketCache<Value>, id: u64) -> Value {
    let key = format!("ticket:{}", id);
    if let Some(cached) = cache.get_entity(&key, None) {
        return cached;
    }
    let fresh = fetch_ticket(id);
    cache.set_entity(key, fresh.clone());
    fresh
}

fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticket_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: collections={}s/{}, entities={}s/{}, principals={}s/{}, lock={:?}",
        config.collections.ttl_seconds,
        config.collections.max_size,
        config.entities.ttl_seconds,
        config.entities.max_size,
        config.principals.ttl_seconds,
        config.principals.max_size,
        config.lock_strategy,
    );

    let cache = Arc::new(TicketCache::<Value>::new(config).with_empty_collection_guard());
    cache
        .add_entities_invalidation_pattern(r"^ticket:\d+$", None)
        .context("registering ticket pattern")?;

    for id in [1, 2, 1, 3, 2, 1] {
        ticket(&cache, id);
    }

    let open: Vec<Value> = (1..=3).map(|id| ticket(&cache, id)).collect();
    cache.set_collection("status:open", Value::Array(open));
    cache.set_collection("status:closed", json!([]));
    cache.get_collection("status:open", None);
    cache.get_collection("status:closed", None);

    let removed = cache.invalidate_entity("ticket:2");
    info!(removed, "Ticket 2 changed upstream");

    let stats = serde_json::to_string_pretty(&cache.get_stats()).context("serializing stats")?;
    println!("{}", stats);
    Ok(())
}
