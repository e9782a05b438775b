//! Miss Policy Module
//!
//! Per-domain predicates that turn a stored value into a miss on read.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// Predicate deciding whether a cached value should be reported as a miss.
pub type MissPolicy<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;

// == Empty Collection ==
/// Values that can be an empty collection.
///
/// Strings are not collections here: an empty string is a real value.
pub trait IsEmptyCollection {
    fn is_empty_collection(&self) -> bool;
}

impl<T> IsEmptyCollection for Vec<T> {
    fn is_empty_collection(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmptyCollection for VecDeque<T> {
    fn is_empty_collection(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S> IsEmptyCollection for HashMap<K, V, S> {
    fn is_empty_collection(&self) -> bool {
        self.is_empty()
    }
}

impl<T, S> IsEmptyCollection for HashSet<T, S> {
    fn is_empty_collection(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> IsEmptyCollection for BTreeMap<K, V> {
    fn is_empty_collection(&self) -> bool {
        self.is_empty()
    }
}

impl<T> IsEmptyCollection for BTreeSet<T> {
    fn is_empty_collection(&self) -> bool {
        self.is_empty()
    }
}

impl<T: IsEmptyCollection + ?Sized> IsEmptyCollection for Arc<T> {
    fn is_empty_collection(&self) -> bool {
        (**self).is_empty_collection()
    }
}

impl IsEmptyCollection for serde_json::Value {
    fn is_empty_collection(&self) -> bool {
        match self {
            serde_json::Value::Array(items) => items.is_empty(),
            serde_json::Value::Object(fields) => fields.is_empty(),
            _ => false,
        }
    }
}

/// Miss policy that rejects empty collections.
pub fn empty_collection_policy<V>() -> MissPolicy<V>
where
    V: IsEmptyCollection + 'static,
{
    Arc::new(|value: &V| value.is_empty_collection())
}
