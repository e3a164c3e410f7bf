//! The live key set.
//!
//! Holds the latest wrapper for every entity and link the pipeline has seen
//! and not yet deleted. Watch-driven dispatch writes it; keepalive ticks
//! snapshot it.

use std::collections::HashMap;
use std::sync::Arc;

use kube_topology_core::TopologyKey;
use parking_lot::RwLock;

use crate::object::{LinkWrapper, ObjectWrapper};

/// The latest observed state of one key.
#[derive(Debug, Clone)]
pub enum CachedObject {
    /// An entity and its window.
    Entity(ObjectWrapper),
    /// A link and its window.
    Link(LinkWrapper),
}

impl CachedObject {
    /// Key this entry is stored under.
    #[must_use]
    pub fn key(&self) -> TopologyKey {
        match self {
            Self::Entity(wrapper) => wrapper.key().into(),
            Self::Link(wrapper) => wrapper.key().into(),
        }
    }

    /// The entry with its window extended to `now`.
    #[must_use]
    pub fn refreshed(&self, now: i64) -> Self {
        match self {
            Self::Entity(wrapper) => Self::Entity(wrapper.refreshed(now)),
            Self::Link(wrapper) => Self::Link(wrapper.refreshed(now)),
        }
    }
}

/// Key → latest entry.
///
/// Readers run concurrently with each other. Each entry is swapped in whole,
/// so a reader sees either the previous entry or the new one.
#[derive(Debug, Default)]
pub struct TopologyCache {
    entries: RwLock<HashMap<TopologyKey, Arc<CachedObject>>>,
}

impl TopologyCache {
    /// Create a new empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the entry for a key, if cached.
    #[must_use]
    pub fn get(&self, key: &TopologyKey) -> Option<Arc<CachedObject>> {
        self.entries.read().get(key).cloned()
    }

    /// Insert or replace the entry for its key.
    pub fn insert(&self, entry: CachedObject) {
        let key = entry.key();
        self.entries.write().insert(key, Arc::new(entry));
    }

    /// Remove a key from the cache.
    pub fn remove(&self, key: &TopologyKey) -> Option<Arc<CachedObject>> {
        self.entries.write().remove(key)
    }

    /// Check if a key is cached.
    #[must_use]
    pub fn contains(&self, key: &TopologyKey) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Get the number of cached keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Get all cached keys.
    #[must_use]
    pub fn keys(&self) -> Vec<TopologyKey> {
        self.entries.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::fixtures::{node, pod};
    use crate::object::JoinedPair;
    use kube_topology_core::ObservedWindow;

    fn pod_entry(name: &str, last: i64) -> CachedObject {
        CachedObject::Entity(ObjectWrapper::new(
            pod("default", name),
            ObservedWindow::new(0, last),
        ))
    }

    #[test]
    fn cache_insert_and_get() {
        let cache = TopologyCache::new();
        let entry = pod_entry("web-0", 10);
        let key = entry.key();

        assert!(cache.get(&key).is_none());
        assert!(!cache.contains(&key));

        cache.insert(entry);

        assert!(cache.contains(&key));
        assert_eq!(cache.get(&key).unwrap().key(), key);
    }

    #[test]
    fn cache_update_replaces_entry() {
        let cache = TopologyCache::new();
        cache.insert(pod_entry("web-0", 10));
        cache.insert(pod_entry("web-0", 20));

        assert_eq!(cache.len(), 1);
        let key = pod_entry("web-0", 0).key();
        match cache.get(&key).as_deref() {
            Some(CachedObject::Entity(wrapper)) => assert_eq!(wrapper.window.last(), 20),
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn cache_remove() {
        let cache = TopologyCache::new();
        let entry = pod_entry("web-0", 10);
        let key = entry.key();
        cache.insert(entry);

        assert!(cache.remove(&key).is_some());
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn entities_and_links_share_the_key_space() {
        let cache = TopologyCache::new();
        cache.insert(pod_entry("web-0", 10));
        cache.insert(CachedObject::Link(LinkWrapper::new(
            JoinedPair::PodNode {
                pod: pod("default", "web-0"),
                node: node("node-1"),
            },
            ObservedWindow::at(10),
        )));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.keys().len(), 2);
        let links = cache
            .keys()
            .into_iter()
            .filter(|key| matches!(key, TopologyKey::Link(_)))
            .count();
        assert_eq!(links, 1);
    }
}
