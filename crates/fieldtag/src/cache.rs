//! Copy-on-write snapshot cache
//!
//! Readers load the current snapshot through [`ArcSwap`] and never block.
//! A writer that misses takes the writer lock, re-checks the snapshot,
//! builds the entry, and publishes `old snapshot + entry` as a new map.
//! Entries are write-once: they are added, never modified.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

/// Read-mostly memoization map with lock-free reads.
pub struct SnapshotCache<K, V> {
    snapshot: ArcSwap<HashMap<K, V>>,
    writer: Mutex<()>,
}

impl<K, V> SnapshotCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
            writer: Mutex::new(()),
        }
    }

    /// Returns the cached value for `key`, if any.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.snapshot.load().get(key).cloned()
    }

    /// Returns the cached value for `key`, building and publishing it on a miss.
    ///
    /// `build` runs at most once per key across racing writers; an error is
    /// returned to the caller and nothing is cached.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let _guard = self.writer.lock();
        let current = self.snapshot.load_full();
        if let Some(value) = current.get(key) {
            return Ok(value.clone());
        }

        let value = build()?;
        let mut next = HashMap::with_capacity(current.len() + 1);
        next.extend(current.iter().map(|(k, v)| (k.clone(), v.clone())));
        next.insert(key.clone(), value.clone());
        self.snapshot.store(Arc::new(next));
        Ok(value)
    }

    /// Publishes a snapshot without the entries rejected by `keep`.
    pub fn retain(&self, mut keep: impl FnMut(&K) -> bool) {
        let _guard = self.writer.lock();
        let current = self.snapshot.load_full();
        let next: HashMap<K, V> = current
            .iter()
            .filter(|(k, _)| keep(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.snapshot.store(Arc::new(next));
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for SnapshotCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
