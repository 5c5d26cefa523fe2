use indexmap::IndexMap;
use parking_lot::RwLock;
use rand::Rng;
use std::{hash::Hash, sync::Arc};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CachePolicy {
    /// Caching is disabled
    Empty,
    /// Holds at most this number of entries, evicting at random once full
    Count(usize),
}

/// A shared, size bounded read cache sitting in front of a store prefix
#[derive(Clone)]
pub struct Cache<TKey, TData>
where
    TKey: Clone + Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    // IndexMap makes evicting a random entry O(1)
    map: Arc<RwLock<IndexMap<TKey, TData>>>,
    capacity: usize,
}

impl<TKey, TData> Cache<TKey, TData>
where
    TKey: Clone + Hash + Eq + Send + Sync,
    TData: Clone + Send + Sync,
{
    pub fn new(policy: CachePolicy) -> Self {
        let capacity = match policy {
            CachePolicy::Empty => 0,
            CachePolicy::Count(size) => size,
        };
        Self { map: Arc::new(RwLock::new(IndexMap::with_capacity(capacity + 1))), capacity }
    }

    pub fn get(&self, key: &TKey) -> Option<TData> {
        self.map.read().get(key).cloned()
    }

    pub fn insert(&self, key: TKey, data: TData) {
        if self.capacity == 0 {
            return;
        }
        let mut map = self.map.write();
        if map.len() == self.capacity && !map.contains_key(&key) {
            map.swap_remove_index(rand::thread_rng().gen_range(0..self.capacity));
        }
        map.insert(key, data);
    }

    pub fn remove(&self, key: &TKey) -> Option<TData> {
        if self.capacity == 0 {
            return None;
        }
        self.map.write().swap_remove(key)
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
