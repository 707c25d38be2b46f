use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// A keyed set of independently locked entities.
///
/// The map lock is only held long enough to clone an entry's `Arc`, so work on
/// one entity never blocks lookups of another.
#[derive(Debug)]
pub struct Registry<K, T> {
    entries: RwLock<HashMap<K, Arc<Mutex<T>>>>,
}

impl<K, T> Default for Registry<K, T> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, T> Registry<K, T>
where
    K: Eq + Hash + Clone + Ord,
{
    /// Inserts `value` unless `key` is taken. Returns false if it was.
    pub async fn try_insert(&self, key: K, value: T) -> bool {
        let mut entries = self.entries.write().await;
        if entries.contains_key(&key) {
            return false;
        }
        entries.insert(key, Arc::new(Mutex::new(value)));
        true
    }

    pub async fn get(&self, key: &K) -> Option<Arc<Mutex<T>>> {
        self.entries.read().await.get(key).cloned()
    }

    /// All entries, sorted by key so callers that lock several entities
    /// always do so in the same order.
    pub async fn entries(&self) -> Vec<(K, Arc<Mutex<T>>)> {
        let mut all: Vec<_> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
