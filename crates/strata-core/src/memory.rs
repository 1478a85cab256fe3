use std::fmt;
use std::hash::Hash;

use crate::async_result::AsyncResult;
use crate::config::MemoryCacheConfig;
use crate::error::CacheError;
use crate::level::CacheLevel;

/// An in-memory cache level.
///
/// Capacity and expiration are delegated to [`moka`]. Both [`clear`](CacheLevel::clear) and
/// [`on_clear_signal`](CacheLevel::on_clear_signal) drop every entry.
pub struct MemoryCacheLevel<K, V> {
    cache: moka::sync::Cache<K, V>,
}

impl<K, V> MemoryCacheLevel<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let mut builder = moka::sync::Cache::builder().max_capacity(config.capacity);
        if let Some(time_to_live) = config.time_to_live {
            builder = builder.time_to_live(time_to_live);
        }

        Self {
            cache: builder.build(),
        }
    }

    /// The approximate number of entries.
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl<K, V> CacheLevel for MemoryCacheLevel<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Key = K;
    type Value = V;

    fn get(&self, key: &K) -> AsyncResult<V> {
        match self.cache.get(key) {
            Some(value) => AsyncResult::succeeded(value),
            None => AsyncResult::failed(CacheError::NotFound),
        }
    }

    fn set(&self, value: V, key: &K) {
        self.cache.insert(key.clone(), value);
    }

    fn clear(&self) {
        self.cache.invalidate_all();
    }

    fn on_clear_signal(&self) {
        tracing::debug!(
            entries = self.cache.entry_count(),
            "Dropping in-memory entries on clear signal"
        );
        self.cache.invalidate_all();
    }
}

impl<K, V> fmt::Debug for MemoryCacheLevel<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCacheLevel")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}
