use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use strata_core::{CacheEntry, CacheLevel, async_fetcher};

/// A slow origin, standing in for a remote service.
#[derive(Debug)]
pub struct Origin {
    delay: Duration,
    fetches: AtomicUsize,
}

impl Origin {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            fetches: AtomicUsize::new(0),
        })
    }

    /// The number of lookups that reached the origin.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    async fn fetch(&self, key: u64) -> CacheEntry<u64> {
        let fetch = self.fetches.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(key, fetch, "Fetching from origin");

        tokio::time::sleep(self.delay).await;
        Ok(key + 89)
    }

    /// Exposes the origin as a read-only cache level.
    pub fn level(self: &Arc<Self>) -> impl CacheLevel<Key = u64, Value = u64> + 'static {
        let origin = Arc::clone(self);
        async_fetcher(move |key: u64| {
            let origin = Arc::clone(&origin);
            async move { origin.fetch(key).await }
        })
    }
}
