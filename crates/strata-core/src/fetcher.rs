//! Adapters turning plain fetch functions into cache levels.
//!
//! A fetcher only knows how to look values up. Writes, clears and clear signals are ignored. This
//! allows a bare function to be pooled, transformed, or used as the last level of a composite
//! cache, just like any other level.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use tokio::runtime::Handle;

use crate::async_result::AsyncResult;
use crate::error::{CacheEntry, CacheError};
use crate::level::CacheLevel;

/// A cache level backed by a function returning an [`AsyncResult`]. Created by [`fetcher`].
pub struct FetcherLevel<F, K, V> {
    fetch: F,
    _marker: PhantomData<fn(&K) -> V>,
}

/// Wraps a function as a read-only cache level.
pub fn fetcher<K, V, F>(fetch: F) -> FetcherLevel<F, K, V>
where
    F: Fn(&K) -> AsyncResult<V> + Send + Sync,
    V: Clone + Send + 'static,
{
    FetcherLevel {
        fetch,
        _marker: PhantomData,
    }
}

impl<F, K, V> CacheLevel for FetcherLevel<F, K, V>
where
    F: Fn(&K) -> AsyncResult<V> + Send + Sync,
    V: Clone + Send + 'static,
{
    type Key = K;
    type Value = V;

    fn get(&self, key: &K) -> AsyncResult<V> {
        (self.fetch)(key)
    }

    fn set(&self, _value: V, _key: &K) {}

    fn clear(&self) {}

    fn on_clear_signal(&self) {}
}

impl<F, K, V> fmt::Debug for FetcherLevel<F, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherLevel").finish_non_exhaustive()
    }
}

/// A cache level backed by an `async` function.
///
/// Every lookup is spawned as a separate task, so it makes progress even if the returned
/// [`AsyncResult`] is never awaited. Created by [`async_fetcher`].
pub struct AsyncFetcherLevel<F, K, V> {
    fetch: F,
    handle: Option<Handle>,
    _marker: PhantomData<fn(K) -> V>,
}

/// Wraps an `async` function as a read-only cache level.
///
/// Lookups are spawned on the tokio runtime the lookup is made from. Use
/// [`AsyncFetcherLevel::with_handle`] to pin them to a specific runtime instead.
pub fn async_fetcher<K, V, F, Fut>(fetch: F) -> AsyncFetcherLevel<F, K, V>
where
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = CacheEntry<V>> + Send + 'static,
    K: Clone,
    V: Clone + Send + 'static,
{
    AsyncFetcherLevel {
        fetch,
        handle: None,
        _marker: PhantomData,
    }
}

impl<F, K, V> AsyncFetcherLevel<F, K, V> {
    /// Spawns all lookups on the runtime behind `handle`.
    pub fn with_handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }
}

impl<F, K, V, Fut> CacheLevel for AsyncFetcherLevel<F, K, V>
where
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = CacheEntry<V>> + Send + 'static,
    K: Clone,
    V: Clone + Send + 'static,
{
    type Key = K;
    type Value = V;

    fn get(&self, key: &K) -> AsyncResult<V> {
        let handle = match self.handle.clone().map_or_else(Handle::try_current, Ok) {
            Ok(handle) => handle,
            Err(err) => {
                tracing::error!(
                    error = &err as &dyn std::error::Error,
                    "Cannot spawn lookup outside of a tokio runtime"
                );
                return AsyncResult::failed(CacheError::backend(err));
            }
        };

        let result = AsyncResult::new();
        let settler = result.clone();
        let fetch = (self.fetch)(key.clone());
        handle.spawn(async move {
            settler.settle(fetch.await);
        });

        result
    }

    fn set(&self, _value: V, _key: &K) {}

    fn clear(&self) {}

    fn on_clear_signal(&self) {}
}

impl<F, K, V> fmt::Debug for AsyncFetcherLevel<F, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFetcherLevel")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
