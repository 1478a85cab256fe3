use std::hash::Hash;

use crate::async_result::AsyncResult;
use crate::batch;
use crate::composite::CompositeCacheLevel;
use crate::conditioned::ConditionedCacheLevel;
use crate::key_transform::KeyTransformingCacheLevel;
use crate::level::CacheLevel;
use crate::pooling::PoolingCacheLevel;
use crate::transformer::{OneWayTransformer, TwoWayTransformer};
use crate::value_transform::ValueTransformingCacheLevel;

/// Builder methods for wrapping cache levels into decorators.
///
/// Implemented for every [`CacheLevel`]. Pipelines are built starting from the innermost level:
///
/// ```
/// use strata_core::{AsyncResult, CacheLevel, CacheLevelExt, MemoryCacheLevel, StringTransformer, fetcher};
///
/// let origin = fetcher(|key: &String| AsyncResult::succeeded(key.len()));
/// let cache = MemoryCacheLevel::new(&Default::default())
///     .compose(origin)
///     .transform_keys(StringTransformer::<u64>::new())
///     .pooled();
///
/// assert_eq!(cache.get(&1234).outcome().unwrap().unwrap(), 4);
/// ```
pub trait CacheLevelExt: CacheLevel + Sized {
    /// Deduplicates concurrent lookups of the same key. See [`PoolingCacheLevel`].
    fn pooled(self) -> PoolingCacheLevel<Self>
    where
        Self::Key: Clone + Eq + Hash + Send + 'static,
    {
        PoolingCacheLevel::new(self)
    }

    /// Converts keys before they reach this level. See [`KeyTransformingCacheLevel`].
    fn transform_keys<T>(self, transformer: T) -> KeyTransformingCacheLevel<Self, T>
    where
        T: OneWayTransformer<Output = Self::Key>,
    {
        KeyTransformingCacheLevel::new(self, transformer)
    }

    /// Converts values going in and out of this level. See [`ValueTransformingCacheLevel`].
    fn transform_values<T>(self, transformer: T) -> ValueTransformingCacheLevel<Self, T>
    where
        T: TwoWayTransformer<Input = Self::Value> + 'static,
        T::Output: Clone + Send + 'static,
    {
        ValueTransformingCacheLevel::new(self, transformer)
    }

    /// Falls back to `second` when this level misses. See [`CompositeCacheLevel`].
    fn compose<B>(self, second: B) -> CompositeCacheLevel<Self, B>
    where
        Self: 'static,
        B: CacheLevel<Key = Self::Key, Value = Self::Value> + 'static,
        Self::Key: Clone + Send + 'static,
    {
        CompositeCacheLevel::new(self, second)
    }

    /// Only looks up keys accepted by `condition`. See [`ConditionedCacheLevel`].
    fn conditioned<F>(self, condition: F) -> ConditionedCacheLevel<Self, F>
    where
        F: Fn(&Self::Key) -> bool + Send + Sync,
    {
        ConditionedCacheLevel::new(self, condition)
    }

    /// Looks up all `keys` at once. See [`get_all`](batch::get_all).
    fn get_all(&self, keys: &[Self::Key]) -> AsyncResult<Vec<Self::Value>> {
        batch::get_all(self, keys)
    }
}

impl<L: CacheLevel> CacheLevelExt for L {}
