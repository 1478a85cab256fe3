use std::sync::Arc;

use crate::async_result::AsyncResult;
use crate::error::CacheError;
use crate::level::CacheLevel;
use crate::transformer::TwoWayTransformer;

/// Presents a cache level under a different value type.
///
/// Values coming out of the wrapped level are converted forward, and a value that fails to
/// convert fails the lookup with [`CacheError::ValueTransformationFailed`]. Values being written
/// are converted back, and dropped if that fails.
#[derive(Debug)]
pub struct ValueTransformingCacheLevel<L, T> {
    inner: L,
    transformer: Arc<T>,
}

impl<L, T> ValueTransformingCacheLevel<L, T>
where
    L: CacheLevel,
    T: TwoWayTransformer<Input = L::Value> + 'static,
    T::Output: Clone + Send + 'static,
{
    pub fn new(inner: L, transformer: T) -> Self {
        Self {
            inner,
            transformer: Arc::new(transformer),
        }
    }

    /// Returns a reference to the wrapped level.
    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L, T> CacheLevel for ValueTransformingCacheLevel<L, T>
where
    L: CacheLevel,
    T: TwoWayTransformer<Input = L::Value> + 'static,
    T::Output: Clone + Send + 'static,
{
    type Key = L::Key;
    type Value = T::Output;

    fn get(&self, key: &Self::Key) -> AsyncResult<Self::Value> {
        let transformer = Arc::clone(&self.transformer);
        self.inner.get(key).try_map(move |value| {
            transformer
                .transform(&value)
                .ok_or(CacheError::ValueTransformationFailed)
        })
    }

    fn set(&self, value: Self::Value, key: &Self::Key) {
        match self.transformer.inverse_transform(&value) {
            Some(value) => self.inner.set(value, key),
            None => tracing::trace!("Dropping write for a value that failed to transform"),
        }
    }

    fn clear(&self) {
        self.inner.clear()
    }

    fn on_clear_signal(&self) {
        self.inner.on_clear_signal()
    }
}
