use crate::async_result::AsyncResult;
use crate::error::CacheError;
use crate::level::CacheLevel;
use crate::transformer::OneWayTransformer;

/// Presents a cache level under a different key type.
///
/// Keys are converted with a [`OneWayTransformer`] before being handed to the wrapped level. A key
/// that cannot be converted fails the lookup with [`CacheError::KeyTransformationFailed`], and
/// writes under such a key are dropped.
#[derive(Debug)]
pub struct KeyTransformingCacheLevel<L, T> {
    inner: L,
    transformer: T,
}

impl<L, T> KeyTransformingCacheLevel<L, T>
where
    L: CacheLevel,
    T: OneWayTransformer<Output = L::Key>,
{
    pub fn new(inner: L, transformer: T) -> Self {
        Self { inner, transformer }
    }

    /// Returns a reference to the wrapped level.
    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L, T> CacheLevel for KeyTransformingCacheLevel<L, T>
where
    L: CacheLevel,
    T: OneWayTransformer<Output = L::Key>,
{
    type Key = T::Input;
    type Value = L::Value;

    fn get(&self, key: &Self::Key) -> AsyncResult<Self::Value> {
        match self.transformer.transform(key) {
            Some(key) => self.inner.get(&key),
            None => AsyncResult::failed(CacheError::KeyTransformationFailed),
        }
    }

    fn set(&self, value: Self::Value, key: &Self::Key) {
        match self.transformer.transform(key) {
            Some(key) => self.inner.set(value, &key),
            None => tracing::trace!("Dropping write for a key that failed to transform"),
        }
    }

    fn clear(&self) {
        self.inner.clear()
    }

    fn on_clear_signal(&self) {
        self.inner.on_clear_signal()
    }
}
