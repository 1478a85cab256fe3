use crate::async_result::AsyncResult;
use crate::error::CacheError;
use crate::level::CacheLevel;

/// Only lets lookups through for keys accepted by a condition.
///
/// Rejected lookups fail with [`CacheError::ConditionNotSatisfied`] without reaching the wrapped
/// level. Writes, clears and clear signals are not affected by the condition.
pub struct ConditionedCacheLevel<L, F> {
    inner: L,
    condition: F,
}

impl<L, F> ConditionedCacheLevel<L, F>
where
    L: CacheLevel,
    F: Fn(&L::Key) -> bool + Send + Sync,
{
    pub fn new(inner: L, condition: F) -> Self {
        Self { inner, condition }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L, F> CacheLevel for ConditionedCacheLevel<L, F>
where
    L: CacheLevel,
    F: Fn(&L::Key) -> bool + Send + Sync,
{
    type Key = L::Key;
    type Value = L::Value;

    fn get(&self, key: &Self::Key) -> AsyncResult<Self::Value> {
        if (self.condition)(key) {
            self.inner.get(key)
        } else {
            AsyncResult::failed(CacheError::ConditionNotSatisfied)
        }
    }

    fn set(&self, value: Self::Value, key: &Self::Key) {
        self.inner.set(value, key)
    }

    fn clear(&self) {
        self.inner.clear()
    }

    fn on_clear_signal(&self) {
        self.inner.on_clear_signal()
    }
}
