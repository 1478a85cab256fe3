use std::sync::Arc;

use crate::async_result::AsyncResult;

/// A level of a cache: anything that can look values up by key, and optionally store them.
///
/// Backends (memory, disk, network, ...) implement this trait, and so does every decorator in this
/// crate, which is what makes them freely composable.
///
/// No method blocks. [`get`](Self::get) hands out an [`AsyncResult`] right away, and the actual
/// work is done by the backend, which must settle every result it returns exactly once.
pub trait CacheLevel: Send + Sync {
    /// The key type this level is looked up with.
    type Key;
    /// The value type this level produces.
    type Value: Clone + Send + 'static;

    /// Looks up the value for `key`.
    ///
    /// The result fails with [`CacheError::NotFound`](crate::CacheError::NotFound) if there is no
    /// value, or with a backend specific error.
    fn get(&self, key: &Self::Key) -> AsyncResult<Self::Value>;

    /// Stores `value` under `key`.
    ///
    /// This is fire-and-forget. Failures are handled by the level itself and never reported.
    fn set(&self, value: Self::Value, key: &Self::Key);

    /// Drops all entries of this level.
    fn clear(&self);

    /// Asks the level to release whatever state it can rebuild later.
    ///
    /// This is invoked by the host, for example on memory pressure. Decorators forward it.
    fn on_clear_signal(&self);
}

impl<L: CacheLevel + ?Sized> CacheLevel for Arc<L> {
    type Key = L::Key;
    type Value = L::Value;

    fn get(&self, key: &Self::Key) -> AsyncResult<Self::Value> {
        (**self).get(key)
    }

    fn set(&self, value: Self::Value, key: &Self::Key) {
        (**self).set(value, key)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn on_clear_signal(&self) {
        (**self).on_clear_signal()
    }
}

impl<L: CacheLevel + ?Sized> CacheLevel for Box<L> {
    type Key = L::Key;
    type Value = L::Value;

    fn get(&self, key: &Self::Key) -> AsyncResult<Self::Value> {
        (**self).get(key)
    }

    fn set(&self, value: Self::Value, key: &Self::Key) {
        (**self).set(value, key)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn on_clear_signal(&self) {
        (**self).on_clear_signal()
    }
}
