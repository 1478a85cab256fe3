use std::sync::Arc;

use crate::async_result::AsyncResult;
use crate::level::CacheLevel;

/// Two cache levels stacked on top of each other.
///
/// Lookups go to `first`, and fall back to `second` if `first` fails for any reason. A value
/// found in `second` is written back into `first` before the lookup succeeds. If both levels
/// fail, the lookup fails with the error of `second`.
///
/// Writes, clears and clear signals go to both levels.
#[derive(Debug)]
pub struct CompositeCacheLevel<A, B> {
    first: Arc<A>,
    second: Arc<B>,
}

impl<A, B> CompositeCacheLevel<A, B>
where
    A: CacheLevel + 'static,
    B: CacheLevel<Key = A::Key, Value = A::Value> + 'static,
    A::Key: Clone + Send + 'static,
{
    pub fn new(first: A, second: B) -> Self {
        Self {
            first: Arc::new(first),
            second: Arc::new(second),
        }
    }

    /// The level that is consulted first.
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The level that is consulted when `first` misses.
    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A, B> CacheLevel for CompositeCacheLevel<A, B>
where
    A: CacheLevel + 'static,
    B: CacheLevel<Key = A::Key, Value = A::Value> + 'static,
    A::Key: Clone + Send + 'static,
{
    type Key = A::Key;
    type Value = A::Value;

    fn get(&self, key: &Self::Key) -> AsyncResult<Self::Value> {
        let result = AsyncResult::new();
        let lookup = self.first.get(key);

        let first = Arc::clone(&self.first);
        let second = Arc::clone(&self.second);
        let key = key.clone();
        let settler = result.clone();
        lookup.on_completion(move |outcome| match outcome {
            Ok(value) => {
                settler.succeed(value);
            }
            Err(err) => {
                tracing::trace!(error = %err, "First level missed, trying the second one");
                second.get(&key).on_completion(move |outcome| {
                    if let Ok(value) = &outcome {
                        first.set(value.clone(), &key);
                    }
                    settler.settle(outcome);
                });
            }
        });

        result
    }

    fn set(&self, value: Self::Value, key: &Self::Key) {
        self.first.set(value.clone(), key);
        self.second.set(value, key);
    }

    fn clear(&self) {
        self.first.clear();
        self.second.clear();
    }

    fn on_clear_signal(&self) {
        self.first.on_clear_signal();
        self.second.on_clear_signal();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::CacheError;

    #[derive(Default)]
    struct MapLevel {
        values: Mutex<HashMap<u32, String>>,
        gets: AtomicUsize,
        signals: AtomicUsize,
    }

    impl MapLevel {
        fn with(values: &[(u32, &str)]) -> Self {
            let level = Self::default();
            for (k, v) in values {
                level.set(v.to_string(), k);
            }
            level
        }

        fn value(&self, key: u32) -> Option<String> {
            self.values.lock().unwrap().get(&key).cloned()
        }
    }

    impl CacheLevel for MapLevel {
        type Key = u32;
        type Value = String;

        fn get(&self, key: &u32) -> AsyncResult<String> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            match self.value(*key) {
                Some(value) => AsyncResult::succeeded(value),
                None => AsyncResult::failed(CacheError::NotFound),
            }
        }

        fn set(&self, value: String, key: &u32) {
            self.values.lock().unwrap().insert(*key, value);
        }

        fn clear(&self) {
            self.values.lock().unwrap().clear();
        }

        fn on_clear_signal(&self) {
            self.signals.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_hit_in_first_level() {
        let level = CompositeCacheLevel::new(MapLevel::with(&[(1, "one")]), MapLevel::default());

        assert_eq!(level.get(&1).outcome().unwrap().unwrap(), "one");
        assert_eq!(level.second().gets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fallback_writes_back() {
        let level = CompositeCacheLevel::new(MapLevel::default(), MapLevel::with(&[(2, "two")]));

        assert_eq!(level.get(&2).outcome().unwrap().unwrap(), "two");
        assert_eq!(level.first().value(2).as_deref(), Some("two"));

        // Served from the first level now.
        assert_eq!(level.get(&2).outcome().unwrap().unwrap(), "two");
        assert_eq!(level.second().gets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_miss_in_both_levels() {
        let level = CompositeCacheLevel::new(MapLevel::default(), MapLevel::default());

        assert!(matches!(
            level.get(&3).outcome().unwrap(),
            Err(CacheError::NotFound)
        ));
        assert_eq!(level.first().value(3), None);
    }

    #[test]
    fn test_set_clear_and_signal_reach_both_levels() {
        let level = CompositeCacheLevel::new(MapLevel::default(), MapLevel::default());

        level.set("four".to_owned(), &4);
        assert_eq!(level.first().value(4).as_deref(), Some("four"));
        assert_eq!(level.second().value(4).as_deref(), Some("four"));

        level.on_clear_signal();
        assert_eq!(level.first().signals.load(Ordering::SeqCst), 1);
        assert_eq!(level.second().signals.load(Ordering::SeqCst), 1);

        level.clear();
        assert_eq!(level.first().value(4), None);
        assert_eq!(level.second().value(4), None);
    }
}
