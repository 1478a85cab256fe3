use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::async_result::AsyncResult;
use crate::error::CacheError;
use crate::level::CacheLevel;

struct InFlight<V> {
    /// Distinguishes this fetch from later fetches for the same key.
    generation: u64,
    result: AsyncResult<V>,
}

struct Registry<K, V> {
    next_generation: u64,
    in_flight: HashMap<K, InFlight<V>>,
}

type SharedRegistry<K, V> = Arc<Mutex<Registry<K, V>>>;

fn lock<K, V>(registry: &Mutex<Registry<K, V>>) -> MutexGuard<'_, Registry<K, V>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fails a newly registered lookup when dropped, unless it was disarmed.
///
/// Held across the call into the wrapped level, so a panic there abandons the lookup and evicts it
/// from the registry instead of leaving the key in flight forever.
struct AbandonOnDrop<V: Clone + Send + 'static> {
    result: Option<AsyncResult<V>>,
}

impl<V: Clone + Send + 'static> AbandonOnDrop<V> {
    fn new(result: AsyncResult<V>) -> Self {
        Self {
            result: Some(result),
        }
    }

    fn disarm(mut self) {
        self.result = None;
    }
}

impl<V: Clone + Send + 'static> Drop for AbandonOnDrop<V> {
    fn drop(&mut self) {
        if let Some(result) = self.result.take() {
            tracing::error!("Wrapped level panicked while starting a pooled lookup");
            result.fail(CacheError::Abandoned);
        }
    }
}

/// Deduplicates concurrent lookups of the same key.
///
/// While a lookup for a key is in flight, every further [`get`](CacheLevel::get) for that key
/// returns the very same [`AsyncResult`] instead of asking the wrapped level again. Once the
/// lookup settles, its entry is evicted and the next `get` starts a fresh one.
///
/// Writes, clears and clear signals are forwarded to the wrapped level unchanged.
pub struct PoolingCacheLevel<L: CacheLevel> {
    inner: L,

    /// Used for deduplicating lookups.
    registry: SharedRegistry<L::Key, L::Value>,
}

impl<L> PoolingCacheLevel<L>
where
    L: CacheLevel,
    L::Key: Clone + Eq + Hash + Send + 'static,
{
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            registry: Arc::new(Mutex::new(Registry {
                next_generation: 0,
                in_flight: HashMap::new(),
            })),
        }
    }

    /// Returns a reference to the wrapped level.
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// The number of lookups currently in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.registry).in_flight.len()
    }

    /// Returns the pending result for `key`, or registers a new one.
    ///
    /// The returned flag is `true` if the result was newly registered, in which case the caller
    /// is responsible for settling it.
    fn join_or_register(&self, key: &L::Key) -> (AsyncResult<L::Value>, bool) {
        let mut registry = lock(&self.registry);
        if let Some(in_flight) = registry.in_flight.get(key) {
            tracing::trace!("Deduplicated a concurrent lookup");
            return (in_flight.result.clone(), false);
        }

        let generation = registry.next_generation;
        registry.next_generation = generation.wrapping_add(1);

        let result = AsyncResult::new();

        // This observer is registered before anyone else gets to see the result. Evicting first
        // ensures that callers either get a result that will still be settled, or they start a
        // new lookup.
        let weak_registry: Weak<_> = Arc::downgrade(&self.registry);
        let evicted_key = key.clone();
        result.on_completion(move |_| {
            let Some(registry) = weak_registry.upgrade() else {
                return;
            };
            let mut registry = lock(&registry);
            let is_current = registry
                .in_flight
                .get(&evicted_key)
                .is_some_and(|in_flight| in_flight.generation == generation);
            if is_current {
                registry.in_flight.remove(&evicted_key);
            }
        });

        registry.in_flight.insert(
            key.clone(),
            InFlight {
                generation,
                result: result.clone(),
            },
        );
        tracing::debug!(
            generation,
            in_flight = registry.in_flight.len(),
            "Starting a new pooled lookup"
        );

        (result, true)
    }
}

impl<L> CacheLevel for PoolingCacheLevel<L>
where
    L: CacheLevel,
    L::Key: Clone + Eq + Hash + Send + 'static,
{
    type Key = L::Key;
    type Value = L::Value;

    fn get(&self, key: &Self::Key) -> AsyncResult<Self::Value> {
        let (result, is_new) = self.join_or_register(key);
        if is_new {
            // The registry lock is released at this point, so the wrapped level is free to call
            // back into this one.
            let guard = AbandonOnDrop::new(result.clone());
            result.mimic(&self.inner.get(key));
            guard.disarm();
        }
        result
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

impl<L> fmt::Debug for PoolingCacheLevel<L>
where
    L: CacheLevel + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_flight = self
            .registry
            .try_lock()
            .map(|r| r.in_flight.len())
            .unwrap_or_default();
        f.debug_struct("PoolingCacheLevel")
            .field("inner", &self.inner)
            .field("in_flight", &in_flight)
            .finish()
    }
}
