//! Helpers for testing cache levels.
//!
//! When writing tests, keep the following points in mind:
//!
//!  - In every test, call [`setup`]. This will set up the logger so that all console output
//!    is captured by the test runner.
//!
//!  - A [`CountingLevel`] configured [`with_delay`](CountingLevel::with_delay) settles its
//!    lookups from a spawned tokio task, so it must be used from within a tokio runtime.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use strata_core::{AsyncResult, CacheError, CacheLevel};
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::fmt;

/// Setup the test environment.
///
///  - Initializes logs: The logger only captures logs from the `strata_core` crate and mutes all
///    other logs.
pub fn setup() {
    fmt()
        .with_env_filter(EnvFilter::new("strata_core=trace"))
        .with_target(false)
        .pretty()
        .with_test_writer()
        .try_init()
        .ok();
}

/// A backend that records every call made to it.
///
/// Lookups are answered from the values it holds, or fail with [`CacheError::NotFound`]. Writes
/// are recorded and stored, so later lookups see them.
pub struct CountingLevel<K, V> {
    values: Mutex<HashMap<K, V>>,
    delay: Option<Duration>,
    gets: Mutex<Vec<K>>,
    sets: Mutex<Vec<(K, V)>>,
    clears: AtomicUsize,
    signals: AtomicUsize,
}

impl<K, V> CountingLevel<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty level.
    pub fn new() -> Self {
        Self::with_values([])
    }

    /// Creates a level holding the given values.
    pub fn with_values(values: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            values: Mutex::new(values.into_iter().collect()),
            delay: None,
            gets: Default::default(),
            sets: Default::default(),
            clears: Default::default(),
            signals: Default::default(),
        }
    }

    /// Answers lookups only after `delay` has passed.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// The number of lookups made so far.
    pub fn get_count(&self) -> usize {
        self.gets.lock().unwrap().len()
    }

    /// All keys looked up so far, in order.
    pub fn gets(&self) -> Vec<K> {
        self.gets.lock().unwrap().clone()
    }

    /// All writes made so far, in order.
    pub fn sets(&self) -> Vec<(K, V)> {
        self.sets.lock().unwrap().clone()
    }

    pub fn clear_count(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn signal_count(&self) -> usize {
        self.signals.load(Ordering::SeqCst)
    }
}

impl<K, V> Default for CountingLevel<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheLevel for CountingLevel<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    type Key = K;
    type Value = V;

    fn get(&self, key: &K) -> AsyncResult<V> {
        self.gets.lock().unwrap().push(key.clone());
        let outcome = match self.values.lock().unwrap().get(key) {
            Some(value) => Ok(value.clone()),
            None => Err(CacheError::NotFound),
        };

        match self.delay {
            None => AsyncResult::settled(outcome),
            Some(delay) => {
                let result = AsyncResult::new();
                let settler = result.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    settler.settle(outcome);
                });
                result
            }
        }
    }

    fn set(&self, value: V, key: &K) {
        let entry = (key.clone(), value.clone());
        self.sets.lock().unwrap().push(entry);
        self.values.lock().unwrap().insert(key.clone(), value);
    }

    fn clear(&self) {
        self.clears.fetch_add(1, Ordering::SeqCst);
        self.values.lock().unwrap().clear();
    }

    fn on_clear_signal(&self) {
        self.signals.fetch_add(1, Ordering::SeqCst);
    }
}
