//! A single-assignment result that many observers can subscribe to.
//!
//! An [`AsyncResult`] is created pending by whoever starts a fetch, and is settled exactly once
//! with either a value or a [`CacheError`]. Cloning an [`AsyncResult`] yields another handle to the
//! *same* result, which is how a pooled fetch is shared among all of its callers.
//!
//! Observers are plain closures. Those registered while the result is pending run on the thread
//! that settles it, in registration order. Those registered after settlement run immediately, on
//! the registering thread, before the registration method returns.

use std::fmt;
use std::future::IntoFuture;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt};

use crate::error::{CacheEntry, CacheError};

enum Observer<T> {
    Success(Box<dyn FnOnce(T) + Send>),
    Failure(Box<dyn FnOnce(CacheError) + Send>),
    Completion(Box<dyn FnOnce(CacheEntry<T>) + Send>),
}

impl<T: Clone> Observer<T> {
    fn notify(self, outcome: &CacheEntry<T>) {
        match (self, outcome) {
            (Observer::Success(f), Ok(value)) => f(value.clone()),
            (Observer::Failure(f), Err(err)) => f(err.clone()),
            (Observer::Completion(f), outcome) => f(outcome.clone()),
            _ => {}
        }
    }
}

enum State<T> {
    Pending(Vec<Observer<T>>),
    Settled(CacheEntry<T>),
}

/// A shared handle to the eventual outcome of a fetch.
///
/// See the [module level documentation](self) for the delivery rules.
pub struct AsyncResult<T> {
    state: Arc<Mutex<State<T>>>,
}

impl<T> Clone for AsyncResult<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> AsyncResult<T> {
    /// Returns `true` if both handles refer to the same underlying result.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.state, &other.state)
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // Observers never run under this lock, so a poisoned lock still holds consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` once the result holds a value or an error.
    pub fn is_settled(&self) -> bool {
        matches!(*self.lock(), State::Settled(_))
    }
}

impl<T: Clone + Send + 'static> AsyncResult<T> {
    /// Creates a new pending result.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Pending(Vec::new()))),
        }
    }

    /// Creates a result that is already settled with the given outcome.
    pub fn settled(outcome: CacheEntry<T>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::Settled(outcome))),
        }
    }

    /// Creates a result that already succeeded with `value`.
    pub fn succeeded(value: T) -> Self {
        Self::settled(Ok(value))
    }

    /// Creates a result that already failed with `error`.
    pub fn failed(error: CacheError) -> Self {
        Self::settled(Err(error))
    }

    /// Returns a copy of the outcome, or `None` while still pending.
    pub fn outcome(&self) -> Option<CacheEntry<T>> {
        match &*self.lock() {
            State::Pending(_) => None,
            State::Settled(outcome) => Some(outcome.clone()),
        }
    }

    /// Settles the result with a value. See [`settle`](Self::settle).
    pub fn succeed(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles the result with an error. See [`settle`](Self::settle).
    pub fn fail(&self, error: CacheError) -> bool {
        self.settle(Err(error))
    }

    /// Settles the result and notifies every registered observer in registration order.
    ///
    /// A result can only be settled once. Any further attempt is ignored, reported as a warning
    /// and returns `false`.
    pub fn settle(&self, outcome: CacheEntry<T>) -> bool {
        let observers = {
            let mut state = self.lock();
            let State::Pending(observers) = &mut *state else {
                tracing::warn!(
                    ignored.ok = outcome.is_ok(),
                    "Attempted to settle an already settled AsyncResult"
                );
                return false;
            };
            let observers = mem::take(observers);
            *state = State::Settled(outcome.clone());
            observers
        };

        for observer in observers {
            observer.notify(&outcome);
        }
        true
    }

    fn register(&self, observer: Observer<T>) -> &Self {
        let outcome = {
            let mut state = self.lock();
            match &mut *state {
                State::Pending(observers) => {
                    observers.push(observer);
                    return self;
                }
                State::Settled(outcome) => outcome.clone(),
            }
        };

        observer.notify(&outcome);
        self
    }

    /// Registers an observer that is called with the value if the result succeeds.
    pub fn on_success<F>(&self, f: F) -> &Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.register(Observer::Success(Box::new(f)))
    }

    /// Registers an observer that is called with the error if the result fails.
    pub fn on_failure<F>(&self, f: F) -> &Self
    where
        F: FnOnce(CacheError) + Send + 'static,
    {
        self.register(Observer::Failure(Box::new(f)))
    }

    /// Registers an observer that is called with the outcome, whichever it is.
    pub fn on_completion<F>(&self, f: F) -> &Self
    where
        F: FnOnce(CacheEntry<T>) + Send + 'static,
    {
        self.register(Observer::Completion(Box::new(f)))
    }

    /// Settles this result with whatever outcome `other` settles with.
    pub fn mimic(&self, other: &AsyncResult<T>) -> &Self {
        let forward = Forward::new(self.clone());
        other.on_completion(move |outcome| forward.settle(outcome));
        self
    }

    /// Returns a new result that succeeds with `f` applied to this result's value.
    pub fn map<U, F>(&self, f: F) -> AsyncResult<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.try_map(move |value| Ok(f(value)))
    }

    /// Returns a new result settled with the outcome of `f` applied to this result's value.
    ///
    /// Failures of this result are passed through without calling `f`.
    pub fn try_map<U, F>(&self, f: F) -> AsyncResult<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> CacheEntry<U> + Send + 'static,
    {
        let mapped = AsyncResult::new();
        let forward = Forward::new(mapped.clone());
        self.on_completion(move |outcome| forward.settle(outcome.and_then(f)));
        mapped
    }

    /// Chains another asynchronous step onto a successful value.
    pub fn and_then<U, F>(&self, f: F) -> AsyncResult<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> AsyncResult<U> + Send + 'static,
    {
        let chained = AsyncResult::new();
        let forward = Forward::new(chained.clone());
        self.on_completion(move |outcome| match outcome {
            Ok(value) => {
                f(value).on_completion(move |outcome| forward.settle(outcome));
            }
            Err(err) => forward.settle(Err(err)),
        });
        chained
    }
}

impl<T: Clone + Send + 'static> Default for AsyncResult<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for AsyncResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("AsyncResult");
        match &*self.lock() {
            State::Pending(observers) => s
                .field("state", &"pending")
                .field("observers", &observers.len()),
            State::Settled(outcome) => s.field("outcome", outcome),
        };
        s.finish()
    }
}

impl<T: Clone + Send + 'static> IntoFuture for AsyncResult<T> {
    type Output = CacheEntry<T>;
    type IntoFuture = BoxFuture<'static, CacheEntry<T>>;

    /// Waits for the outcome.
    ///
    /// Resolves to [`CacheError::Abandoned`] if the result is dropped by everyone else without
    /// ever being settled.
    fn into_future(self) -> Self::IntoFuture {
        let (sender, receiver) = oneshot::channel();
        self.on_completion(move |outcome| {
            sender.send(outcome).ok();
        });
        drop(self);

        receiver
            .map(|received| received.unwrap_or(Err(CacheError::Abandoned)))
            .boxed()
    }
}

/// Forwards an outcome into a target result.
///
/// If the observer holding this is dropped without ever being called, because the source result
/// was dropped while pending, the target is failed with [`CacheError::Abandoned`] instead of being
/// left pending forever.
struct Forward<T: Clone + Send + 'static>(Option<AsyncResult<T>>);

impl<T: Clone + Send + 'static> Forward<T> {
    fn new(target: AsyncResult<T>) -> Self {
        Self(Some(target))
    }

    fn settle(mut self, outcome: CacheEntry<T>) {
        if let Some(target) = self.0.take() {
            target.settle(outcome);
        }
    }
}

impl<T: Clone + Send + 'static> Drop for Forward<T> {
    fn drop(&mut self) {
        if let Some(target) = self.0.take() {
            target.fail(CacheError::Abandoned);
        }
    }
}
