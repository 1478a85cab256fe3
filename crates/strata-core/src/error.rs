use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// An error that happens when fetching a value through a cache level.
///
/// Errors reported by backends are passed through every decorator verbatim. The decorators
/// themselves only introduce the transformation and condition variants.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The value is not present in the cache level.
    #[error("not found")]
    NotFound,
    /// The key could not be converted to the key type of the wrapped level.
    #[error("key transformation failed")]
    KeyTransformationFailed,
    /// The value returned by the wrapped level could not be converted.
    #[error("value transformation failed")]
    ValueTransformationFailed,
    /// The key was rejected by the condition of a conditioned level.
    #[error("condition not satisfied")]
    ConditionNotSatisfied,
    /// The backend gave up waiting for the value.
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    /// Every handle able to settle a pending result was dropped before doing so.
    ///
    /// This points to a backend that broke its contract of settling every result it hands out.
    #[error("result abandoned before being settled")]
    Abandoned,
    /// An opaque, backend-specific error.
    #[error("backend error: {0}")]
    Backend(#[source] Arc<dyn StdError + Send + Sync>),
}

impl CacheError {
    /// Wraps an arbitrary error as an opaque [`Backend`](Self::Backend) error.
    pub fn backend<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Backend(Arc::new(err))
    }

    /// Returns `true` if this is [`NotFound`](Self::NotFound).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::backend(err)
    }
}

/// The outcome of a fetch: either `Ok(T)` or the reason why no value could be produced.
pub type CacheEntry<T> = Result<T, CacheError>;
