//! # Composable cache levels
//!
//! A cache is built from [`CacheLevel`]s: a uniform `get` / `set` / `clear` / `on_clear_signal`
//! interface that any backend (memory, disk, network, a plain function) can implement. Decorators
//! are cache levels themselves and wrap another level to add behavior without touching it:
//!
//! - [`PoolingCacheLevel`] deduplicates concurrent lookups of the same key into a single lookup
//!   of the wrapped level.
//! - [`KeyTransformingCacheLevel`] and [`ValueTransformingCacheLevel`] adapt the key or value type
//!   through possibly-failing [transformers](mod@transformer).
//! - [`CompositeCacheLevel`] falls back from a fast level to a slow one and writes the result
//!   back.
//! - [`ConditionedCacheLevel`] rejects lookups for unwanted keys.
//!
//! Lookups return an [`AsyncResult`] immediately. The backend settles it once, and every observer
//! registered on it, before or after settlement, gets the outcome. An [`AsyncResult`] can also be
//! `.await`ed.
//!
//! ## Errors
//!
//! Failed lookups carry a [`CacheError`]. Backends report [`CacheError::NotFound`] or their own
//! errors, which every decorator passes through unchanged. The decorators only add
//! [`CacheError::KeyTransformationFailed`], [`CacheError::ValueTransformationFailed`] and
//! [`CacheError::ConditionNotSatisfied`].
//!
//! Writes never report errors. A write whose key or value fails to transform is dropped.

mod async_result;
mod batch;
mod composite;
mod conditioned;
mod error;
mod ext;
mod fetcher;
mod key_transform;
mod level;
mod memory;
mod pooling;
mod value_transform;

pub mod config;
pub mod transformer;

pub use async_result::AsyncResult;
pub use batch::get_all;
pub use composite::CompositeCacheLevel;
pub use conditioned::ConditionedCacheLevel;
pub use error::{CacheEntry, CacheError};
pub use ext::CacheLevelExt;
pub use fetcher::{AsyncFetcherLevel, FetcherLevel, async_fetcher, fetcher};
pub use key_transform::KeyTransformingCacheLevel;
pub use level::CacheLevel;
pub use memory::MemoryCacheLevel;
pub use pooling::PoolingCacheLevel;
pub use transformer::{
    OneWayTransformer, StringTransformer, TwoWayTransformer, transformer, two_way_transformer,
};
pub use value_transform::ValueTransformingCacheLevel;
