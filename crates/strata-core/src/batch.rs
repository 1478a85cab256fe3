use std::sync::{Arc, Mutex, PoisonError};

use crate::async_result::AsyncResult;
use crate::level::CacheLevel;

struct Batch<V> {
    values: Vec<Option<V>>,
    remaining: usize,
    failed: bool,
}

/// Looks up all `keys` at once.
///
/// The returned result succeeds with the values in the order of `keys` once every lookup
/// succeeded, or fails as soon as the first lookup fails. An empty batch succeeds right away.
pub fn get_all<L: CacheLevel>(level: &L, keys: &[L::Key]) -> AsyncResult<Vec<L::Value>> {
    if keys.is_empty() {
        return AsyncResult::succeeded(Vec::new());
    }

    let result = AsyncResult::new();
    let batch = Arc::new(Mutex::new(Batch {
        values: vec![None; keys.len()],
        remaining: keys.len(),
        failed: false,
    }));

    for (index, key) in keys.iter().enumerate() {
        let batch = Arc::clone(&batch);
        let settler = result.clone();
        level.get(key).on_completion(move |outcome| {
            let mut state = batch.lock().unwrap_or_else(PoisonError::into_inner);
            let value = match outcome {
                Ok(value) => value,
                Err(err) => {
                    // Only the first failure settles the batch, later ones are ignored.
                    if !state.failed {
                        state.failed = true;
                        drop(state);
                        settler.fail(err);
                    }
                    return;
                }
            };

            state.values[index] = Some(value);
            state.remaining -= 1;
            if state.remaining > 0 {
                return;
            }

            let values = state.values.drain(..).flatten().collect();
            drop(state);
            settler.succeed(values);
        });
    }

    result
}
