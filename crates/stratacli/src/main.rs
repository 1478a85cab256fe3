use std::collections::HashMap;

use anyhow::Result;
use strata_core::{
    CacheLevel, CacheLevelExt, MemoryCacheLevel, PoolingCacheLevel, StringTransformer,
    TwoWayTransformer,
};

use origin::Origin;
use settings::Settings;

mod logging;
mod origin;
mod settings;

type Backend = Box<dyn CacheLevel<Key = u64, Value = u64>>;

#[tokio::main]
async fn main() -> Result<()> {
    let Settings {
        keys,
        config,
        delay,
        repeat,
    } = Settings::get()?;

    logging::init_logging(&config);
    tracing::info!(pooling = config.pooling, ?delay, "Starting lookups");

    let origin = Origin::new(delay);
    let backend: Backend = if config.pooling {
        Box::new(PoolingCacheLevel::new(origin.level()))
    } else {
        Box::new(origin.level())
    };

    let cache = MemoryCacheLevel::new(&config.memory)
        .compose(backend)
        .transform_keys(StringTransformer::<u64>::new().invert());

    // Start every lookup before waiting on any of them.
    let lookups: Vec<_> = (0..repeat)
        .flat_map(|_| keys.iter())
        .map(|key| (key, cache.get(key)))
        .collect();

    let mut outcomes = HashMap::new();
    for (key, lookup) in lookups {
        let outcome = lookup.await;
        outcomes.entry(key).or_insert(outcome);
    }

    for key in &keys {
        match &outcomes[key] {
            Ok(value) => println!("{key}: {value}"),
            Err(err) => println!("{key}: error: {err}"),
        }
    }
    println!("origin fetches: {}", origin.fetches());

    Ok(())
}
