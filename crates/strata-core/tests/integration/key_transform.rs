use std::sync::Arc;

use strata_core::{CacheError, CacheLevel, CacheLevelExt, transformer};
use strata_test::CountingLevel;

fn even_keys() -> impl strata_core::OneWayTransformer<Input = u32, Output = String> {
    transformer(|key: &u32| (key % 2 == 0).then(|| format!("key-{key}")))
}

#[tokio::test]
async fn test_failing_transform_never_reaches_backend() {
    strata_test::setup();

    let backend = Arc::new(CountingLevel::with_values([("key-2".to_owned(), 20u32)]));
    let cache = backend.clone().transform_keys(even_keys());

    assert!(matches!(
        cache.get(&3).await,
        Err(CacheError::KeyTransformationFailed)
    ));
    cache.set(30, &3);

    assert_eq!(backend.get_count(), 0);
    assert!(backend.sets().is_empty());
}

#[tokio::test]
async fn test_outcomes_pass_through() {
    strata_test::setup();

    let backend = Arc::new(CountingLevel::with_values([("key-2".to_owned(), 20u32)]));
    let cache = backend.clone().transform_keys(even_keys());

    assert_eq!(cache.get(&2).await.unwrap(), 20);
    assert!(matches!(cache.get(&4).await, Err(CacheError::NotFound)));

    cache.set(40, &4);
    assert_eq!(backend.sets(), [("key-4".to_owned(), 40)]);
    assert_eq!(cache.get(&4).await.unwrap(), 40);
    assert_eq!(backend.gets(), ["key-2", "key-4", "key-4"]);
}

#[tokio::test]
async fn test_pooling_behind_key_transform() {
    strata_test::setup();

    let backend = Arc::new(
        CountingLevel::with_values([("key-2".to_owned(), 20u32)])
            .with_delay(std::time::Duration::from_millis(20)),
    );
    // Equal original keys map to equal transformed keys, so they pool together.
    let cache = backend.clone().pooled().transform_keys(even_keys());

    let (a, b) = tokio::join!(cache.get(&2).into_future(), cache.get(&2).into_future());
    assert_eq!(a.unwrap(), 20);
    assert_eq!(b.unwrap(), 20);
    assert_eq!(backend.get_count(), 1);
}
