use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use strata_core::config::MemoryCacheConfig;
use strata_core::{
    CacheError, CacheLevel, CacheLevelExt, MemoryCacheLevel, StringTransformer,
    TwoWayTransformer, async_fetcher,
};
use strata_test::CountingLevel;

#[tokio::test]
async fn test_memory_in_front_of_pooled_origin() {
    strata_test::setup();

    let fetches = Arc::new(AtomicUsize::new(0));
    let fetches_clone = fetches.clone();
    let origin = async_fetcher(move |key: String| {
        fetches_clone.fetch_add(1, Ordering::SeqCst);
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            match key.parse::<u64>() {
                Ok(n) => Ok(n * n),
                Err(_) => Err(CacheError::NotFound),
            }
        }
    });

    let cache = MemoryCacheLevel::new(&MemoryCacheConfig::default())
        .compose(origin.pooled())
        .transform_keys(StringTransformer::<u64>::new());

    let (a, b) = tokio::join!(cache.get(&9).into_future(), cache.get(&9).into_future());
    assert_eq!(a.unwrap(), 81);
    assert_eq!(b.unwrap(), 81);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // Written back into the memory level.
    assert_eq!(cache.get(&9).outcome().unwrap().unwrap(), 81);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // A clear signal empties the memory level, so the origin is asked again.
    cache.on_clear_signal();
    assert_eq!(cache.get(&9).await.unwrap(), 81);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_values_and_batches() {
    strata_test::setup();

    let backend = Arc::new(CountingLevel::with_values([
        ("a".to_owned(), "1".to_owned()),
        ("b".to_owned(), "2".to_owned()),
        ("c".to_owned(), "three".to_owned()),
    ]));
    let cache = backend
        .clone()
        .transform_values(StringTransformer::<i32>::new().invert());

    let keys = ["a".to_owned(), "b".to_owned()];
    assert_eq!(cache.get_all(&keys).await.unwrap(), [1, 2]);

    let keys = ["a".to_owned(), "c".to_owned()];
    assert!(matches!(
        cache.get_all(&keys).await,
        Err(CacheError::ValueTransformationFailed)
    ));

    cache.set(4, &"d".to_owned());
    assert_eq!(backend.sets(), [("d".to_owned(), "4".to_owned())]);
}

#[tokio::test]
async fn test_clear_reaches_every_level() {
    strata_test::setup();

    let first = Arc::new(CountingLevel::<u32, u32>::new());
    let second = Arc::new(CountingLevel::<u32, u32>::new());
    let cache = first
        .clone()
        .compose(second.clone())
        .conditioned(|key| *key > 0)
        .pooled();

    cache.clear();
    cache.on_clear_signal();

    for level in [&first, &second] {
        assert_eq!(level.clear_count(), 1);
        assert_eq!(level.signal_count(), 1);
    }

    assert!(matches!(
        cache.get(&0).await,
        Err(CacheError::ConditionNotSatisfied)
    ));
    assert_eq!(first.get_count(), 0);
}
