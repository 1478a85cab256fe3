use std::sync::Arc;
use std::time::Duration;

use strata_core::{AsyncResult, CacheError, CacheLevel, CacheLevelExt, StringTransformer};
use strata_test::CountingLevel;

/// Three callers ask for the same key while the backend is still busy with the first lookup.
#[tokio::test]
async fn test_concurrent_callers_share_one_lookup() {
    strata_test::setup();

    let backend = Arc::new(
        CountingLevel::with_values([("12".to_owned(), 101u32)])
            .with_delay(Duration::from_millis(50)),
    );
    let cache = Arc::new(
        backend
            .clone()
            .pooled()
            .transform_keys(StringTransformer::<u32>::new()),
    );

    let handles: Vec<_> = (0..3)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get(&12).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 101);
    }
    assert_eq!(backend.get_count(), 1);
    assert_eq!(backend.gets(), ["12"]);
}

#[tokio::test]
async fn test_shared_instance_and_observers() {
    strata_test::setup();

    let backend = CountingLevel::with_values([(1u32, "one".to_owned())]);
    let backend = Arc::new(backend.with_delay(Duration::from_millis(20)));
    let cache = backend.clone().pooled();

    let results: Vec<_> = (0..5).map(|_| cache.get(&1)).collect();
    assert!(results.iter().all(|r| AsyncResult::ptr_eq(r, &results[0])));
    assert_eq!(cache.in_flight(), 1);

    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
    for (index, result) in results.iter().enumerate() {
        let sender = sender.clone();
        result.on_success(move |value| {
            sender.send((index, value)).ok();
        });
    }
    drop(sender);

    let mut seen = Vec::new();
    while let Some(received) = receiver.recv().await {
        seen.push(received);
    }
    seen.sort();
    assert_eq!(
        seen,
        (0..5).map(|i| (i, "one".to_owned())).collect::<Vec<_>>()
    );
    assert_eq!(backend.get_count(), 1);
    assert_eq!(cache.in_flight(), 0);
}

#[tokio::test]
async fn test_settled_lookup_starts_new_window() {
    strata_test::setup();

    let delay = Duration::from_millis(10);
    let backend = Arc::new(CountingLevel::<u32, u32>::new().with_delay(delay));
    let cache = backend.clone().pooled();

    let first = cache.get(&7);
    assert!(matches!(first.clone().await, Err(CacheError::NotFound)));

    // Late observers of the settled result get the outcome right away.
    let late = Arc::new(std::sync::Mutex::new(None));
    let late_clone = late.clone();
    first.on_failure(move |err| *late_clone.lock().unwrap() = Some(err));
    assert!(matches!(
        late.lock().unwrap().take(),
        Some(CacheError::NotFound)
    ));

    let second = cache.get(&7);
    assert!(!AsyncResult::ptr_eq(&first, &second));
    assert!(second.await.is_err());
    assert_eq!(backend.get_count(), 2);
}
