use crate::common::content_store;
use chrono::Utc;
use crawlkeeper::storage::ContentHash;
use futures::future::join_all;
use std::sync::Arc;

#[tokio::test]
async fn test_recrawl_with_new_content_reclaims_old_blob() {
    let dir = tempfile::tempdir().unwrap();
    let store = content_store(&dir);
    let hello = ContentHash::of(b"hello");
    let world = ContentHash::of(b"world");

    let first = store
        .upsert("http://example.com/a", Some("A"), b"hello", Utc::now())
        .await
        .unwrap();
    assert_eq!(first.hash, hello);
    assert_eq!(first.previous, None);
    assert!(!first.reclaimed);

    let second = store
        .upsert("http://example.com/a", Some("A"), b"world", Utc::now())
        .await
        .unwrap();
    assert_eq!(second.hash, world);
    assert_eq!(second.previous, Some(hello));
    assert!(second.reclaimed);

    assert!(!store.blobs().contains(&hello).await.unwrap());
    assert!(store.blobs().contains(&world).await.unwrap());
    let record = store
        .metadata()
        .get_page("http://example.com/a")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.hash, world);
}

#[tokio::test]
async fn test_shared_blob_survives_until_last_reference() {
    let dir = tempfile::tempdir().unwrap();
    let store = content_store(&dir);
    let shared = ContentHash::of(b"shared");

    store
        .upsert("http://a.example/", None, b"shared", Utc::now())
        .await
        .unwrap();
    store
        .upsert("http://b.example/", None, b"shared", Utc::now())
        .await
        .unwrap();

    let a_changed = store
        .upsert("http://a.example/", None, b"only a", Utc::now())
        .await
        .unwrap();
    assert!(!a_changed.reclaimed);
    assert!(store.blobs().contains(&shared).await.unwrap());

    let b_changed = store
        .upsert("http://b.example/", None, b"only b", Utc::now())
        .await
        .unwrap();
    assert!(b_changed.reclaimed);
    assert!(!store.blobs().contains(&shared).await.unwrap());
}

#[tokio::test]
async fn test_new_urls_never_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = content_store(&dir);

    for i in 0..5 {
        let outcome = store
            .upsert(&format!("http://example.com/{}", i), None, b"same", Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome.previous, None);
        assert!(!outcome.reclaimed);
    }

    let hash = ContentHash::of(b"same");
    assert_eq!(store.metadata().count_referencing(&hash).await.unwrap(), 5);
    assert!(store.blobs().contains(&hash).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_rewrites_keep_blobs_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(content_store(&dir));
    let urls: Vec<String> = (0..16).map(|i| format!("http://example.com/{}", i)).collect();

    let writes = urls.iter().cloned().map(|url| {
        let store = store.clone();
        tokio::spawn(async move { store.upsert(&url, None, b"v1", Utc::now()).await })
    });
    for result in join_all(writes).await {
        result.expect("task panicked").unwrap();
    }

    let rewrites = urls.iter().cloned().map(|url| {
        let store = store.clone();
        tokio::spawn(async move { store.upsert(&url, None, b"v2", Utc::now()).await })
    });
    let outcomes: Vec<_> = join_all(rewrites)
        .await
        .into_iter()
        .map(|r| r.expect("task panicked").unwrap())
        .collect();

    let v1 = ContentHash::of(b"v1");
    let v2 = ContentHash::of(b"v2");

    // The rewrite that drops the last reference always counts zero
    assert!(outcomes.iter().any(|o| o.reclaimed));
    assert!(!store.blobs().contains(&v1).await.unwrap());
    assert!(store.blobs().contains(&v2).await.unwrap());
    assert_eq!(store.metadata().count_referencing(&v2).await.unwrap(), 16);
}

#[tokio::test]
async fn test_blob_restored_when_content_comes_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = content_store(&dir);
    let hello = ContentHash::of(b"hello");

    store
        .upsert("http://example.com/a", None, b"hello", Utc::now())
        .await
        .unwrap();
    store
        .upsert("http://example.com/a", None, b"world", Utc::now())
        .await
        .unwrap();
    store
        .upsert("http://example.com/b", None, b"hello", Utc::now())
        .await
        .unwrap();

    assert_eq!(
        store.blobs().get(&hello).await.unwrap(),
        Some(b"hello".to_vec())
    );
}
