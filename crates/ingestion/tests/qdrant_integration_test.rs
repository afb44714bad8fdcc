//! Integration tests for the Qdrant-backed store
//!
//! These tests require a running Qdrant instance. They can be run with:
//! ```bash
//! docker run -p 6334:6334 qdrant/qdrant
//! cargo test --test qdrant_integration_test -- --ignored
//! ```

use cinescope_ingestion::{
    fingerprint, NormalizeOutcome, Normalizer, QdrantStore, Schema, StorePoint, VectorStore,
};
use serde_json::json;
use uuid::Uuid;

const QDRANT_URL: &str = "http://localhost:6334";
const TEST_COLLECTION: &str = "test_movies";
const TEST_DIM: u64 = 4;

fn test_point(id: i64, title: &str) -> (Uuid, StorePoint) {
    let raw = json!({
        "properties": {
            "id": id,
            "title": title,
            "genres": "Action-Science Fiction",
            "release_date": "1999-03-31",
        },
        "vectors": {
            "default": [0.1, 0.2, 0.3, 0.4],
            "genres": [0.4, 0.3, 0.2, 0.1],
        },
    });

    let NormalizeOutcome::Record(record) = Normalizer::new(Schema::movies()).normalize(&raw)
    else {
        panic!("expected record");
    };
    let key = fingerprint(&record).unwrap();
    (key, StorePoint::from_record(key, &record).unwrap())
}

#[tokio::test]
#[ignore] // Requires running Qdrant instance
async fn test_bootstrap_is_reentrant() {
    let store = QdrantStore::new(QDRANT_URL, TEST_COLLECTION).unwrap();
    store.ensure_collection(TEST_DIM).await.unwrap();
    // A second bootstrap finds the collection and is a no-op.
    store.ensure_collection(TEST_DIM).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running Qdrant instance
async fn test_upsert_exists_count_roundtrip() {
    let store = QdrantStore::new(QDRANT_URL, TEST_COLLECTION).unwrap();
    store.ensure_collection(TEST_DIM).await.unwrap();

    let (key, point) = test_point(603, "The Matrix");
    assert!(!store.exists(key).await.unwrap());

    let before = store.count().await.unwrap();
    let outcomes = store.bulk_upsert(vec![point]).await.unwrap();
    assert!(outcomes.iter().all(|o| o.is_stored()));

    assert!(store.exists(key).await.unwrap());
    assert_eq!(store.count().await.unwrap(), before + 1);
}

#[tokio::test]
#[ignore] // Requires running Qdrant instance
async fn test_reupserting_same_key_does_not_grow_collection() {
    let store = QdrantStore::new(QDRANT_URL, TEST_COLLECTION).unwrap();
    store.ensure_collection(TEST_DIM).await.unwrap();

    let (_, point) = test_point(604, "The Matrix Reloaded");
    store.bulk_upsert(vec![point.clone()]).await.unwrap();
    let count = store.count().await.unwrap();

    store.bulk_upsert(vec![point]).await.unwrap();
    assert_eq!(store.count().await.unwrap(), count);
}
