//! In-process store used by tests and local dry runs
//!
//! Mirrors the contract of the real vector store closely enough to exercise
//! the loader: per-item rejection, whole-call unavailability, and batch-size
//! observation for verifying the loader's bound.

use super::{ItemOutcome, StorePoint, VectorStore};
use crate::{IngestionError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// In-memory [`VectorStore`] implementation
#[derive(Default)]
pub struct MemoryStore {
    points: Mutex<HashMap<Uuid, StorePoint>>,
    reject_keys: HashSet<Uuid>,
    unavailable: AtomicBool,
    upsert_delay: Option<Duration>,
    max_batch_seen: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject these keys on upsert, as a store-side per-item failure
    pub fn with_rejected_keys(mut self, keys: impl IntoIterator<Item = Uuid>) -> Self {
        self.reject_keys = keys.into_iter().collect();
        self
    }

    /// Delay every bulk upsert, for exercising flush timeouts
    pub fn with_upsert_delay(mut self, delay: Duration) -> Self {
        self.upsert_delay = Some(delay);
        self
    }

    /// Fail every store call wholesale while set
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Largest batch observed by `bulk_upsert`
    pub fn max_batch_seen(&self) -> usize {
        self.max_batch_seen.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.points.lock().expect("memory store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: Uuid) -> bool {
        self.points
            .lock()
            .expect("memory store lock")
            .contains_key(&key)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(IngestionError::StoreError(
                "store unavailable".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn exists(&self, key: Uuid) -> Result<bool> {
        self.check_available()?;
        Ok(self.contains(key))
    }

    async fn bulk_upsert(&self, points: Vec<StorePoint>) -> Result<Vec<ItemOutcome>> {
        self.check_available()?;
        if let Some(delay) = self.upsert_delay {
            tokio::time::sleep(delay).await;
        }

        self.max_batch_seen.fetch_max(points.len(), Ordering::SeqCst);

        let mut stored = self.points.lock().expect("memory store lock");
        let outcomes = points
            .into_iter()
            .map(|point| {
                let key = point.key;
                if self.reject_keys.contains(&key) {
                    ItemOutcome::Rejected {
                        key,
                        reason: "rejected by store".to_string(),
                    }
                } else {
                    stored.insert(key, point);
                    ItemOutcome::Stored(key)
                }
            })
            .collect();

        Ok(outcomes)
    }

    async fn count(&self) -> Result<u64> {
        self.check_available()?;
        Ok(self.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn point(key: Uuid) -> StorePoint {
        StorePoint {
            key,
            fields: Map::new(),
            vectors: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_per_key() {
        let store = MemoryStore::new();
        let key = Uuid::new_v4();

        store.bulk_upsert(vec![point(key)]).await.unwrap();
        store.bulk_upsert(vec![point(key)]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.exists(key).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_keys_reported_per_item() {
        let bad = Uuid::new_v4();
        let good = Uuid::new_v4();
        let store = MemoryStore::new().with_rejected_keys([bad]);

        let outcomes = store
            .bulk_upsert(vec![point(bad), point(good)])
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].is_stored());
        assert!(outcomes[1].is_stored());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_calls() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        assert!(store.exists(Uuid::new_v4()).await.is_err());
        assert!(store.bulk_upsert(vec![]).await.is_err());
        assert!(store.count().await.is_err());
    }
}
