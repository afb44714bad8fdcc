//! External store collaborator
//!
//! The ingestion core consumes the vector store through exactly three
//! operations: presence check, bulk upsert with per-item outcomes, and an
//! exact count. Query, ranking, and schema-migration capabilities of the
//! store are owned by the discovery layer and are out of scope here.

use crate::normalizer::CanonicalRecord;
use crate::{IngestionError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

pub mod memory;
pub mod qdrant;

pub use memory::MemoryStore;
pub use qdrant::QdrantStore;

/// One record prepared for storage: identity key, payload fields, and any
/// named embedding vectors
#[derive(Debug, Clone)]
pub struct StorePoint {
    pub key: Uuid,
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub vectors: HashMap<String, Vec<f32>>,
}

impl StorePoint {
    /// Build a store point from a canonical record and its identity key
    pub fn from_record(key: Uuid, record: &CanonicalRecord) -> Result<Self> {
        let serde_json::Value::Object(fields) = serde_json::to_value(&record.fields)? else {
            return Err(IngestionError::StoreError(
                "canonical record did not serialize to an object".to_string(),
            ));
        };

        Ok(Self {
            key,
            fields,
            vectors: record.vectors.clone(),
        })
    }
}

/// Per-item acknowledgment from a bulk upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Stored(Uuid),
    Rejected { key: Uuid, reason: String },
}

impl ItemOutcome {
    pub fn key(&self) -> Uuid {
        match self {
            ItemOutcome::Stored(key) => *key,
            ItemOutcome::Rejected { key, .. } => *key,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, ItemOutcome::Stored(_))
    }
}

/// The three-operation interface to the external content-addressed store
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether a record with this identity key is already present
    async fn exists(&self, key: Uuid) -> Result<bool>;

    /// Store a batch of points, acknowledging each item individually.
    ///
    /// A whole-call error means the fate of every item is unknown; the caller
    /// treats that conservatively as a failure for each item.
    async fn bulk_upsert(&self, points: Vec<StorePoint>) -> Result<Vec<ItemOutcome>>;

    /// Exact number of records currently stored
    async fn count(&self) -> Result<u64>;
}

#[async_trait]
impl<S: VectorStore + ?Sized> VectorStore for std::sync::Arc<S> {
    async fn exists(&self, key: Uuid) -> Result<bool> {
        (**self).exists(key).await
    }

    async fn bulk_upsert(&self, points: Vec<StorePoint>) -> Result<Vec<ItemOutcome>> {
        (**self).bulk_upsert(points).await
    }

    async fn count(&self) -> Result<u64> {
        (**self).count().await
    }
}
