//! Qdrant-backed vector store
//!
//! Implements the three-operation store interface on top of Qdrant:
//! collection bootstrap with named vectors, presence checks by point ID,
//! batched upserts, and exact point counts.

use super::{ItemOutcome, StorePoint, VectorStore};
use crate::{IngestionError, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, Distance, Filter, PointId, PointStruct,
    ScrollPointsBuilder, UpsertPointsBuilder, VectorParamsBuilder, VectorsConfigBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info};
use uuid::Uuid;

/// Named vector over title and overview
pub const DEFAULT_VECTOR: &str = "default";
/// Named vector over the genre list
pub const GENRES_VECTOR: &str = "genres";

/// Qdrant client scoped to one collection
pub struct QdrantStore {
    client: Qdrant,
    collection_name: String,
}

impl QdrantStore {
    /// Connect to a Qdrant server
    ///
    /// # Arguments
    /// * `url` - Qdrant server URL (e.g., "http://localhost:6334")
    /// * `collection` - Collection name for storing movie records
    pub fn new(url: &str, collection: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(|e| {
            IngestionError::ConfigError(format!("Failed to create Qdrant client: {}", e))
        })?;

        info!("Connected to Qdrant at {}", url);

        Ok(Self {
            client,
            collection_name: collection.to_string(),
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// Ensure the collection exists, creating it if necessary.
    ///
    /// Both named vectors are configured with cosine similarity at the given
    /// dimension.
    pub async fn ensure_collection(&self, vector_size: u64) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection_name)
            .await
            .map_err(|e| {
                IngestionError::StoreError(format!("Failed to check collection: {}", e))
            })?;

        if exists {
            debug!("Collection '{}' already exists", self.collection_name);
            return Ok(());
        }

        info!(
            "Creating collection '{}' with vector size {}",
            self.collection_name, vector_size
        );

        let mut vectors_config = VectorsConfigBuilder::default();
        vectors_config.add_named_vector_params(
            DEFAULT_VECTOR,
            VectorParamsBuilder::new(vector_size, Distance::Cosine),
        );
        vectors_config.add_named_vector_params(
            GENRES_VECTOR,
            VectorParamsBuilder::new(vector_size, Distance::Cosine),
        );

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection_name).vectors_config(vectors_config),
            )
            .await
            .map_err(|e| {
                IngestionError::StoreError(format!("Failed to create collection: {}", e))
            })?;

        info!("Successfully created collection '{}'", self.collection_name);
        Ok(())
    }

    fn to_point_struct(point: StorePoint) -> Result<PointStruct> {
        let payload = Payload::try_from(serde_json::Value::Object(point.fields))
            .map_err(|e| IngestionError::StoreError(format!("Invalid payload: {}", e)))?;

        Ok(PointStruct::new(
            point.key.to_string(),
            point.vectors,
            payload,
        ))
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn exists(&self, key: Uuid) -> Result<bool> {
        let filter = Filter::must([Condition::has_id([PointId::from(key.to_string())])]);

        let response = self
            .client
            .scroll(
                ScrollPointsBuilder::new(&self.collection_name)
                    .filter(filter)
                    .limit(1)
                    .with_payload(false)
                    .with_vectors(false),
            )
            .await
            .map_err(|e| IngestionError::StoreError(format!("Failed to check key: {}", e)))?;

        Ok(!response.result.is_empty())
    }

    async fn bulk_upsert(&self, points: Vec<StorePoint>) -> Result<Vec<ItemOutcome>> {
        if points.is_empty() {
            debug!("Empty batch, skipping upsert");
            return Ok(Vec::new());
        }

        let keys: Vec<Uuid> = points.iter().map(|p| p.key).collect();
        let point_structs: Vec<PointStruct> = points
            .into_iter()
            .map(Self::to_point_struct)
            .collect::<Result<Vec<_>>>()?;

        // Qdrant acknowledges the batch as a whole; a call-level error leaves
        // every item's fate unknown and is surfaced as such to the loader.
        self.client
            .upsert_points(
                UpsertPointsBuilder::new(&self.collection_name, point_structs).wait(true),
            )
            .await
            .map_err(|e| IngestionError::StoreError(format!("Failed to upsert batch: {}", e)))?;

        info!(
            "Upserted batch of {} points to collection '{}'",
            keys.len(),
            self.collection_name
        );
        Ok(keys.into_iter().map(ItemOutcome::Stored).collect())
    }

    async fn count(&self) -> Result<u64> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection_name).exact(true))
            .await
            .map_err(|e| IngestionError::StoreError(format!("Failed to count points: {}", e)))?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}
