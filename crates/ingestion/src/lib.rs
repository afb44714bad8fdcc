//! CineScope Ingestion Pipeline
//!
//! This crate provides the data ingestion pipeline for the CineScope
//! movie-discovery platform: Parquet shard streaming, row normalization into
//! canonical records, deterministic record fingerprinting, and idempotent
//! batched loading into an external vector store.

pub mod fingerprint;
pub mod loader;
pub mod normalizer;
pub mod report;
pub mod schema;
pub mod source;
pub mod store;

// Re-export main types
pub use fingerprint::fingerprint;
pub use loader::{BatchLoader, LoaderConfig};
pub use normalizer::{CanonicalRecord, FieldValue, NormalizeOutcome, Normalizer};
pub use report::{FailedObject, FailureReport, RunReport};
pub use schema::{FieldSpec, FieldType, Schema};
pub use source::ParquetSource;
pub use store::{ItemOutcome, MemoryStore, QdrantStore, StorePoint, VectorStore};

/// Common error type for the ingestion pipeline
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Source error: {0}")]
    SourceError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Loader already finished")]
    AlreadyFinished,
}

pub type Result<T> = std::result::Result<T, IngestionError>;
pub type Error = IngestionError;
