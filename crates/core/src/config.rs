//! Shared configuration loader module for CineScope services
//!
//! Provides a unified configuration loading system with environment variable
//! parsing, validation, and support for .env files. All configuration uses the
//! `CINESCOPE_` prefix for environment variables.
//!
//! Configuration override hierarchy: defaults < .env < environment.
//!
//! # Example
//!
//! ```no_run
//! use cinescope_core::config::{load_dotenv, ConfigLoader, IngestConfig, StoreConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! load_dotenv();
//!
//! let store_config = StoreConfig::from_env()?;
//! let ingest_config = IngestConfig::from_env()?;
//!
//! store_config.validate()?;
//! ingest_config.validate()?;
//! # Ok(())
//! # }
//! ```

use crate::error::CineScopeError;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Configuration loader trait
///
/// Provides standardized methods for loading and validating configuration from
/// environment variables.
pub trait ConfigLoader: Sized {
    /// Load configuration from environment variables
    ///
    /// Reads environment variables with the `CINESCOPE_` prefix and constructs
    /// a configuration instance with defaults for missing optional values.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if an environment variable value cannot
    /// be parsed.
    fn from_env() -> Result<Self, CineScopeError>;

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if any validation check fails.
    fn validate(&self) -> Result<(), CineScopeError>;
}

/// Vector store configuration
///
/// # Environment Variables
///
/// - `CINESCOPE_STORE_URL` (optional): store endpoint (default: `http://localhost:6334`)
/// - `CINESCOPE_STORE_COLLECTION` (optional): collection name (default: `movies`)
/// - `CINESCOPE_STORE_VECTOR_DIM` (optional): embedding dimension (default: 1024,
///   matching Snowflake/snowflake-arctic-embed-l-v2.0)
/// - `CINESCOPE_STORE_FLUSH_TIMEOUT` (optional): bulk upsert timeout in seconds (default: 30)
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Store endpoint URL
    pub url: String,
    /// Collection holding the movie records
    pub collection: String,
    /// Dimension of the named embedding vectors
    pub vector_dim: u64,
    /// Upper bound on a single bulk upsert call
    pub flush_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: "movies".to_string(),
            vector_dim: 1024,
            flush_timeout: Duration::from_secs(30),
        }
    }
}

impl ConfigLoader for StoreConfig {
    fn from_env() -> Result<Self, CineScopeError> {
        let defaults = StoreConfig::default();

        let url = std::env::var("CINESCOPE_STORE_URL").unwrap_or(defaults.url);
        let collection = std::env::var("CINESCOPE_STORE_COLLECTION").unwrap_or(defaults.collection);
        let vector_dim = parse_env_var("CINESCOPE_STORE_VECTOR_DIM", defaults.vector_dim)?;
        let flush_timeout_secs = parse_env_var("CINESCOPE_STORE_FLUSH_TIMEOUT", 30u64)?;

        Ok(Self {
            url,
            collection,
            vector_dim,
            flush_timeout: Duration::from_secs(flush_timeout_secs),
        })
    }

    fn validate(&self) -> Result<(), CineScopeError> {
        Url::parse(&self.url).map_err(|e| CineScopeError::ConfigurationError {
            message: format!("Invalid store URL: {}", e),
            key: Some("CINESCOPE_STORE_URL".to_string()),
        })?;

        if self.collection.is_empty() {
            return Err(CineScopeError::ConfigurationError {
                message: "collection name must not be empty".to_string(),
                key: Some("CINESCOPE_STORE_COLLECTION".to_string()),
            });
        }

        if self.vector_dim == 0 {
            return Err(CineScopeError::ConfigurationError {
                message: "vector_dim must be greater than 0".to_string(),
                key: Some("CINESCOPE_STORE_VECTOR_DIM".to_string()),
            });
        }

        if self.flush_timeout.as_secs() == 0 {
            return Err(CineScopeError::ConfigurationError {
                message: "flush_timeout must be greater than 0 seconds".to_string(),
                key: Some("CINESCOPE_STORE_FLUSH_TIMEOUT".to_string()),
            });
        }

        Ok(())
    }
}

/// Ingestion run configuration
///
/// # Environment Variables
///
/// - `CINESCOPE_DATA_DIR` (optional): directory holding Parquet shards (default: `data`)
/// - `CINESCOPE_FILE_PREFIX` (optional): shard file name prefix (default: `movies_popular_`)
/// - `CINESCOPE_BATCH_SIZE` (optional): records per bulk upsert (default: 200)
/// - `CINESCOPE_MAX_OBJECTS` (optional): cap on records submitted per run (default: 20000)
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Directory scanned for partitioned source files
    pub data_dir: PathBuf,
    /// Source files must start with this prefix and end in `.parquet`
    pub file_prefix: String,
    /// Maximum records held unflushed by the batch loader
    pub batch_size: usize,
    /// Maximum records submitted in one run
    pub max_objects: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            file_prefix: "movies_popular_".to_string(),
            batch_size: 200,
            max_objects: 20_000,
        }
    }
}

impl ConfigLoader for IngestConfig {
    fn from_env() -> Result<Self, CineScopeError> {
        let defaults = IngestConfig::default();

        let data_dir = std::env::var("CINESCOPE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let file_prefix = std::env::var("CINESCOPE_FILE_PREFIX").unwrap_or(defaults.file_prefix);
        let batch_size = parse_env_var("CINESCOPE_BATCH_SIZE", defaults.batch_size)?;
        let max_objects = parse_env_var("CINESCOPE_MAX_OBJECTS", defaults.max_objects)?;

        Ok(Self {
            data_dir,
            file_prefix,
            batch_size,
            max_objects,
        })
    }

    fn validate(&self) -> Result<(), CineScopeError> {
        if self.file_prefix.is_empty() {
            return Err(CineScopeError::ConfigurationError {
                message: "file_prefix must not be empty".to_string(),
                key: Some("CINESCOPE_FILE_PREFIX".to_string()),
            });
        }

        if self.batch_size == 0 {
            return Err(CineScopeError::ConfigurationError {
                message: "batch_size must be greater than 0".to_string(),
                key: Some("CINESCOPE_BATCH_SIZE".to_string()),
            });
        }

        if self.max_objects == 0 {
            return Err(CineScopeError::ConfigurationError {
                message: "max_objects must be greater than 0".to_string(),
                key: Some("CINESCOPE_MAX_OBJECTS".to_string()),
            });
        }

        Ok(())
    }
}

/// Parse environment variable with default fallback
///
/// # Errors
///
/// Returns a `ConfigurationError` if the value is set but cannot be parsed
fn parse_env_var<T>(key: &str, default: T) -> Result<T, CineScopeError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .ok()
        .map(|v| {
            v.parse::<T>().map_err(|e| CineScopeError::ConfigurationError {
                message: format!("Failed to parse {}: {}", key, e),
                key: Some(key.to_string()),
            })
        })
        .unwrap_or(Ok(default))
}

/// Load .env file if present
///
/// Does not return an error if the .env file is not found.
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        // Only log if it's not a "file not found" error
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_store_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.url, "http://localhost:6334");
        assert_eq!(config.collection, "movies");
        assert_eq!(config.vector_dim, 1024);
        assert_eq!(config.flush_timeout, Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ingest_config_default() {
        let config = IngestConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.file_prefix, "movies_popular_");
        assert_eq!(config.batch_size, 200);
        assert_eq!(config.max_objects, 20_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_config_from_env() {
        env::set_var("CINESCOPE_STORE_URL", "http://qdrant.internal:6334");
        env::set_var("CINESCOPE_STORE_VECTOR_DIM", "768");

        let config = StoreConfig::from_env().unwrap();
        assert_eq!(config.url, "http://qdrant.internal:6334");
        assert_eq!(config.vector_dim, 768);

        env::remove_var("CINESCOPE_STORE_URL");
        env::remove_var("CINESCOPE_STORE_VECTOR_DIM");
    }

    #[test]
    fn test_store_config_validation_invalid_url() {
        let config = StoreConfig {
            url: "not-a-valid-url".to_string(),
            ..StoreConfig::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(matches!(
            result.unwrap_err(),
            CineScopeError::ConfigurationError { .. }
        ));
    }

    #[test]
    fn test_ingest_config_validation_zero_batch_size() {
        let config = IngestConfig {
            batch_size: 0,
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ingest_config_validation_empty_prefix() {
        let config = IngestConfig {
            file_prefix: String::new(),
            ..IngestConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_env_var_bad_value() {
        env::set_var("CINESCOPE_BATCH_SIZE", "not-a-number");
        let result = IngestConfig::from_env();
        assert!(result.is_err());
        env::remove_var("CINESCOPE_BATCH_SIZE");
    }
}
