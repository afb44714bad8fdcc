//! # CineScope Core
//!
//! Shared building blocks for the CineScope movie-discovery platform:
//! configuration loading and the common error type used at crate boundaries.
//!
//! ## Modules
//!
//! - `config`: Configuration loading and validation
//! - `error`: Error types and handling

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{load_dotenv, ConfigLoader, IngestConfig, StoreConfig};
pub use error::CineScopeError;
