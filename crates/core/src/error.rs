//! Error types shared across CineScope crates

use thiserror::Error;

/// Common error type for CineScope services
#[derive(Debug, Error)]
pub enum CineScopeError {
    /// Configuration loading or validation failed
    #[error("Configuration error: {message}")]
    ConfigurationError {
        message: String,
        /// The environment variable that caused the error, if applicable
        key: Option<String>,
    },

    /// Input data failed validation
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl CineScopeError {
    /// Construct a configuration error without an associated environment key
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = CineScopeError::ConfigurationError {
            message: "batch size must be greater than 0".to_string(),
            key: Some("CINESCOPE_BATCH_SIZE".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Configuration error: batch size must be greater than 0"
        );
    }

    #[test]
    fn test_config_helper_has_no_key() {
        let err = CineScopeError::config("bad value");
        assert!(matches!(
            err,
            CineScopeError::ConfigurationError { key: None, .. }
        ));
    }
}
