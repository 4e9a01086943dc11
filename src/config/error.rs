//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file does not exist
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read the configuration file
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse failure
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A field failed validation
    #[error("Invalid configuration: {field}: {message}")]
    Validation { field: String, message: String },

    /// Tile input dependencies form a cycle
    #[error("Circular tile dependency detected involving '{tile}'")]
    CircularDependency { tile: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::Validation {
            field: "server.port".to_string(),
            message: "port must be non-zero".to_string(),
        };
        assert!(err.to_string().contains("server.port"));
    }

    #[test]
    fn test_not_found_display() {
        let err = ConfigError::NotFound(PathBuf::from("/tmp/missing.toml"));
        assert!(err.to_string().contains("missing.toml"));
    }

    #[test]
    fn test_circular_dependency_display() {
        let err = ConfigError::CircularDependency {
            tile: "summary".to_string(),
        };
        assert!(err.to_string().contains("summary"));
    }
}
