//! Registry error types.

use thiserror::Error;

/// Errors from tile registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A tile with the same ID is already registered
    #[error("Tile '{0}' is already registered")]
    DuplicateTile(String),

    /// No tile with the given ID exists
    #[error("Tile '{0}' not found")]
    TileNotFound(String),
}
