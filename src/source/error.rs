//! Data source error types.

use thiserror::Error;

/// Errors from data source fetches and pool checkout.
#[derive(Debug, Error)]
pub enum SourceError {
    /// No source registered under this name
    #[error("Unknown data source '{0}'")]
    UnknownSource(String),

    /// All pool permits for the source are in use and the wait timed out
    #[error("Source '{name}' pool exhausted ({pool_size} permits)")]
    PoolExhausted { name: String, pool_size: usize },

    /// The upstream endpoint failed or returned a non-success status
    #[error("Source '{name}' upstream error: {message}")]
    Upstream { name: String, message: String },

    /// The upstream payload could not be decoded into rows
    #[error("Source '{name}' returned invalid rows: {message}")]
    Decode { name: String, message: String },
}
