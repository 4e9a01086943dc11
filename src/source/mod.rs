//! Data sources for tile rendering.
//!
//! A [`DataSource`] turns a query into tabular [`TileData`]. Two kinds are
//! supported: inline fixtures (rows defined in configuration) and remote
//! JSON endpoints fetched over HTTP. Fetches go through a [`SourcePool`]
//! that bounds concurrency per source.

mod error;
mod fixture;
mod http;
mod pool;

pub use error::SourceError;
pub use fixture::FixtureSource;
pub use http::HttpSource;
pub use pool::{PoolStats, SourcePool};

use async_trait::async_trait;

/// Query parameters forwarded to a source fetch.
#[derive(Debug, Clone, Default)]
pub struct SourceQuery {
    /// Name/value pairs, as received from the tile request
    pub params: Vec<(String, String)>,
}

impl SourceQuery {
    pub fn new(params: Vec<(String, String)>) -> Self {
        Self { params }
    }

    /// Look up a single parameter by name (first match).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Tabular data fetched from a source.
#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    /// Column names, in render order
    pub columns: Vec<String>,
    /// Row values, aligned with `columns`; missing cells are `Null`
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl TileData {
    /// Empty data set.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Build from a JSON array of objects.
    ///
    /// Column order comes from the first row; later rows may omit columns
    /// (filled with `Null`) but unknown extra keys are ignored.
    pub fn from_json_rows(source: &str, value: &serde_json::Value) -> Result<Self, SourceError> {
        let rows = value.as_array().ok_or_else(|| SourceError::Decode {
            name: source.to_string(),
            message: "expected a JSON array of objects".to_string(),
        })?;

        let mut data = Self::empty();
        for (i, row) in rows.iter().enumerate() {
            let object = row.as_object().ok_or_else(|| SourceError::Decode {
                name: source.to_string(),
                message: format!("row {} is not an object", i),
            })?;
            if data.columns.is_empty() {
                data.columns = object.keys().cloned().collect();
            }
            let values = data
                .columns
                .iter()
                .map(|c| object.get(c).cloned().unwrap_or(serde_json::Value::Null))
                .collect();
            data.rows.push(values);
        }
        Ok(data)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// A named data source that can be queried for rows.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Source name, as referenced by tile configs.
    fn name(&self) -> &str;

    /// Fetch rows for the given query.
    async fn fetch(&self, query: &SourceQuery) -> Result<TileData, SourceError>;
}
