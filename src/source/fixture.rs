//! Inline fixture source.

use super::{DataSource, SourceError, SourceQuery, TileData};
use async_trait::async_trait;

/// Data source backed by rows defined inline in configuration.
///
/// Query parameters that match a column name filter rows by string
/// equality against that column, so `?region=emea` narrows a fixture the
/// same way it would narrow a remote query.
pub struct FixtureSource {
    name: String,
    data: TileData,
}

impl FixtureSource {
    pub fn new(name: impl Into<String>, data: TileData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Build from the `rows` value of a static source config.
    pub fn from_config_rows(
        name: &str,
        rows: Option<&serde_json::Value>,
    ) -> Result<Self, SourceError> {
        let data = match rows {
            Some(value) => TileData::from_json_rows(name, value)?,
            None => TileData::empty(),
        };
        Ok(Self::new(name, data))
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<TileData, SourceError> {
        let mut result = TileData {
            columns: self.data.columns.clone(),
            rows: Vec::new(),
        };

        'rows: for row in &self.data.rows {
            for (param, wanted) in &query.params {
                if let Some(col) = self.data.columns.iter().position(|c| c == param) {
                    let cell = &row[col];
                    let cell_str = match cell {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    if &cell_str != wanted {
                        continue 'rows;
                    }
                }
            }
            result.rows.push(row.clone());
        }

        Ok(result)
    }
}
