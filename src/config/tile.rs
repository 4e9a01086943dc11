//! Tile and data source definitions.

use serde::{Deserialize, Serialize};

/// How a tile renders its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// HTML table with a header row
    #[default]
    Table,
    /// Unordered list, one item per row
    List,
}

/// A static tile definition from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileConfig {
    /// Tile identifier (validated against the tile-ID format)
    pub id: String,
    /// Human-readable title rendered as the fragment caption
    pub title: String,
    /// Rendering style
    #[serde(default)]
    pub kind: TileKind,
    /// Name of the data source this tile reads from
    pub source: String,
    /// Background refresh interval in seconds (0 disables refresh)
    #[serde(default)]
    pub refresh_seconds: u64,
    /// Minimum milliseconds between callback dispatches for this tile
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Maximum number of data rows rendered
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    /// Tile IDs whose output this tile depends on (callback inputs)
    #[serde(default)]
    pub inputs: Vec<String>,
}

fn default_debounce_ms() -> u64 {
    250
}

fn default_max_rows() -> usize {
    100
}

/// Data source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Rows defined inline in the configuration
    Static,
    /// Remote JSON endpoint fetched over HTTP
    Http,
}

/// A named data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    /// Endpoint URL (required for `http` sources)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Inline rows (for `static` sources): array of objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<serde_json::Value>,
    /// Maximum concurrent fetches against this source
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_config_minimal_toml() {
        let toml = r#"
        id = "sales"
        title = "Sales by region"
        source = "warehouse"
        "#;
        let tile: TileConfig = toml::from_str(toml).unwrap();
        assert_eq!(tile.id, "sales");
        assert_eq!(tile.kind, TileKind::Table);
        assert_eq!(tile.refresh_seconds, 0);
        assert_eq!(tile.debounce_ms, 250);
        assert_eq!(tile.max_rows, 100);
        assert!(tile.inputs.is_empty());
    }

    #[test]
    fn test_tile_config_full_toml() {
        let toml = r#"
        id = "summary"
        title = "Summary"
        kind = "list"
        source = "warehouse"
        refresh_seconds = 60
        debounce_ms = 500
        max_rows = 10
        inputs = ["sales", "inventory"]
        "#;
        let tile: TileConfig = toml::from_str(toml).unwrap();
        assert_eq!(tile.kind, TileKind::List);
        assert_eq!(tile.refresh_seconds, 60);
        assert_eq!(tile.inputs, vec!["sales", "inventory"]);
    }

    #[test]
    fn test_source_config_http() {
        let toml = r#"
        name = "warehouse"
        kind = "http"
        url = "http://127.0.0.1:9001/rows"
        pool_size = 8
        "#;
        let source: SourceConfig = toml::from_str(toml).unwrap();
        assert_eq!(source.kind, SourceKind::Http);
        assert_eq!(source.pool_size, 8);
    }

    #[test]
    fn test_source_config_static_rows() {
        let toml = r#"
        name = "fixture"
        kind = "static"
        rows = [{ region = "emea", total = 42 }]
        "#;
        let source: SourceConfig = toml::from_str(toml).unwrap();
        assert_eq!(source.kind, SourceKind::Static);
        assert!(source.rows.is_some());
        assert_eq!(source.pool_size, 4);
    }
}
