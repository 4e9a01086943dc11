//! Output formatting helpers for CLI commands

use crate::config::TileConfig;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

/// View model for tile display
#[derive(Debug, Clone, serde::Serialize)]
pub struct TileConfigView {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub source: String,
    pub refresh_seconds: u64,
    pub inputs: Vec<String>,
}

impl From<&TileConfig> for TileConfigView {
    fn from(tile: &TileConfig) -> Self {
        Self {
            id: tile.id.clone(),
            title: tile.title.clone(),
            kind: format!("{:?}", tile.kind).to_lowercase(),
            source: tile.source.clone(),
            refresh_seconds: tile.refresh_seconds,
            inputs: tile.inputs.clone(),
        }
    }
}

/// Format tiles as a table
pub fn format_tiles_table(tiles: &[TileConfigView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Title", "Kind", "Source", "Refresh", "Inputs"]);

    for tile in tiles {
        let refresh = if tile.refresh_seconds == 0 {
            "manual".yellow().to_string()
        } else {
            format!("{}s", tile.refresh_seconds).green().to_string()
        };

        table.add_row(vec![
            Cell::new(&tile.id),
            Cell::new(&tile.title),
            Cell::new(&tile.kind),
            Cell::new(&tile.source),
            Cell::new(refresh),
            Cell::new(if tile.inputs.is_empty() {
                "-".to_string()
            } else {
                tile.inputs.join(", ")
            }),
        ]);
    }

    table.to_string()
}

/// Format tiles as JSON
pub fn format_tiles_json(tiles: &[TileConfigView]) -> String {
    serde_json::to_string_pretty(&json!({
        "tiles": tiles
    }))
    .unwrap()
}
