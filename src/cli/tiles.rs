//! Tiles command implementation

use crate::cli::output::{format_tiles_json, format_tiles_table, TileConfigView};
use crate::cli::TilesArgs;
use crate::config::MosaicConfig;

/// Handle `mosaic tiles` command
pub fn handle_tiles(args: &TilesArgs) -> Result<String, Box<dyn std::error::Error>> {
    let config = if args.config.exists() {
        MosaicConfig::load(Some(&args.config))?
    } else {
        MosaicConfig::default()
    };

    let mut views: Vec<TileConfigView> = config
        .tiles
        .iter()
        .filter(|tile| {
            args.source
                .as_deref()
                .map(|s| tile.source == s)
                .unwrap_or(true)
        })
        .map(TileConfigView::from)
        .collect();
    views.sort_by(|a, b| a.id.cmp(&b.id));

    if args.json {
        Ok(format_tiles_json(&views))
    } else if views.is_empty() {
        Ok("No tiles configured.".to_string())
    } else {
        Ok(format_tiles_table(&views))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[[sources]]
name = "fixture"
kind = "static"

[[tiles]]
id = "sales"
title = "Sales"
source = "fixture"

[[tiles]]
id = "errors"
title = "Errors"
source = "fixture"
"#;

    fn args(config: PathBuf, json: bool, source: Option<String>) -> TilesArgs {
        TilesArgs {
            json,
            source,
            config,
        }
    }

    #[test]
    fn test_tiles_table_output_sorted() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), SAMPLE).unwrap();

        let output = handle_tiles(&args(temp.path().to_path_buf(), false, None)).unwrap();
        let errors_pos = output.find("errors").unwrap();
        let sales_pos = output.find("sales").unwrap();
        assert!(errors_pos < sales_pos);
    }

    #[test]
    fn test_tiles_json_output() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), SAMPLE).unwrap();

        let output = handle_tiles(&args(temp.path().to_path_buf(), true, None)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["tiles"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_tiles_source_filter() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), SAMPLE).unwrap();

        let output = handle_tiles(&args(
            temp.path().to_path_buf(),
            true,
            Some("missing".to_string()),
        ))
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert!(parsed["tiles"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_tiles_missing_config_uses_defaults() {
        let output =
            handle_tiles(&args(PathBuf::from("nonexistent.toml"), false, None)).unwrap();
        assert!(output.contains("No tiles configured"));
    }
}
