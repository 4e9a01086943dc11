//! Shared test utilities for Mosaic integration tests.
//!
//! Provides reusable helpers for creating tile configs, data sources, and
//! a fully wired test application to reduce duplication across test files.

#![allow(dead_code)]

use mosaic::api::{create_router, AppState};
use mosaic::config::{MosaicConfig, SourceConfig, SourceKind, TileConfig, TileKind};
use std::sync::Arc;

/// Create a minimal table tile bound to a source.
pub fn make_tile_config(id: &str, source: &str) -> TileConfig {
    TileConfig {
        id: id.to_string(),
        title: format!("Tile {}", id),
        kind: TileKind::Table,
        source: source.to_string(),
        refresh_seconds: 0,
        debounce_ms: 0,
        max_rows: 100,
        inputs: vec![],
    }
}

/// Create a tile that declares callback inputs.
pub fn make_dependent_tile(id: &str, source: &str, inputs: &[&str], debounce_ms: u64) -> TileConfig {
    TileConfig {
        inputs: inputs.iter().map(|s| s.to_string()).collect(),
        debounce_ms,
        ..make_tile_config(id, source)
    }
}

/// Create a static source with a small fixed row set.
pub fn make_fixture_source(name: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        kind: SourceKind::Static,
        url: None,
        rows: Some(serde_json::json!([
            {"region": "emea", "total": 42},
            {"region": "apac", "total": 17},
        ])),
        pool_size: 2,
    }
}

/// Create an HTTP source pointed at a mock server.
pub fn make_http_source(name: &str, url: &str) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        kind: SourceKind::Http,
        url: Some(url.to_string()),
        rows: None,
        pool_size: 2,
    }
}

/// Config with one fixture source and one tile bound to it.
pub fn make_test_config() -> MosaicConfig {
    MosaicConfig {
        tiles: vec![make_tile_config("sales", "fixture")],
        sources: vec![make_fixture_source("fixture")],
        ..Default::default()
    }
}

/// Build state for a custom config.
pub fn make_test_state(config: MosaicConfig) -> Arc<AppState> {
    Arc::new(AppState::from_config(Arc::new(config)).expect("test config must be valid"))
}

/// Build a router plus its state for a custom config.
pub fn create_test_app_with(config: MosaicConfig) -> (axum::Router, Arc<AppState>) {
    let state = make_test_state(config);
    (create_router(Arc::clone(&state)), state)
}

/// Build a router for the default one-tile config.
pub fn create_test_app() -> axum::Router {
    create_test_app_with(make_test_config()).0
}
