//! Tile entity and serializable view types.

use crate::config::{TileConfig, TileKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Render state of a registered tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TileStatus {
    /// Never rendered yet
    #[default]
    Unknown,
    /// Last render succeeded
    Ready,
    /// Last render succeeded but the cached copy has expired
    Stale,
    /// Last render failed
    Failed,
}

/// A registered dashboard tile.
///
/// Counters are atomics so the registry can record renders without taking
/// a write lock on the whole entry.
#[derive(Debug)]
pub struct Tile {
    pub id: String,
    pub title: String,
    pub kind: TileKind,
    pub source: String,
    pub refresh_seconds: u64,
    pub debounce_ms: u64,
    pub max_rows: usize,
    pub inputs: Vec<String>,
    pub status: TileStatus,
    pub last_rendered: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Total successful renders
    pub render_count: AtomicU64,
    /// Total failed renders
    pub error_count: AtomicU64,
    /// Rolling average render latency in milliseconds (EMA)
    pub avg_render_ms: AtomicU32,
}

impl Tile {
    /// Build a tile from its configuration entry.
    pub fn from_config(config: &TileConfig) -> Self {
        Self {
            id: config.id.clone(),
            title: config.title.clone(),
            kind: config.kind,
            source: config.source.clone(),
            refresh_seconds: config.refresh_seconds,
            debounce_ms: config.debounce_ms,
            max_rows: config.max_rows,
            inputs: config.inputs.clone(),
            status: TileStatus::Unknown,
            last_rendered: None,
            last_error: None,
            render_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            avg_render_ms: AtomicU32::new(0),
        }
    }

    /// Deep copy including current atomic counter values.
    pub fn snapshot(&self) -> Self {
        Self {
            id: self.id.clone(),
            title: self.title.clone(),
            kind: self.kind,
            source: self.source.clone(),
            refresh_seconds: self.refresh_seconds,
            debounce_ms: self.debounce_ms,
            max_rows: self.max_rows,
            inputs: self.inputs.clone(),
            status: self.status,
            last_rendered: self.last_rendered,
            last_error: self.last_error.clone(),
            render_count: AtomicU64::new(self.render_count.load(Ordering::SeqCst)),
            error_count: AtomicU64::new(self.error_count.load(Ordering::SeqCst)),
            avg_render_ms: AtomicU32::new(self.avg_render_ms.load(Ordering::SeqCst)),
        }
    }
}

/// Serializable tile summary for API responses and the dashboard page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileView {
    pub id: String,
    pub title: String,
    pub kind: TileKind,
    pub source: String,
    pub status: TileStatus,
    pub refresh_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_rendered: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub render_count: u64,
    pub error_count: u64,
    pub avg_render_ms: u32,
}

impl From<&Tile> for TileView {
    fn from(tile: &Tile) -> Self {
        Self {
            id: tile.id.clone(),
            title: tile.title.clone(),
            kind: tile.kind,
            source: tile.source.clone(),
            status: tile.status,
            refresh_seconds: tile.refresh_seconds,
            last_rendered: tile.last_rendered,
            last_error: tile.last_error.clone(),
            render_count: tile.render_count.load(Ordering::SeqCst),
            error_count: tile.error_count.load(Ordering::SeqCst),
            avg_render_ms: tile.avg_render_ms.load(Ordering::SeqCst),
        }
    }
}
