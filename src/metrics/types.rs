//! # Metrics Types
//!
//! Data structures for JSON stats API responses.

use crate::source::PoolStats;
use serde::Serialize;

/// JSON response for GET /api/stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Server uptime in seconds since startup
    pub uptime_seconds: u64,
    /// Aggregate render statistics
    pub renders: RenderStats,
    /// Cache statistics
    pub cache: CacheSnapshot,
    /// Per-tile breakdown
    pub tiles: Vec<TileStats>,
    /// Per-source pool breakdown
    pub pools: Vec<PoolStats>,
}

/// Aggregate render statistics.
#[derive(Debug, Clone, Serialize)]
pub struct RenderStats {
    /// Total renders recorded
    pub total: u64,
    /// Successful renders
    pub success: u64,
    /// Failed renders
    pub errors: u64,
}

/// Cache statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSnapshot {
    pub hits: u64,
    pub misses: u64,
    /// Hit rate as a percentage (0-100)
    pub hit_rate: f64,
    pub entries: u64,
    pub size_bytes: u64,
    pub evictions: u64,
    pub expired: u64,
}

/// Per-tile statistics.
#[derive(Debug, Clone, Serialize)]
pub struct TileStats {
    /// Tile identifier
    pub id: String,
    /// Current render state
    pub status: crate::registry::TileStatus,
    /// Total successful renders
    pub renders: u64,
    /// Total failed renders
    pub errors: u64,
    /// Rolling average render latency in milliseconds
    pub avg_render_ms: u32,
}
