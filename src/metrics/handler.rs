//! # Metrics HTTP Handlers
//!
//! Axum handlers for metrics endpoints.

use super::{CacheSnapshot, RenderStats, StatsResponse, TileStats};
use crate::api::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Handler for GET /metrics endpoint (Prometheus text format).
///
/// Returns metrics in Prometheus exposition format for scraping.
/// Always returns 200 with the correct Content-Type for Prometheus scrapers,
/// even if no metrics have been recorded yet (returns empty text).
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Update gauges before rendering
    state.metrics_collector.update_gauges();

    let metrics = state.metrics_collector.render_metrics();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        metrics,
    )
}

/// Handler for GET /api/stats endpoint (JSON format).
///
/// Returns aggregated statistics in JSON format for dashboards and debugging.
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics_collector.update_gauges();

    let uptime_seconds = state.metrics_collector.uptime_seconds();
    let tiles = compute_tile_stats(state.metrics_collector.registry());
    let renders = compute_render_stats(&tiles);
    let cache = compute_cache_snapshot(state.metrics_collector.cache());
    let pools = state.pool.stats();

    Json(StatsResponse {
        uptime_seconds,
        renders,
        cache,
        tiles,
        pools,
    })
}

/// Compute aggregate render statistics by summing per-tile totals.
pub fn compute_render_stats(tiles: &[TileStats]) -> RenderStats {
    let success: u64 = tiles.iter().map(|t| t.renders).sum();
    let errors: u64 = tiles.iter().map(|t| t.errors).sum();
    RenderStats {
        total: success + errors,
        success,
        errors,
    }
}

/// Compute per-tile statistics from Registry atomics.
pub fn compute_tile_stats(registry: &crate::registry::Registry) -> Vec<TileStats> {
    let mut tiles: Vec<TileStats> = registry
        .get_all_tiles()
        .into_iter()
        .map(|tile| TileStats {
            id: tile.id.clone(),
            status: tile.status,
            renders: tile.render_count.load(Ordering::SeqCst),
            errors: tile.error_count.load(Ordering::SeqCst),
            avg_render_ms: tile.avg_render_ms.load(Ordering::SeqCst),
        })
        .collect();
    tiles.sort_by(|a, b| a.id.cmp(&b.id));
    tiles
}

/// Compute a cache statistics snapshot from the cache atomics.
pub fn compute_cache_snapshot(cache: &crate::cache::TileCache) -> CacheSnapshot {
    let stats = cache.stats();
    CacheSnapshot {
        hits: stats.hits.load(Ordering::Relaxed),
        misses: stats.misses.load(Ordering::Relaxed),
        hit_rate: stats.hit_rate(),
        entries: stats.entry_count(),
        size_bytes: stats.size_bytes(),
        evictions: stats.evictions.load(Ordering::Relaxed),
        expired: stats.expired.load(Ordering::Relaxed),
    }
}
