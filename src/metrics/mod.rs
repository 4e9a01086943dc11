//! # Metrics Collection Module
//!
//! Provides render metrics tracking, Prometheus export, and JSON stats API.
//!
//! ## Overview
//!
//! This module exposes two endpoints:
//! - `GET /metrics` - Prometheus text format metrics
//! - `GET /api/stats` - JSON format statistics
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `mosaic_renders_total{tile, status}` - Total tile renders
//! - `mosaic_callbacks_total{output, status}` - Callback invocations
//! - `mosaic_sanitizer_removals_total{tile}` - Nodes removed by the sanitizer
//! - `mosaic_cache_hits_total` / `mosaic_cache_misses_total` - Cache outcomes
//!
//! **Histograms:**
//! - `mosaic_render_duration_seconds{tile}` - Render duration
//!
//! **Gauges:**
//! - `mosaic_tiles_total` - Registered tiles
//! - `mosaic_tiles_ready` - Tiles in ready state
//! - `mosaic_cache_entries` - Cached fragments
//! - `mosaic_cache_size_bytes` - Cached fragment bytes
//! - `mosaic_pool_in_use{source}` - Checked-out source permits

pub mod handler;
pub mod types;

pub use types::*;

// Re-export PrometheusBuilder for test compatibility
pub use metrics_exporter_prometheus::PrometheusBuilder;

use crate::cache::TileCache;
use crate::registry::{Registry, TileStatus};
use crate::source::SourcePool;
use dashmap::DashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Central coordinator for metrics collection and gauge computation.
pub struct MetricsCollector {
    /// Reference to the tile registry for computing gauges
    registry: Arc<Registry>,
    /// Reference to the fragment cache for size gauges
    cache: Arc<TileCache>,
    /// Reference to the source pool for permit gauges
    pool: Arc<SourcePool>,
    /// Server startup time for uptime calculation
    start_time: Instant,
    /// Thread-safe cache for sanitized Prometheus labels
    label_cache: DashMap<String, String>,
    /// Prometheus handle for rendering metrics
    prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl MetricsCollector {
    /// Create a new MetricsCollector.
    pub fn new(
        registry: Arc<Registry>,
        cache: Arc<TileCache>,
        pool: Arc<SourcePool>,
        start_time: Instant,
        prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        Self {
            registry,
            cache,
            pool,
            start_time,
            label_cache: DashMap::new(),
            prometheus_handle,
        }
    }

    /// Get sanitized Prometheus label (cached for performance).
    ///
    /// Prometheus label names must match regex: `[a-zA-Z_][a-zA-Z0-9_]*`
    /// This function replaces invalid characters with underscores.
    pub fn sanitize_label(&self, label: &str) -> String {
        if let Some(cached) = self.label_cache.get(label) {
            return cached.clone();
        }

        let mut sanitized = label
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect::<String>();

        // Ensure first character is not a digit
        if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            sanitized.insert(0, '_');
        }

        self.label_cache
            .insert(label.to_string(), sanitized.clone());
        sanitized
    }

    /// Update state gauges from the registry and cache.
    pub fn update_gauges(&self) {
        let tiles = self.registry.get_all_tiles();

        metrics::gauge!("mosaic_tiles_total").set(tiles.len() as f64);

        let ready = tiles
            .iter()
            .filter(|t| t.status == TileStatus::Ready)
            .count();
        metrics::gauge!("mosaic_tiles_ready").set(ready as f64);

        let stats = self.cache.stats();
        metrics::gauge!("mosaic_cache_entries").set(stats.entry_count() as f64);
        metrics::gauge!("mosaic_cache_size_bytes").set(stats.size_bytes() as f64);
        metrics::counter!("mosaic_cache_hits_total").absolute(stats.hits.load(Ordering::Relaxed));
        metrics::counter!("mosaic_cache_misses_total")
            .absolute(stats.misses.load(Ordering::Relaxed));

        for pool_stats in self.pool.stats() {
            let source = self.sanitize_label(&pool_stats.source);
            metrics::gauge!("mosaic_pool_in_use", "source" => source)
                .set(pool_stats.in_use as f64);
        }
    }

    /// Record a completed render in the Prometheus counters.
    pub fn record_render(&self, tile_id: &str, duration_secs: f64, success: bool) {
        let tile = self.sanitize_label(tile_id);
        let status = if success { "ok" } else { "error" };
        metrics::counter!("mosaic_renders_total", "tile" => tile.clone(), "status" => status)
            .increment(1);
        metrics::histogram!("mosaic_render_duration_seconds", "tile" => tile)
            .record(duration_secs);
    }

    /// Record a callback invocation outcome.
    pub fn record_callback(&self, output: &str, status: &'static str) {
        let output = self.sanitize_label(output);
        metrics::counter!("mosaic_callbacks_total", "output" => output, "status" => status)
            .increment(1);
    }

    /// Record sanitizer removals for a tile's fragment.
    pub fn record_sanitizer_removals(&self, tile_id: &str, removals: u64) {
        if removals == 0 {
            return;
        }
        let tile = self.sanitize_label(tile_id);
        metrics::counter!("mosaic_sanitizer_removals_total", "tile" => tile).increment(removals);
    }

    /// Get uptime in seconds since server startup.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get reference to the registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Get reference to the fragment cache.
    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Initialize Prometheus metrics exporter with custom histogram buckets.
///
/// Render durations are sub-second for cached and fixture tiles but can
/// reach seconds for slow upstreams, so the buckets span 1ms to 10s.
///
/// Returns a PrometheusHandle that can be used to render metrics.
pub fn setup_metrics(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

    let duration_buckets = &[
        0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("mosaic_render_duration_seconds".to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}
