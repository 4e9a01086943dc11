//! Health check endpoint handler.

use crate::api::AppState;
use crate::registry::TileStatus;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub tiles: TileCounts,
    pub sources: usize,
}

/// Tile state counts.
#[derive(Debug, Serialize)]
pub struct TileCounts {
    pub total: usize,
    pub ready: usize,
    pub failed: usize,
}

/// GET /health - Return system health status.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let tiles = state.registry.get_all_tiles();
    let ready = tiles
        .iter()
        .filter(|t| t.status == TileStatus::Ready)
        .count();
    let failed = tiles
        .iter()
        .filter(|t| t.status == TileStatus::Failed)
        .count();

    let status = match (failed, tiles.len()) {
        (0, _) => "healthy",
        (f, t) if f < t => "degraded",
        _ => "unhealthy",
    };

    Json(HealthResponse {
        status: status.to_string(),
        uptime_seconds: state.metrics_collector.uptime_seconds(),
        tiles: TileCounts {
            total: tiles.len(),
            ready,
            failed,
        },
        sources: state.pool.source_count(),
    })
}
