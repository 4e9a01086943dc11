//! Tile listing and rendering handlers.

use super::types::{ApiError, TileListResponse};
use super::AppState;
use crate::cache::CacheKey;
use crate::history::{HistoryEntry, RenderStatus};
use crate::registry::{TileStatus, TileView};
use crate::source::SourceQuery;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;

/// Header reporting whether a fragment came from the cache.
pub const CACHE_HEADER: &str = "x-mosaic-cache";

/// A rendered fragment ready to be served.
pub struct RenderOutcome {
    pub html: Bytes,
    pub cache_hit: bool,
    pub duration_ms: u64,
}

/// GET /api/tiles - List all registered tiles.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<TileListResponse> {
    let mut tiles: Vec<TileView> = state
        .registry
        .get_all_tiles()
        .iter()
        .map(TileView::from)
        .collect();
    tiles.sort_by(|a, b| a.id.cmp(&b.id));
    let count = tiles.len();
    Json(TileListResponse { tiles, count })
}

/// GET /api/tiles/:id - Render a tile fragment.
///
/// Query parameters are forwarded to the tile's data source and become
/// part of the cache key. The `x-mosaic-cache` response header reports
/// `hit` or `miss`.
pub async fn render(
    State(state): State<Arc<AppState>>,
    Path(tile_id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = render_fragment(&state, &tile_id, &params).await?;
    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE.as_str(),
                "text/html; charset=utf-8".to_string(),
            ),
            (
                CACHE_HEADER,
                if outcome.cache_hit { "hit" } else { "miss" }.to_string(),
            ),
        ],
        outcome.html,
    ))
}

/// Run the full render pipeline for one tile.
///
/// validate -> cache lookup -> source fetch -> render -> sanitize -> cache
/// store. Every completed attempt lands in the history feed; fetch and
/// render outcomes land in the registry counters.
pub async fn render_fragment(
    state: &AppState,
    tile_id: &str,
    params: &[(String, String)],
) -> Result<RenderOutcome, ApiError> {
    crate::validate::validate_tile_id(tile_id)
        .map_err(|e| ApiError::bad_request(&e.to_string(), Some("tile_id")))?;

    let tile = state.registry.get_tile(tile_id).ok_or_else(|| {
        let mut available: Vec<String> = state
            .registry
            .get_all_tiles()
            .into_iter()
            .map(|t| t.id)
            .collect();
        available.sort();
        ApiError::tile_not_found(tile_id, &available)
    })?;

    let start = find_param(params, "start");
    let end = find_param(params, "end");
    match (start, end) {
        (Some(start), Some(end)) => {
            crate::validate::validate_date_range(start, end).map_err(|e| {
                let field = e.field.clone();
                ApiError::bad_request(&e.to_string(), Some(&field))
            })?;
        }
        // A lone date still has to parse even without a range to check.
        (Some(start), None) => {
            crate::validate::validate_date("start", start)
                .map_err(|e| ApiError::bad_request(&e.to_string(), Some("start")))?;
        }
        (None, Some(end)) => {
            crate::validate::validate_date("end", end)
                .map_err(|e| ApiError::bad_request(&e.to_string(), Some("end")))?;
        }
        (None, None) => {}
    }
    if let Some(report) = find_param(params, "report") {
        crate::validate::validate_report_id(report)
            .map_err(|e| ApiError::bad_request(&e.to_string(), Some("report")))?;
    }

    let key = CacheKey::new(tile_id, params);
    let render_id = crate::logging::render_id();
    let started = Instant::now();

    if state.config.cache.enabled {
        if let Some(html) = state.cache.get(&key).await {
            let duration_ms = started.elapsed().as_millis() as u64;
            state.history.record(HistoryEntry {
                timestamp: chrono::Utc::now(),
                tile_id: tile.id.clone(),
                source: tile.source.clone(),
                duration_ms,
                status: RenderStatus::Ok,
                cache_hit: true,
                error_message: None,
            });
            tracing::debug!(render_id = %render_id, tile_id = %tile.id, "cache hit");
            return Ok(RenderOutcome {
                html,
                cache_hit: true,
                duration_ms,
            });
        }
    }

    let query = SourceQuery::new(params.to_vec());
    let data = match state.pool.fetch(&tile.source, &query).await {
        Ok(data) => data,
        Err(err) => {
            let duration_ms = started.elapsed().as_millis() as u64;
            let message = err.to_string();
            record_failure(state, &tile.id, &tile.source, duration_ms, &message);
            tracing::warn!(
                render_id = %render_id,
                tile_id = %tile.id,
                source = %tile.source,
                error = %message,
                "fetch failed"
            );
            return Err(err.into());
        }
    };

    let fragment = crate::render::render_tile(&tile, &data, &state.sanitizer);
    // Last gate before anything reaches a browser: the assembled fragment
    // goes through the sanitizer whole, so a hostile cell value cannot
    // smuggle markup past the per-cell handling.
    let sanitized = state.sanitizer.sanitize(&fragment);
    state
        .metrics_collector
        .record_sanitizer_removals(&tile.id, sanitized.removals);

    let html = Bytes::from(sanitized.html);
    if state.config.cache.enabled {
        state.cache.set(&key, html.clone(), None).await;
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    let _ = state
        .registry
        .update_status(&tile.id, TileStatus::Ready, None);
    let _ = state
        .registry
        .record_render(&tile.id, duration_ms as u32, true);
    state
        .metrics_collector
        .record_render(&tile.id, started.elapsed().as_secs_f64(), true);
    state.history.record(HistoryEntry {
        timestamp: chrono::Utc::now(),
        tile_id: tile.id.clone(),
        source: tile.source.clone(),
        duration_ms,
        status: RenderStatus::Ok,
        cache_hit: false,
        error_message: None,
    });
    tracing::info!(
        render_id = %render_id,
        tile_id = %tile.id,
        source = %tile.source,
        duration_ms,
        rows = data.row_count(),
        "tile rendered"
    );

    Ok(RenderOutcome {
        html,
        cache_hit: false,
        duration_ms,
    })
}

fn record_failure(state: &AppState, tile_id: &str, source: &str, duration_ms: u64, message: &str) {
    let _ = state
        .registry
        .update_status(tile_id, TileStatus::Failed, Some(message.to_string()));
    let _ = state
        .registry
        .record_render(tile_id, duration_ms as u32, false);
    state
        .metrics_collector
        .record_render(tile_id, duration_ms as f64 / 1000.0, false);
    state.history.record(HistoryEntry {
        timestamp: chrono::Utc::now(),
        tile_id: tile_id.to_string(),
        source: source.to_string(),
        duration_ms,
        status: RenderStatus::Error,
        cache_hit: false,
        error_message: Some(message.to_string()),
    });
}

fn find_param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}
