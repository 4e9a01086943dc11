//! HTTP handlers for dashboard routes

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use rust_embed::RustEmbed;
use std::sync::Arc;

use crate::api::AppState;
use crate::registry::TileView;

/// Embedded dashboard assets from assets/ directory
#[derive(RustEmbed)]
#[folder = "assets/"]
struct DashboardAssets;

/// Serves the main dashboard HTML page with the tile list injected
pub async fn dashboard_handler(State(state): State<Arc<AppState>>) -> Response {
    match DashboardAssets::get("index.html") {
        Some(content) => {
            let body = content.data;
            let html = match std::str::from_utf8(&body) {
                Ok(html) => html,
                Err(_) => {
                    return (StatusCode::INTERNAL_SERVER_ERROR, "Invalid HTML encoding")
                        .into_response()
                }
            };

            let mut tiles: Vec<TileView> = state
                .registry
                .get_all_tiles()
                .iter()
                .map(TileView::from)
                .collect();
            tiles.sort_by(|a, b| a.id.cmp(&b.id));
            let tiles_json = serde_json::to_string(&tiles).unwrap_or_else(|_| "[]".to_string());

            let initial_data = format!(r#"{{"tiles":{}}}"#, tiles_json);

            // Inject initial data into the HTML template
            let updated_html = html.replace(
                r#"<script id="initial-data" type="application/json">
        {}
    </script>"#,
                &format!(
                    r#"<script id="initial-data" type="application/json">
        {}
    </script>"#,
                    initial_data
                ),
            );

            Html(updated_html).into_response()
        }
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Dashboard HTML not found",
        )
            .into_response(),
    }
}

/// Serves static assets (CSS, JS, etc.)
pub async fn assets_handler(Path(path): Path<String>) -> Response {
    match DashboardAssets::get(&path) {
        Some(content) => {
            let body = content.data;
            let mime_type = mime_guess::from_path(&path).first_or_octet_stream();

            ([(header::CONTENT_TYPE, mime_type.as_ref())], body).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Asset not found").into_response(),
    }
}
