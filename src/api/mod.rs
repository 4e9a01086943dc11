//! # Dashboard API
//!
//! HTTP endpoints for the Mosaic dashboard server.
//!
//! ## Endpoints
//!
//! - `GET /api/tiles` - List registered tiles
//! - `GET /api/tiles/:id` - Render a tile fragment (HTML)
//! - `POST /api/callback` - Re-render a tile because its inputs changed
//! - `GET /api/history` - Recent render history
//! - `GET /api/stats` - JSON statistics
//! - `GET /health` - System health status with tile counts
//! - `GET /metrics` - Prometheus text format metrics
//! - `GET /` - Embedded dashboard page
//!
//! ## Example
//!
//! ```no_run
//! use mosaic::api::{AppState, create_router};
//! use mosaic::config::MosaicConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(MosaicConfig::default());
//! let state = Arc::new(AppState::from_config(config)?);
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8050").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! A tile request flows through a fixed pipeline:
//! 1. Tile ID and query parameters validated
//! 2. Fragment cache consulted (key: tile ID plus sorted parameters)
//! 3. On miss, rows fetched from the tile's pooled data source
//! 4. Rows rendered to an HTML fragment, capped at the tile's row limit
//! 5. Fragment passed through the sanitizer gate, cached, and returned
//!
//! ## Error Handling
//!
//! All errors are returned in a JSON envelope:
//! ```json
//! {
//!   "error": {
//!     "message": "Tile 'ghost' not found. Available: sales",
//!     "type": "invalid_request_error",
//!     "param": "tile_id",
//!     "code": "tile_not_found"
//!   }
//! }
//! ```

mod callback;
mod health;
mod history;
mod tiles;
pub mod types;

pub use tiles::{render_fragment, RenderOutcome, CACHE_HEADER};
pub use types::*;

use crate::cache::TileCache;
use crate::config::MosaicConfig;
use crate::dispatch::Dispatcher;
use crate::history::RenderHistory;
use crate::metrics::MetricsCollector;
use crate::registry::{Registry, Tile};
use crate::sanitize::Sanitizer;
use crate::source::SourcePool;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub registry: Arc<Registry>,
    pub config: Arc<MosaicConfig>,
    pub cache: Arc<TileCache>,
    pub sanitizer: Arc<Sanitizer>,
    pub pool: Arc<SourcePool>,
    pub dispatcher: Arc<Dispatcher>,
    pub history: Arc<RenderHistory>,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
    /// Metrics collector for observability
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    /// Build application state from a validated configuration.
    ///
    /// Registers every configured tile, constructs the source pool and the
    /// callback dispatcher, and wires up the metrics collector.
    pub fn from_config(config: Arc<MosaicConfig>) -> anyhow::Result<Self> {
        let registry = Arc::new(Registry::new());
        for tile_config in &config.tiles {
            registry.add_tile(Tile::from_config(tile_config))?;
        }

        let cache = Arc::new(TileCache::new(&config.cache));
        let sanitizer = Arc::new(Sanitizer::new(&config.sanitizer));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.server.request_timeout_seconds))
            .pool_max_idle_per_host(10)
            .build()?;
        let pool = Arc::new(SourcePool::from_config(&config.sources, http_client)?);

        let dispatcher = Arc::new(Dispatcher::from_tiles(&config.tiles)?);
        let history = Arc::new(RenderHistory::new());
        let start_time = Instant::now();

        // Initialize metrics (safe to call multiple times - will reuse
        // existing if already set)
        let prometheus_handle = crate::metrics::setup_metrics().unwrap_or_else(|e| {
            tracing::debug!("Metrics already initialized, creating new handle: {}", e);
            crate::metrics::PrometheusBuilder::new()
                .build_recorder()
                .handle()
        });

        let metrics_collector = Arc::new(MetricsCollector::new(
            Arc::clone(&registry),
            Arc::clone(&cache),
            Arc::clone(&pool),
            start_time,
            prometheus_handle,
        ));

        Ok(Self {
            registry,
            config,
            cache,
            sanitizer,
            pool,
            dispatcher,
            history,
            start_time,
            metrics_collector,
        })
    }
}

/// Create the main API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_body = state.config.server.max_body_kb * 1024;
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    Router::new()
        .route("/api/tiles", get(tiles::list))
        .route("/api/tiles/:id", get(tiles::render))
        .route("/api/callback", post(callback::handle))
        .route("/api/history", get(history::handle))
        .route("/api/stats", get(crate::metrics::handler::stats_handler))
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .route("/", get(crate::dashboard::handler::dashboard_handler))
        .route(
            "/assets/*path",
            get(crate::dashboard::handler::assets_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(max_body))
        .with_state(state)
}
