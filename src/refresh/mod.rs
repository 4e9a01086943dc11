//! Background tile refresh.
//!
//! Tiles with `refresh_seconds > 0` get their default-parameter fragment
//! re-rendered into the cache on a fixed interval, so the common request
//! path stays a cache hit even for slow sources.

use crate::api::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How often the warmer scans for tiles due a refresh.
const SCAN_INTERVAL: Duration = Duration::from_secs(1);

/// Background service that keeps refreshable tiles warm in the cache.
pub struct RefreshWarmer {
    state: Arc<AppState>,
    /// Seconds since startup each tile was last refreshed
    last_refresh: dashmap::DashMap<String, u64>,
}

impl RefreshWarmer {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            state,
            last_refresh: dashmap::DashMap::new(),
        }
    }

    /// Tiles due a refresh at `elapsed` seconds since startup.
    fn due_tiles(&self, elapsed: u64) -> Vec<String> {
        self.state
            .registry
            .get_all_tiles()
            .into_iter()
            .filter(|tile| tile.refresh_seconds > 0)
            .filter(|tile| {
                let last = self
                    .last_refresh
                    .get(&tile.id)
                    .map(|entry| *entry)
                    .unwrap_or(0);
                // First pass refreshes everything immediately
                last == 0 || elapsed.saturating_sub(last) >= tile.refresh_seconds
            })
            .map(|tile| tile.id)
            .collect()
    }

    async fn refresh_cycle(&self, elapsed: u64) -> usize {
        let due = self.due_tiles(elapsed);
        for tile_id in &due {
            // Warm renders overwrite the cached fragment in place
            let key = crate::cache::CacheKey::new(tile_id, &[]);
            self.state.cache.remove(&key).await;
            match crate::api::render_fragment(&self.state, tile_id, &[]).await {
                Ok(outcome) => {
                    tracing::debug!(
                        tile_id = %tile_id,
                        duration_ms = outcome.duration_ms,
                        "tile refreshed"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        tile_id = %tile_id,
                        error = %err.error.message,
                        "tile refresh failed"
                    );
                }
            }
            self.last_refresh.insert(tile_id.clone(), elapsed.max(1));
        }
        due.len()
    }

    /// Start the warmer background task.
    /// Returns a JoinHandle that resolves when the warmer stops.
    pub fn start(self, cancel_token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SCAN_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let started = std::time::Instant::now();

            let refreshable = self
                .state
                .registry
                .get_all_tiles()
                .iter()
                .filter(|t| t.refresh_seconds > 0)
                .count();
            tracing::info!(refreshable, "Refresh warmer started");

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        tracing::info!("Refresh warmer shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let elapsed = started.elapsed().as_secs();
                        let refreshed = self.refresh_cycle(elapsed).await;
                        if refreshed > 0 {
                            tracing::debug!(refreshed, "Refresh cycle completed");
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MosaicConfig, SourceConfig, SourceKind, TileConfig, TileKind};

    fn warm_state(refresh_seconds: u64) -> Arc<AppState> {
        let config = MosaicConfig {
            tiles: vec![TileConfig {
                id: "sales".to_string(),
                title: "Sales".to_string(),
                kind: TileKind::Table,
                source: "fixture".to_string(),
                refresh_seconds,
                debounce_ms: 0,
                max_rows: 100,
                inputs: vec![],
            }],
            sources: vec![SourceConfig {
                name: "fixture".to_string(),
                kind: SourceKind::Static,
                url: None,
                rows: Some(serde_json::json!([{"region": "emea", "total": 42}])),
                pool_size: 2,
            }],
            ..Default::default()
        };
        Arc::new(AppState::from_config(Arc::new(config)).unwrap())
    }

    #[tokio::test]
    async fn test_due_tiles_first_pass() {
        let warmer = RefreshWarmer::new(warm_state(30));
        assert_eq!(warmer.due_tiles(0), vec!["sales"]);
    }

    #[tokio::test]
    async fn test_due_tiles_respects_interval() {
        let warmer = RefreshWarmer::new(warm_state(30));
        warmer.refresh_cycle(5).await;
        assert!(warmer.due_tiles(10).is_empty());
        assert_eq!(warmer.due_tiles(40), vec!["sales"]);
    }

    #[tokio::test]
    async fn test_non_refreshable_tiles_skipped() {
        let warmer = RefreshWarmer::new(warm_state(0));
        assert!(warmer.due_tiles(100).is_empty());
    }

    #[tokio::test]
    async fn test_refresh_cycle_populates_cache() {
        let state = warm_state(10);
        let warmer = RefreshWarmer::new(Arc::clone(&state));
        assert_eq!(warmer.refresh_cycle(1).await, 1);

        let key = crate::cache::CacheKey::new("sales", &[]);
        assert!(state.cache.get(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_start_and_cancel() {
        let warmer = RefreshWarmer::new(warm_state(30));
        let token = CancellationToken::new();
        let handle = warmer.start(token.clone());
        token.cancel();
        handle.await.unwrap();
    }
}
