//! Bounded per-source fetch pool.
//!
//! Each source gets a fixed number of permits; a fetch checks one out for
//! its duration. A checkout that cannot acquire a permit within the acquire
//! timeout fails with `PoolExhausted` instead of queueing without bound.

use super::{DataSource, FixtureSource, HttpSource, SourceError, SourceQuery, TileData};
use crate::config::{SourceConfig, SourceKind};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Default wait for a free permit before giving up.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

struct PooledSource {
    source: Arc<dyn DataSource>,
    permits: Arc<Semaphore>,
    pool_size: usize,
    waits: AtomicU64,
}

/// Per-source pool statistics.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PoolStats {
    pub source: String,
    pub pool_size: usize,
    pub in_use: usize,
    /// Checkouts that had to wait for a permit
    pub waits: u64,
}

/// Registry of pooled data sources.
pub struct SourcePool {
    sources: DashMap<String, PooledSource>,
    acquire_timeout: Duration,
}

impl SourcePool {
    pub fn new() -> Self {
        Self {
            sources: DashMap::new(),
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Override the permit acquire timeout (tests use short values).
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Build a pool from source configs, constructing the right source kind
    /// for each entry.
    pub fn from_config(
        configs: &[SourceConfig],
        client: reqwest::Client,
    ) -> Result<Self, SourceError> {
        let pool = Self::new();
        for config in configs {
            let source: Arc<dyn DataSource> = match config.kind {
                SourceKind::Static => Arc::new(FixtureSource::from_config_rows(
                    &config.name,
                    config.rows.as_ref(),
                )?),
                SourceKind::Http => Arc::new(HttpSource::new(
                    &config.name,
                    config.url.clone().unwrap_or_default(),
                    client.clone(),
                )),
            };
            pool.register(source, config.pool_size);
        }
        Ok(pool)
    }

    /// Register a source with a permit count. Re-registering replaces the
    /// previous entry.
    pub fn register(&self, source: Arc<dyn DataSource>, pool_size: usize) {
        let name = source.name().to_string();
        self.sources.insert(
            name,
            PooledSource {
                source,
                permits: Arc::new(Semaphore::new(pool_size.max(1))),
                pool_size: pool_size.max(1),
                waits: AtomicU64::new(0),
            },
        );
    }

    /// Fetch rows from a named source, holding a pool permit for the
    /// duration of the fetch.
    pub async fn fetch(&self, name: &str, query: &SourceQuery) -> Result<TileData, SourceError> {
        // Clone handles out of the map entry so the DashMap shard lock is
        // not held across the await points below.
        let (source, permits, pool_size) = {
            let entry = self
                .sources
                .get(name)
                .ok_or_else(|| SourceError::UnknownSource(name.to_string()))?;
            (
                Arc::clone(&entry.source),
                Arc::clone(&entry.permits),
                entry.pool_size,
            )
        };

        let permit = match permits.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                if let Some(entry) = self.sources.get(name) {
                    entry.waits.fetch_add(1, Ordering::Relaxed);
                }
                tokio::time::timeout(self.acquire_timeout, permits.acquire())
                    .await
                    .map_err(|_| SourceError::PoolExhausted {
                        name: name.to_string(),
                        pool_size,
                    })?
                    .map_err(|_| SourceError::PoolExhausted {
                        name: name.to_string(),
                        pool_size,
                    })?
            }
        };

        let result = source.fetch(query).await;
        drop(permit);
        result
    }

    /// Stats snapshot for every registered source.
    pub fn stats(&self) -> Vec<PoolStats> {
        let mut stats: Vec<PoolStats> = self
            .sources
            .iter()
            .map(|entry| PoolStats {
                source: entry.key().clone(),
                pool_size: entry.pool_size,
                in_use: entry.pool_size - entry.permits.available_permits(),
                waits: entry.waits.load(Ordering::Relaxed),
            })
            .collect();
        stats.sort_by(|a, b| a.source.cmp(&b.source));
        stats
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }
}

impl Default for SourcePool {
    fn default() -> Self {
        Self::new()
    }
}
