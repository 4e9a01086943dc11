//! Configuration module for Mosaic
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`MOSAIC_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use mosaic::config::MosaicConfig;
//!
//! // Load defaults
//! let config = MosaicConfig::default();
//! assert_eq!(config.server.port, 8050);
//!
//! // Parse from TOML
//! let toml = r#"
//! [server]
//! port = 9000
//! "#;
//! let config: MosaicConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.port, 9000);
//! ```

pub mod cache;
pub mod error;
pub mod logging;
pub mod sanitizer;
pub mod server;
pub mod tile;

pub use cache::CacheConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use sanitizer::SanitizerConfig;
pub use server::ServerConfig;
pub use tile::{SourceConfig, SourceKind, TileConfig, TileKind};

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Unified configuration for the Mosaic server.
///
/// Aggregates all configuration sections: server settings, tile cache,
/// sanitizer policy, logging, tile definitions, and data sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MosaicConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Tile cache configuration
    pub cache: CacheConfig,
    /// Sanitizer allow-list extensions
    pub sanitizer: SanitizerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Static tile definitions
    pub tiles: Vec<TileConfig>,
    /// Named data sources
    pub sources: Vec<SourceConfig>,
}

impl MosaicConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports MOSAIC_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("MOSAIC_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("MOSAIC_HOST") {
            self.server.host = host;
        }

        if let Ok(level) = std::env::var("MOSAIC_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("MOSAIC_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(enabled) = std::env::var("MOSAIC_CACHE") {
            self.cache.enabled = enabled.to_lowercase() == "true";
        }
        if let Ok(ttl) = std::env::var("MOSAIC_CACHE_TTL") {
            if let Ok(t) = ttl.parse() {
                self.cache.ttl_seconds = t;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation {
                field: "server.port".to_string(),
                message: "port must be non-zero".to_string(),
            });
        }

        if self.cache.max_size_mb == 0 {
            return Err(ConfigError::Validation {
                field: "cache.max_size_mb".to_string(),
                message: "cache size must be non-zero".to_string(),
            });
        }

        // Validate sources
        let mut source_names = HashSet::new();
        for (i, source) in self.sources.iter().enumerate() {
            if source.name.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("sources[{}].name", i),
                    message: "name cannot be empty".to_string(),
                });
            }
            if !source_names.insert(source.name.as_str()) {
                return Err(ConfigError::Validation {
                    field: format!("sources[{}].name", i),
                    message: format!("duplicate source name '{}'", source.name),
                });
            }
            if source.pool_size == 0 {
                return Err(ConfigError::Validation {
                    field: format!("sources[{}].pool_size", i),
                    message: "pool size must be non-zero".to_string(),
                });
            }
            match source.kind {
                SourceKind::Http => {
                    let raw = source.url.as_deref().unwrap_or("");
                    if raw.is_empty() {
                        return Err(ConfigError::Validation {
                            field: format!("sources[{}].url", i),
                            message: "http sources require a url".to_string(),
                        });
                    }
                    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::Validation {
                        field: format!("sources[{}].url", i),
                        message: format!("invalid URL: {}", e),
                    })?;
                    if parsed.scheme() != "http" && parsed.scheme() != "https" {
                        return Err(ConfigError::Validation {
                            field: format!("sources[{}].url", i),
                            message: format!("unsupported URL scheme: {}", parsed.scheme()),
                        });
                    }
                }
                SourceKind::Static => {}
            }
        }

        // Validate tiles
        let mut tile_ids = HashSet::new();
        for (i, tile) in self.tiles.iter().enumerate() {
            crate::validate::validate_tile_id(&tile.id).map_err(|e| ConfigError::Validation {
                field: format!("tiles[{}].id", i),
                message: e.reason,
            })?;
            if !tile_ids.insert(tile.id.as_str()) {
                return Err(ConfigError::Validation {
                    field: format!("tiles[{}].id", i),
                    message: format!("duplicate tile id '{}'", tile.id),
                });
            }
            if tile.title.is_empty() {
                return Err(ConfigError::Validation {
                    field: format!("tiles[{}].title", i),
                    message: "title cannot be empty".to_string(),
                });
            }
            if !source_names.contains(tile.source.as_str()) {
                return Err(ConfigError::Validation {
                    field: format!("tiles[{}].source", i),
                    message: format!("unknown source '{}'", tile.source),
                });
            }
            if tile.max_rows == 0 {
                return Err(ConfigError::Validation {
                    field: format!("tiles[{}].max_rows", i),
                    message: "max_rows must be non-zero".to_string(),
                });
            }
        }

        // Tile inputs must reference known tiles and must not form cycles
        let deps: HashMap<&str, Vec<&str>> = self
            .tiles
            .iter()
            .map(|t| (t.id.as_str(), t.inputs.iter().map(String::as_str).collect()))
            .collect();
        for (i, tile) in self.tiles.iter().enumerate() {
            for input in &tile.inputs {
                if !tile_ids.contains(input.as_str()) {
                    return Err(ConfigError::Validation {
                        field: format!("tiles[{}].inputs", i),
                        message: format!("unknown input tile '{}'", input),
                    });
                }
            }
        }
        validate_dependencies(&deps)?;

        Ok(())
    }
}

/// Detect cycles in tile input dependencies.
///
/// Walks each tile's input chain; a chain longer than the tile count or one
/// that revisits its origin indicates a cycle.
pub fn validate_dependencies(deps: &HashMap<&str, Vec<&str>>) -> Result<(), ConfigError> {
    for start in deps.keys() {
        let mut visited = HashSet::new();
        let mut stack = vec![*start];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(inputs) = deps.get(current) {
                for input in inputs {
                    if input == start {
                        return Err(ConfigError::CircularDependency {
                            tile: start.to_string(),
                        });
                    }
                    stack.push(input);
                }
            }
        }
    }
    Ok(())
}
