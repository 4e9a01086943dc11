//! Tile cache configuration

use serde::{Deserialize, Serialize};

/// Tile cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether the cache is enabled at all
    pub enabled: bool,
    /// Maximum cache size in megabytes
    pub max_size_mb: usize,
    /// Default time-to-live for cached tiles, in seconds
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size_mb: 64,
            ttl_seconds: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_size_mb, 64);
        assert_eq!(config.ttl_seconds, 300);
    }

    #[test]
    fn test_cache_config_toml_override() {
        let config: CacheConfig = toml::from_str("max_size_mb = 8\nttl_seconds = 60").unwrap();
        assert_eq!(config.max_size_mb, 8);
        assert_eq!(config.ttl_seconds, 60);
        assert!(config.enabled);
    }
}
