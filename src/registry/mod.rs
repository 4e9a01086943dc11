//! Tile Registry module.
//!
//! Provides thread-safe in-memory storage and querying of dashboard tiles.

mod error;
mod tile;

pub use error::*;
pub use tile::*;

use dashmap::DashMap;

/// The Tile Registry stores all registered dashboard tiles.
///
/// Uses lock-free concurrent maps (DashMap) so render paths and the stats
/// endpoints can read without blocking each other.
///
/// # Examples
///
/// ```
/// use mosaic::config::TileConfig;
/// use mosaic::registry::{Registry, Tile};
///
/// let registry = Registry::new();
/// let config: TileConfig = toml::from_str(r#"
/// id = "sales"
/// title = "Sales"
/// source = "warehouse"
/// "#).unwrap();
///
/// registry.add_tile(Tile::from_config(&config)).unwrap();
/// assert_eq!(registry.tile_count(), 1);
/// ```
pub struct Registry {
    tiles: DashMap<String, Tile>,
    source_index: DashMap<String, Vec<String>>,
}

impl Registry {
    /// Create a new empty Registry.
    pub fn new() -> Self {
        Self {
            tiles: DashMap::new(),
            source_index: DashMap::new(),
        }
    }

    /// Add a new tile to the registry.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateTile` if a tile with the same ID
    /// already exists.
    pub fn add_tile(&self, tile: Tile) -> Result<(), RegistryError> {
        let id = tile.id.clone();

        if self.tiles.contains_key(&id) {
            return Err(RegistryError::DuplicateTile(id));
        }

        self.source_index
            .entry(tile.source.clone())
            .or_default()
            .push(id.clone());

        self.tiles.insert(id, tile);
        Ok(())
    }

    /// Remove a tile from the registry.
    ///
    /// Also cleans up the source index entry for this tile.
    pub fn remove_tile(&self, id: &str) -> Result<Tile, RegistryError> {
        let tile = self
            .tiles
            .remove(id)
            .map(|(_, tile)| tile)
            .ok_or_else(|| RegistryError::TileNotFound(id.to_string()))?;

        if let Some(mut tile_ids) = self.source_index.get_mut(&tile.source) {
            tile_ids.retain(|tid| tid != id);
            if tile_ids.is_empty() {
                drop(tile_ids); // Release the lock before removing
                self.source_index.remove(&tile.source);
            }
        }

        Ok(tile)
    }

    /// Get a tile by ID.
    ///
    /// Returns a snapshot copy of the tile (including atomic counter values).
    pub fn get_tile(&self, id: &str) -> Option<Tile> {
        self.tiles.get(id).map(|entry| entry.value().snapshot())
    }

    /// Get snapshot copies of all registered tiles.
    pub fn get_all_tiles(&self) -> Vec<Tile> {
        self.tiles
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect()
    }

    /// Get the number of registered tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Get snapshot copies of all tiles bound to a specific source.
    pub fn tiles_for_source(&self, source: &str) -> Vec<Tile> {
        if let Some(tile_ids) = self.source_index.get(source) {
            tile_ids.iter().filter_map(|id| self.get_tile(id)).collect()
        } else {
            Vec::new()
        }
    }

    /// Get the number of distinct sources referenced by registered tiles.
    pub fn source_count(&self) -> usize {
        self.source_index.len()
    }

    /// Update the render state of a tile.
    ///
    /// Sets the status, updates the last_rendered timestamp on success, and
    /// sets/clears last_error.
    pub fn update_status(
        &self,
        id: &str,
        status: TileStatus,
        error: Option<String>,
    ) -> Result<(), RegistryError> {
        let mut tile = self
            .tiles
            .get_mut(id)
            .ok_or_else(|| RegistryError::TileNotFound(id.to_string()))?;

        tile.status = status;
        if status == TileStatus::Ready {
            tile.last_rendered = Some(chrono::Utc::now());
        }
        tile.last_error = error;

        Ok(())
    }

    /// Record a completed render for a tile.
    ///
    /// Increments the success or error counter and folds the duration into
    /// the rolling latency average using EMA: `new = (sample + 4*old) / 5`.
    /// First sample sets the initial value.
    pub fn record_render(
        &self,
        id: &str,
        duration_ms: u32,
        success: bool,
    ) -> Result<(), RegistryError> {
        let tile = self
            .tiles
            .get(id)
            .ok_or_else(|| RegistryError::TileNotFound(id.to_string()))?;

        if success {
            tile.render_count
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        } else {
            tile.error_count
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }

        loop {
            let current = tile
                .avg_render_ms
                .load(std::sync::atomic::Ordering::SeqCst);

            let new_val = if current == 0 {
                duration_ms
            } else {
                (duration_ms + 4 * current) / 5
            };

            match tile.avg_render_ms.compare_exchange(
                current,
                new_val,
                std::sync::atomic::Ordering::SeqCst,
                std::sync::atomic::Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(()),
                Err(_) => continue, // Retry if another thread modified the value
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
