//! Recent render history.
//!
//! Fixed-capacity ring buffer of recent tile renders, newest first, for the
//! dashboard activity feed and `/api/history`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::RwLock;

/// Renders kept before the oldest entries are dropped.
pub const HISTORY_CAPACITY: usize = 100;

/// Clock skew tolerated on recorded timestamps.
const MAX_FUTURE_SKEW_SECONDS: i64 = 60;

const MAX_TILE_ID_LEN: usize = 256;
const MAX_ERROR_LEN: usize = 1024;

/// Outcome of a recorded render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStatus {
    Ok,
    Error,
}

/// One render, as exposed by `/api/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub tile_id: String,
    pub source: String,
    pub duration_ms: u64,
    pub status: RenderStatus,
    pub cache_hit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Thread-safe ring buffer of recent renders.
pub struct RenderHistory {
    entries: RwLock<VecDeque<HistoryEntry>>,
    capacity: usize,
}

impl RenderHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    /// Record a render, clamping suspicious fields rather than rejecting
    /// the entry.
    pub fn record(&self, mut entry: HistoryEntry) {
        let now = Utc::now();
        if entry.timestamp > now + Duration::seconds(MAX_FUTURE_SKEW_SECONDS) {
            entry.timestamp = now;
        }
        truncate_at_char_boundary(&mut entry.tile_id, MAX_TILE_ID_LEN);
        if let Some(message) = entry.error_message.as_mut() {
            truncate_at_char_boundary(message, MAX_ERROR_LEN);
        }

        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.len() == self.capacity {
            entries.pop_back();
        }
        entries.push_front(entry);
    }

    /// Snapshot, newest first, capped at `limit`.
    pub fn recent(&self, limit: usize) -> Vec<HistoryEntry> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cap a string at `max` bytes without splitting a character.
fn truncate_at_char_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

impl Default for RenderHistory {
    fn default() -> Self {
        Self::new()
    }
}
