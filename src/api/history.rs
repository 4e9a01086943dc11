//! Render history endpoint handler.

use super::AppState;
use crate::history::{HistoryEntry, HISTORY_CAPACITY};
use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
    pub count: usize,
}

/// GET /api/history - Recent renders, newest first.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> Json<HistoryResponse> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIMIT)
        .min(HISTORY_CAPACITY);
    let entries = state.history.recent(limit);
    let count = entries.len();
    Json(HistoryResponse { entries, count })
}
