//! Callback dispatch handler.

use super::types::{ApiError, CallbackRequest, CallbackResponse, CallbackStatus};
use super::AppState;
use crate::dispatch::{DispatchDecision, DispatchError};
use crate::registry::TileStatus;
use axum::{extract::State, response::Json};
use std::sync::Arc;

/// POST /api/callback - Re-render a tile because its inputs changed.
///
/// The debounce window is checked first; a suppressed invocation returns
/// `debounced` without touching the source. A rendered invocation drops the
/// output's cached fragments, renders with the new input values, and marks
/// downstream tiles stale so their next request re-renders.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, ApiError> {
    crate::validate::validate_tile_id(&request.output)
        .map_err(|e| ApiError::bad_request(&e.to_string(), Some("output")))?;

    match state.dispatcher.dispatch(&request.output) {
        Ok(DispatchDecision::Proceed) => {}
        Ok(DispatchDecision::Debounced { remaining }) => {
            state
                .metrics_collector
                .record_callback(&request.output, "debounced");
            tracing::debug!(
                output = %request.output,
                remaining_ms = remaining.as_millis() as u64,
                "callback debounced"
            );
            return Ok(Json(CallbackResponse {
                output: request.output,
                status: CallbackStatus::Debounced,
                duration_ms: 0,
                invalidated: vec![],
            }));
        }
        Err(DispatchError::UnknownOutput(output)) => {
            return Err(ApiError::callback_not_found(&output));
        }
        Err(err) => {
            return Err(ApiError::internal(&err.to_string()));
        }
    }

    let params = collect_params(&request);

    // New inputs make every cached variant of this output stale.
    let dropped = state.cache.invalidate_tile(&request.output).await;
    tracing::debug!(output = %request.output, dropped, "invalidated cached fragments");

    let outcome = match super::tiles::render_fragment(&state, &request.output, &params).await {
        Ok(outcome) => outcome,
        Err(err) => {
            state
                .metrics_collector
                .record_callback(&request.output, "error");
            return Err(err);
        }
    };

    let invalidated = invalidate_dependents(&state, &request.output).await;
    state
        .metrics_collector
        .record_callback(&request.output, "rendered");

    Ok(Json(CallbackResponse {
        output: request.output,
        status: CallbackStatus::Rendered,
        duration_ms: outcome.duration_ms,
        invalidated,
    }))
}

/// Flatten the input values into query parameters, sorted by name.
fn collect_params(request: &CallbackRequest) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = request
        .inputs
        .iter()
        .map(|(name, value)| {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), rendered)
        })
        .collect();
    params.sort();
    params
}

/// Drop cached fragments for tiles that consume this output and mark them
/// stale. They re-render lazily on their next request.
async fn invalidate_dependents(state: &AppState, output: &str) -> Vec<String> {
    let dependents = state.dispatcher.dependents(output);
    for dependent in &dependents {
        state.cache.invalidate_tile(dependent).await;
        let _ = state
            .registry
            .update_status(dependent, TileStatus::Stale, None);
    }
    dependents
}
