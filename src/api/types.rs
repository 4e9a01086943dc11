//! Request/response types for the dashboard API.

use crate::registry::TileView;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Response for GET /api/tiles.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TileListResponse {
    pub tiles: Vec<TileView>,
    pub count: usize,
}

/// Callback invocation request.
///
/// `inputs` carries the changed input values keyed by parameter name;
/// scalar JSON values are forwarded to the tile's source as query
/// parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallbackRequest {
    /// Tile to re-render
    pub output: String,
    #[serde(default)]
    pub inputs: HashMap<String, serde_json::Value>,
}

/// Outcome of a callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    Rendered,
    Debounced,
}

/// Response for POST /api/callback.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CallbackResponse {
    pub output: String,
    pub status: CallbackStatus,
    pub duration_ms: u64,
    /// Downstream tiles invalidated by this render
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalidated: Vec<String>,
}

/// API error response envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    /// Create a bad request error (400).
    pub fn bad_request(message: &str, param: Option<&str>) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: "invalid_request_error".to_string(),
                param: param.map(|p| p.to_string()),
                code: Some("invalid_request_error".to_string()),
            },
        }
    }

    /// Create a tile not found error (404) with available tiles hint.
    pub fn tile_not_found(tile_id: &str, available: &[String]) -> Self {
        let hint = if available.is_empty() {
            "No tiles registered".to_string()
        } else {
            format!("Available: {}", available.join(", "))
        };
        Self {
            error: ApiErrorBody {
                message: format!("Tile '{}' not found. {}", tile_id, hint),
                r#type: "invalid_request_error".to_string(),
                param: Some("tile_id".to_string()),
                code: Some("tile_not_found".to_string()),
            },
        }
    }

    /// Create a callback not found error (404).
    pub fn callback_not_found(output: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: format!("No callback registered for output '{}'", output),
                r#type: "invalid_request_error".to_string(),
                param: Some("output".to_string()),
                code: Some("callback_not_found".to_string()),
            },
        }
    }

    /// Create a bad gateway error (502) for a failed upstream fetch.
    pub fn bad_gateway(message: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: "server_error".to_string(),
                param: None,
                code: Some("bad_gateway".to_string()),
            },
        }
    }

    /// Create a service unavailable error (503).
    pub fn service_unavailable(message: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: "server_error".to_string(),
                param: None,
                code: Some("service_unavailable".to_string()),
            },
        }
    }

    /// Create an internal server error (500).
    pub fn internal(message: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: "server_error".to_string(),
                param: None,
                code: Some("internal_error".to_string()),
            },
        }
    }

    /// Get the HTTP status code for this error.
    fn status_code(&self) -> StatusCode {
        match self.error.code.as_deref() {
            Some("invalid_request_error") => StatusCode::BAD_REQUEST,
            Some("tile_not_found") => StatusCode::NOT_FOUND,
            Some("callback_not_found") => StatusCode::NOT_FOUND,
            Some("bad_gateway") => StatusCode::BAD_GATEWAY,
            Some("service_unavailable") => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

impl From<crate::source::SourceError> for ApiError {
    fn from(err: crate::source::SourceError) -> Self {
        use crate::source::SourceError;
        match &err {
            SourceError::UnknownSource(_) => Self::internal(&err.to_string()),
            SourceError::PoolExhausted { .. } => Self::service_unavailable(&err.to_string()),
            SourceError::Upstream { .. } | SourceError::Decode { .. } => {
                Self::bad_gateway(&err.to_string())
            }
        }
    }
}
