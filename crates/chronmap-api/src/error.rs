//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  /// A shard or annotation could not be loaded.
  #[error("load error: {0}")]
  Load(#[from] chronmap_core::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Load(e) => {
        tracing::warn!(error = %e, "request failed to load data");
        (StatusCode::BAD_GATEWAY, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
