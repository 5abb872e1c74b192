//! Handlers for `/cache` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/cache` | Names of loaded periods |
//! | `POST` | `/cache/clear` | 204; the next request for any year reloads |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use chronmap_atlas::Atlas;
use chronmap_core::source::ShardSource;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CacheStatus {
  pub loaded: Vec<String>,
}

/// `GET /cache`
pub async fn status<S>(State(atlas): State<Arc<Atlas<S>>>) -> Json<CacheStatus>
where
  S: ShardSource + 'static,
{
  Json(CacheStatus {
    loaded: atlas.cache().loaded_periods(),
  })
}

/// `POST /cache/clear`
pub async fn clear<S>(State(atlas): State<Arc<Atlas<S>>>) -> StatusCode
where
  S: ShardSource + 'static,
{
  atlas.clear_cache();
  StatusCode::NO_CONTENT
}
