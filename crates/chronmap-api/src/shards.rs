//! Handlers for `/periods` and `/shards` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/periods` | The period table, in order |
//! | `GET`  | `/shards/:year` | Optional `?visible=true`; 404 if no period covers the year |
//!
//! Shard responses carry an `ETag` and honour `If-None-Match`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use chronmap_atlas::Atlas;
use chronmap_core::{period::PeriodTable, shard::FeatureCollection, source::ShardSource};
use serde::Deserialize;

use crate::error::ApiError;

/// Name of the period that served a shard response.
pub const PERIOD_HEADER: &str = "x-chronmap-period";

// ─── Periods ──────────────────────────────────────────────────────────────────

/// `GET /periods`
pub async fn periods<S>(State(atlas): State<Arc<Atlas<S>>>) -> Json<PeriodTable>
where
  S: ShardSource + 'static,
{
  Json(atlas.periods().clone())
}

// ─── Shard by year ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ShardParams {
  /// Only records on the map on 1 January of the requested year.
  #[serde(default)]
  pub visible: bool,
}

/// `GET /shards/:year[?visible=true]`
pub async fn by_year<S>(
  State(atlas): State<Arc<Atlas<S>>>,
  Path(year): Path<i32>,
  Query(params): Query<ShardParams>,
  headers: HeaderMap,
) -> Result<Response, ApiError>
where
  S: ShardSource + 'static,
{
  let shard = atlas
    .shard_for_year(year)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no period covers year {year}")))?;

  let etag = if params.visible {
    format!("\"{}-{year}\"", strip_etag_quotes(shard.etag()))
  } else {
    shard.etag().to_string()
  };

  let not_modified = headers
    .get(header::IF_NONE_MATCH)
    .and_then(|v| v.to_str().ok())
    .is_some_and(|candidates| etag_matches(candidates, &etag));
  if not_modified {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
  }

  let headers = [
    (header::ETAG, etag),
    (header::HeaderName::from_static(PERIOD_HEADER), shard.period().to_string()),
  ];
  let response = if params.visible {
    let visible = shard.visible_at(year);
    (headers, Json(FeatureCollection::new(&visible))).into_response()
  } else {
    (headers, Json(FeatureCollection::new(shard.records()))).into_response()
  };
  Ok(response)
}

/// `If-None-Match` may list several tags, quoted or not, or `*`.
fn etag_matches(candidates: &str, etag: &str) -> bool {
  candidates.split(',').map(str::trim).any(|candidate| {
    candidate == "*"
      || strip_etag_quotes(candidate.trim_start_matches("W/")) == strip_etag_quotes(etag)
  })
}

fn strip_etag_quotes(s: &str) -> &str { s.trim_matches('"') }
