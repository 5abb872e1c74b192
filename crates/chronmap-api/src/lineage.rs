//! Handlers for lineage and record endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/relations/:id?year=<y>` | Always 200; failures are reported in `status` |
//! | `GET`  | `/records/:id?year=<y>` | 404 if `id` has no record near the year |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chronmap_atlas::Atlas;
use chronmap_core::{relation::RelationQueryResult, source::ShardSource};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct YearParams {
  /// Reference year of the query.
  pub year: i32,
}

// ─── Relations ────────────────────────────────────────────────────────────────

/// `GET /relations/:id?year=<y>`
pub async fn relations<S>(
  State(atlas): State<Arc<Atlas<S>>>,
  Path(id): Path<String>,
  Query(params): Query<YearParams>,
) -> Json<RelationQueryResult>
where
  S: ShardSource + 'static,
{
  Json(atlas.relations(&id, params.year).await)
}

// ─── Record summary ───────────────────────────────────────────────────────────

/// What the side panel shows for a selected entity.
#[derive(Debug, Serialize)]
pub struct RecordSummary {
  pub id:         String,
  pub name:       String,
  pub start_year: i32,
  pub end_year:   i32,
  /// Span of the whole state across every record sharing its name.
  pub lifespan:   [i32; 2],
  pub wikipedia:  Option<String>,
  pub wars:       Vec<WarSummary>,
}

#[derive(Debug, Serialize)]
pub struct WarSummary {
  pub key:            String,
  pub name:           String,
  pub wikipedia_link: Option<String>,
  pub start:          Option<String>,
  pub end:            Option<String>,
}

/// `GET /records/:id?year=<y>`
pub async fn record<S>(
  State(atlas): State<Arc<Atlas<S>>>,
  Path(id): Path<String>,
  Query(params): Query<YearParams>,
) -> Result<Json<RecordSummary>, ApiError>
where
  S: ShardSource + 'static,
{
  let record = atlas
    .current_record(&id, params.year)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("no record of {id} near year {}", params.year)))?;

  let (first, last) = atlas.lifespan(&record);
  let wars = atlas
    .wars_for(&record)
    .into_iter()
    .map(|(key, war)| {
      let (start, end) = war.day_labels();
      WarSummary {
        key:            key.to_owned(),
        name:           war.name.clone(),
        wikipedia_link: war.wikipedia_link.clone(),
        start:          start.map(str::to_owned),
        end:            end.map(str::to_owned),
      }
    })
    .collect();

  Ok(Json(RecordSummary {
    id,
    name: record.name.clone(),
    start_year: record.start_year,
    end_year: record.end_year,
    lifespan: [first, last],
    wikipedia: record.wikipedia.clone(),
    wars,
  }))
}
