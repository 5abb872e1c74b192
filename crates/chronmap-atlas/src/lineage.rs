//! [`LineageResolver`]: predecessor/successor resolution across shards.
//!
//! Entities are linked by external id. A lineage search never looks at the
//! whole dataset: it scans the period owning the reference year plus
//! `radius` neighbours on each side (one by default).
//!
//! Scan order is the window in table order, then records in shard order.
//! When several records tie on the extremal start year, the first one in
//! scan order wins.

use std::sync::Arc;

use chronmap_core::{
  Result,
  period::PeriodTable,
  record::GeoRecord,
  relation::{Direction, RelatedEntity, RelationQueryResult, RelationStatus},
  shard::Shard,
  source::ShardSource,
};

use crate::cache::TemporalCache;

/// Neighbouring periods scanned on each side of the reference period.
pub const DEFAULT_RADIUS: usize = 1;

pub struct LineageResolver<S> {
  table:  Arc<PeriodTable>,
  cache:  Arc<TemporalCache<S>>,
  radius: usize,
}

impl<S: ShardSource + 'static> LineageResolver<S> {
  pub fn new(table: Arc<PeriodTable>, cache: Arc<TemporalCache<S>>) -> Self {
    Self {
      table,
      cache,
      radius: DEFAULT_RADIUS,
    }
  }

  pub fn with_radius(mut self, radius: usize) -> Self {
    self.radius = radius;
    self
  }

  pub fn radius(&self) -> usize { self.radius }

  /// Load every shard in the window around `year`. Empty when the year has
  /// no period.
  async fn window(&self, year: i32) -> Result<Vec<Shard>> {
    let Some(index) = self.table.index_for_year(year) else {
      return Ok(Vec::new());
    };
    let periods = self.table.window(index, self.radius);
    let mut shards = Vec::with_capacity(periods.len());
    for period in periods {
      shards.push(self.cache.get(period).await?);
    }
    Ok(shards)
  }

  /// The record of `id` nearest to `year` in `direction`.
  ///
  /// Successors must start strictly after `year`, predecessors strictly
  /// before it.
  pub async fn find_nearest(
    &self,
    id: &str,
    year: i32,
    direction: Direction,
  ) -> Result<Option<Arc<GeoRecord>>> {
    let shards = self.window(year).await?;
    Ok(nearest_in(&shards, id, year, direction))
  }

  /// The record describing `id` at `year`: one whose interval contains the
  /// year, else the nearest earlier one.
  pub async fn current_record(&self, id: &str, year: i32) -> Result<Option<Arc<GeoRecord>>> {
    let shards = self.window(year).await?;
    Ok(current_in(&shards, id, year))
  }

  /// Resolve the predecessors and successors of `id` as of `year`.
  ///
  /// Never fails outright: load errors become an error status, keeping any
  /// relations resolved before the failure.
  pub async fn resolve_relations(&self, id: &str, year: i32) -> RelationQueryResult {
    let current = match self.current_record(id, year).await {
      Ok(Some(record)) => record,
      Ok(None) => {
        tracing::debug!(%id, year, "no current record");
        return RelationQueryResult::failed(format!("no record for {id} near {year}"));
      }
      Err(e) => {
        tracing::warn!(%id, year, error = %e, "relation lookup failed");
        return RelationQueryResult::failed(e.to_string());
      }
    };

    let predecessor_ids = current.predecessor_ids();
    let successor_ids = current.successor_ids();
    let ((predecessors, pred_err), (successors, succ_err)) = tokio::join!(
      self.resolve_all(&predecessor_ids, year, Direction::Predecessor),
      self.resolve_all(&successor_ids, year, Direction::Successor),
    );

    let status = match pred_err.or(succ_err) {
      None => RelationStatus::Ready,
      Some(e) => {
        tracing::warn!(%id, year, error = %e, "relation resolution incomplete");
        RelationStatus::Error {
          reason: e.to_string(),
        }
      }
    };

    tracing::debug!(
      %id,
      year,
      predecessors = predecessors.len(),
      successors = successors.len(),
      "relations resolved"
    );
    RelationQueryResult {
      predecessors,
      successors,
      status,
    }
  }

  /// Resolve `ids` in order, stopping at the first load failure.
  async fn resolve_all(
    &self,
    ids: &[&str],
    year: i32,
    direction: Direction,
  ) -> (Vec<RelatedEntity>, Option<chronmap_core::Error>) {
    let mut resolved = Vec::with_capacity(ids.len());
    for &id in ids {
      match self.find_nearest(id, year, direction).await {
        Ok(Some(record)) => resolved.push(RelatedEntity::from_record(id, &record)),
        Ok(None) => tracing::debug!(%id, year, ?direction, "relation not in window"),
        Err(e) => return (resolved, Some(e)),
      }
    }
    (resolved, None)
  }
}

fn scan<'a>(shards: &'a [Shard], id: &'a str) -> impl Iterator<Item = &'a Arc<GeoRecord>> + 'a {
  shards.iter().flat_map(move |shard| shard.with_id(id))
}

fn nearest_in(
  shards: &[Shard],
  id: &str,
  year: i32,
  direction: Direction,
) -> Option<Arc<GeoRecord>> {
  let mut best: Option<&Arc<GeoRecord>> = None;
  for record in scan(shards, id) {
    let start = record.start_year;
    let better = match direction {
      Direction::Predecessor => {
        start < year && best.is_none_or(|b| start > b.start_year)
      }
      Direction::Successor => {
        start > year && best.is_none_or(|b| start < b.start_year)
      }
    };
    if better {
      best = Some(record);
    }
  }
  best.cloned()
}

fn current_in(shards: &[Shard], id: &str, year: i32) -> Option<Arc<GeoRecord>> {
  scan(shards, id)
    .find(|r| r.covers_year(year))
    .cloned()
    .or_else(|| nearest_in(shards, id, year, Direction::Predecessor))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(id: &str, start: i32, end: i32) -> GeoRecord {
    GeoRecord::new(Some(id), format!("{id}@{start}"), start, end)
  }

  fn shards() -> Vec<Shard> {
    vec![
      Shard::from_records("a", vec![record("Q1", -50, -20), record("Q1", -10, 0)]),
      Shard::from_records("b", vec![
        record("Q1", 10, 20),
        record("Q2", 15, 30),
        record("Q1", 40, 60),
        record("Q1", 40, 45),
      ]),
    ]
  }

  #[test]
  fn nearest_successor_starts_strictly_after() {
    let shards = shards();
    let found = nearest_in(&shards, "Q1", 10, Direction::Successor).unwrap();
    assert_eq!(found.start_year, 40);
    // Ties on start year keep the first in scan order.
    assert_eq!(found.end_year, 60);

    assert!(nearest_in(&shards, "Q1", 40, Direction::Successor).is_none());
  }

  #[test]
  fn nearest_predecessor_starts_strictly_before() {
    let shards = shards();
    let found = nearest_in(&shards, "Q1", 10, Direction::Predecessor).unwrap();
    assert_eq!(found.start_year, -10);
    assert!(nearest_in(&shards, "Q1", -50, Direction::Predecessor).is_none());
  }

  #[test]
  fn direction_bounds_hold_for_every_year() {
    let shards = shards();
    for year in -60..70 {
      if let Some(r) = nearest_in(&shards, "Q1", year, Direction::Successor) {
        assert!(r.start_year > year);
      }
      if let Some(r) = nearest_in(&shards, "Q1", year, Direction::Predecessor) {
        assert!(r.start_year < year);
      }
    }
  }

  #[test]
  fn current_prefers_an_interval_match() {
    let shards = shards();
    assert_eq!(current_in(&shards, "Q1", 15).unwrap().start_year, 10);
    // Between intervals: fall back to the nearest earlier record.
    assert_eq!(current_in(&shards, "Q1", 30).unwrap().start_year, 10);
    assert!(current_in(&shards, "Q1", -60).is_none());
    assert!(current_in(&shards, "Q9", 15).is_none());
  }
}
