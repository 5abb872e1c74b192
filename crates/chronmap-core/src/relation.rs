//! Lineage query types.
//!
//! A [`RelationQueryResult`] is built fresh for every query and never cached.

use serde::{Deserialize, Serialize};

use crate::record::GeoRecord;

/// Which way along the timeline a lineage search looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  /// Records starting strictly before the reference year.
  Predecessor,
  /// Records starting strictly after the reference year.
  Successor,
}

/// A resolved predecessor or successor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedEntity {
  pub id:   String,
  pub name: String,
  /// Start year of the matched record.
  pub year: i32,
}

impl RelatedEntity {
  pub fn from_record(id: &str, record: &GeoRecord) -> Self {
    Self {
      id:   id.to_owned(),
      name: record.name.clone(),
      year: record.start_year,
    }
  }
}

/// Progress of a relation query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RelationStatus {
  Loading,
  Ready,
  /// Resolution failed; any lists already built are kept.
  Error { reason: String },
}

/// Predecessors and successors of one entity at one reference year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationQueryResult {
  pub predecessors: Vec<RelatedEntity>,
  pub successors:   Vec<RelatedEntity>,
  #[serde(flatten)]
  pub status:       RelationStatus,
}

impl RelationQueryResult {
  /// An empty result that has not been resolved yet.
  pub fn pending() -> Self {
    Self {
      predecessors: Vec::new(),
      successors:   Vec::new(),
      status:       RelationStatus::Loading,
    }
  }

  /// An empty result with an error status.
  pub fn failed(reason: impl Into<String>) -> Self {
    Self {
      status: RelationStatus::Error {
        reason: reason.into(),
      },
      ..Self::pending()
    }
  }

  pub fn is_ready(&self) -> bool { matches!(self.status, RelationStatus::Ready) }

  /// An error status with some relations already resolved.
  pub fn is_partial(&self) -> bool {
    matches!(self.status, RelationStatus::Error { .. })
      && !(self.predecessors.is_empty() && self.successors.is_empty())
  }
}
