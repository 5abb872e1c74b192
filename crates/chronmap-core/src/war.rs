//! The war catalogue: annotations referenced by [`GeoRecord::war_refs`].
//!
//! [`GeoRecord::war_refs`]: crate::record::GeoRecord::war_refs

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, record::GeoRecord};

/// A war participant, by knowledge-base id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
  pub wikidata_id: String,
}

/// One war, as produced by the dataset's war scraper.
///
/// Dates are kept as the knowledge-base timestamps they were scraped as
/// (`1337-05-24T00:00:00Z`, possibly with `00` month/day for imprecise
/// dates), and only parsed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct War {
  pub name:           String,
  #[serde(default)]
  pub wikipedia_link: Option<String>,
  #[serde(default)]
  pub start_date:     Option<String>,
  #[serde(default)]
  pub end_date:       Option<String>,
  #[serde(default)]
  pub participants:   Vec<Participant>,
  /// Knowledge-base id of the outcome, if recorded.
  #[serde(default)]
  pub result:         Option<String>,
}

impl War {
  /// Calendar dates of the war. Imprecise or BCE timestamps yield `None`.
  pub fn date_range(&self) -> (Option<NaiveDate>, Option<NaiveDate>) {
    (
      self.start_date.as_deref().and_then(parse_day),
      self.end_date.as_deref().and_then(parse_day),
    )
  }

  /// The date part of each timestamp, e.g. `1337-05-24`.
  pub fn day_labels(&self) -> (Option<&str>, Option<&str>) {
    (
      self.start_date.as_deref().map(date_part),
      self.end_date.as_deref().map(date_part),
    )
  }
}

fn date_part(timestamp: &str) -> &str {
  timestamp.split_once('T').map_or(timestamp, |(day, _)| day)
}

fn parse_day(timestamp: &str) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(date_part(timestamp), "%Y-%m-%d").ok()
}

#[derive(Deserialize)]
struct CatalogWire {
  #[serde(default)]
  wars: HashMap<String, War>,
}

/// Wars keyed by the reference used in shard records.
#[derive(Debug, Clone, Default)]
pub struct WarCatalog {
  wars: HashMap<String, War>,
}

impl WarCatalog {
  /// Parse a `{"wars": {"<key>": {...}}}` document.
  pub fn parse(artifact: &str, bytes: &[u8]) -> Result<Self> {
    let wire: CatalogWire =
      serde_json::from_slice(bytes).map_err(|e| Error::format(artifact, e))?;
    Ok(Self { wars: wire.wars })
  }

  pub fn get(&self, key: &str) -> Option<&War> { self.wars.get(key) }

  /// The wars `record` refers to, in reference order. Unknown keys are
  /// skipped.
  pub fn for_record<'a>(&'a self, record: &'a GeoRecord) -> Vec<(&'a str, &'a War)> {
    record
      .war_refs
      .iter()
      .filter_map(|key| match self.wars.get(key) {
        Some(war) => Some((key.as_str(), war)),
        None => {
          tracing::debug!(war = %key, record = %record.name, "unknown war reference");
          None
        }
      })
      .collect()
  }

  pub fn len(&self) -> usize { self.wars.len() }

  pub fn is_empty(&self) -> bool { self.wars.is_empty() }
}
