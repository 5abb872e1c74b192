//! [`GeoRecord`]: one political entity's boundary for one historical
//! interval, as carried by a GeoJSON `Feature`.
//!
//! The wire shape is the dataset's: a `Feature` whose `properties` use the
//! Gleditsch–Ward style date keys (`gwsyear`, `gweyear`, ...) and Wikidata
//! property ids for lineage (`P155`/`P1365` for predecessors, `P156`/`P1366`
//! for successors). Conversion to and from that shape happens through
//! [`Feature`], so the rest of the crate only sees typed fields.

use serde::{Deserialize, Serialize};

// ─── Record ──────────────────────────────────────────────────────────────────

/// A typed view of a single dataset feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Feature", into = "Feature")]
pub struct GeoRecord {
  /// Third-party knowledge-base id linking the same entity across shards.
  pub external_id:            Option<String>,
  pub name:                   String,
  pub start_year:             i32,
  pub start_month:            u32,
  pub start_day:              u32,
  pub end_year:               i32,
  pub end_month:              u32,
  pub end_day:                u32,
  /// "follows" (`P155`).
  pub predecessors_primary:   Vec<String>,
  /// "replaces" (`P1365`).
  pub predecessors_secondary: Vec<String>,
  /// "followed by" (`P156`).
  pub successors_primary:     Vec<String>,
  /// "replaced by" (`P1366`).
  pub successors_secondary:   Vec<String>,
  /// Keys into the war catalogue.
  pub war_refs:               Vec<String>,
  pub wikipedia:              Option<String>,
  /// Opaque GeoJSON geometry; never inspected.
  pub geometry:               serde_json::Value,
}

impl GeoRecord {
  /// A record with the given id, name and year range and no relations.
  pub fn new(
    external_id: Option<&str>,
    name: impl Into<String>,
    start_year: i32,
    end_year: i32,
  ) -> Self {
    Self {
      external_id: external_id.map(str::to_owned),
      name: name.into(),
      start_year,
      start_month: 1,
      start_day: 1,
      end_year,
      end_month: 12,
      end_day: 31,
      predecessors_primary: Vec::new(),
      predecessors_secondary: Vec::new(),
      successors_primary: Vec::new(),
      successors_secondary: Vec::new(),
      war_refs: Vec::new(),
      wikipedia: None,
      geometry: serde_json::Value::Null,
    }
  }

  pub fn has_id(&self, id: &str) -> bool { self.external_id.as_deref() == Some(id) }

  /// Whether `year` lies within `[start_year, end_year]`.
  pub fn covers_year(&self, year: i32) -> bool {
    self.start_year <= year && year <= self.end_year
  }

  /// Whether the entity is on the map on 1 January of `year`.
  ///
  /// Records with a negative start or end year are compared by year only
  /// (inclusive). Otherwise the full start date must be on or before
  /// 1 January and the full end date strictly after it.
  pub fn visible_at(&self, year: i32) -> bool {
    if self.start_year < 0 || self.end_year < 0 {
      return self.covers_year(year);
    }
    let target = (year, 1, 1);
    self.start_date() <= target && self.end_date() > target
  }

  /// `(year, month, day)` of the first day of the interval.
  pub fn start_date(&self) -> (i32, u32, u32) {
    (self.start_year, self.start_month, self.start_day)
  }

  /// `(year, month, day)` of the last day of the interval.
  pub fn end_date(&self) -> (i32, u32, u32) {
    (self.end_year, self.end_month, self.end_day)
  }

  /// Union of both predecessor lists, first occurrence wins.
  pub fn predecessor_ids(&self) -> Vec<&str> {
    union_ids(&self.predecessors_primary, &self.predecessors_secondary)
  }

  /// Union of both successor lists, first occurrence wins.
  pub fn successor_ids(&self) -> Vec<&str> {
    union_ids(&self.successors_primary, &self.successors_secondary)
  }
}

fn union_ids<'a>(primary: &'a [String], secondary: &'a [String]) -> Vec<&'a str> {
  let mut out: Vec<&str> = Vec::with_capacity(primary.len() + secondary.len());
  for id in primary.iter().chain(secondary) {
    if !id.is_empty() && !out.contains(&id.as_str()) {
      out.push(id);
    }
  }
  out
}

// ─── Wire shape ──────────────────────────────────────────────────────────────

/// A GeoJSON `Feature` as found in shard artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
  #[serde(rename = "type", default = "feature_type")]
  pub kind:       String,
  pub properties: Properties,
  #[serde(default)]
  pub geometry:   serde_json::Value,
}

fn feature_type() -> String { "Feature".to_owned() }

/// The `properties` object of a [`Feature`]. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Properties {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub wikidata_id: Option<String>,
  #[serde(default)]
  pub cntry_name:  Option<String>,
  pub gwsyear:     i32,
  #[serde(default)]
  pub gwsmonth:    Option<u32>,
  #[serde(default)]
  pub gwsday:      Option<u32>,
  pub gweyear:     i32,
  #[serde(default)]
  pub gwemonth:    Option<u32>,
  #[serde(default)]
  pub gweday:      Option<u32>,
  #[serde(rename = "P155", default, skip_serializing_if = "Option::is_none")]
  pub p155:        Option<Vec<String>>,
  #[serde(rename = "P1365", default, skip_serializing_if = "Option::is_none")]
  pub p1365:       Option<Vec<String>>,
  #[serde(rename = "P156", default, skip_serializing_if = "Option::is_none")]
  pub p156:        Option<Vec<String>>,
  #[serde(rename = "P1366", default, skip_serializing_if = "Option::is_none")]
  pub p1366:       Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub wars:        Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub wikipedia:   Option<String>,
}

impl From<Feature> for GeoRecord {
  fn from(f: Feature) -> Self {
    let p = f.properties;
    Self {
      external_id:            p.wikidata_id.filter(|id| !id.trim().is_empty()),
      name:                   p.cntry_name.unwrap_or_default(),
      start_year:             p.gwsyear,
      start_month:            p.gwsmonth.unwrap_or(1),
      start_day:              p.gwsday.unwrap_or(1),
      end_year:               p.gweyear,
      end_month:              p.gwemonth.unwrap_or(12),
      end_day:                p.gweday.unwrap_or(31),
      predecessors_primary:   p.p155.unwrap_or_default(),
      predecessors_secondary: p.p1365.unwrap_or_default(),
      successors_primary:     p.p156.unwrap_or_default(),
      successors_secondary:   p.p1366.unwrap_or_default(),
      war_refs:               p.wars.unwrap_or_default(),
      wikipedia:              p.wikipedia,
      geometry:               f.geometry,
    }
  }
}

impl From<GeoRecord> for Feature {
  fn from(r: GeoRecord) -> Self {
    let non_empty = |v: Vec<String>| (!v.is_empty()).then_some(v);
    Feature {
      kind:       feature_type(),
      properties: Properties {
        wikidata_id: r.external_id,
        cntry_name:  Some(r.name),
        gwsyear:     r.start_year,
        gwsmonth:    Some(r.start_month),
        gwsday:      Some(r.start_day),
        gweyear:     r.end_year,
        gwemonth:    Some(r.end_month),
        gweday:      Some(r.end_day),
        p155:        non_empty(r.predecessors_primary),
        p1365:       non_empty(r.predecessors_secondary),
        p156:        non_empty(r.successors_primary),
        p1366:       non_empty(r.successors_secondary),
        wars:        non_empty(r.war_refs),
        wikipedia:   r.wikipedia,
      },
      geometry:   r.geometry,
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn maps_dataset_properties_onto_fields() {
    let record: GeoRecord = serde_json::from_value(json!({
      "type": "Feature",
      "properties": {
        "wikidata_id": "Q1",
        "cntry_name": "Roman Empire",
        "gwsyear": -27, "gwsmonth": 1, "gwsday": 16,
        "gweyear": 395, "gwemonth": 1, "gweday": 17,
        "P155": ["Q17167"],
        "P1365": ["Q17167", "Q2"],
        "P156": ["Q12544"],
        "P1366": ["Q42834"],
        "wars": ["w1"],
        "area_sqkm": 5000000
      },
      "geometry": { "type": "Polygon", "coordinates": [] }
    }))
    .unwrap();

    assert_eq!(record.external_id.as_deref(), Some("Q1"));
    assert_eq!(record.name, "Roman Empire");
    assert_eq!(record.start_date(), (-27, 1, 16));
    assert_eq!(record.end_date(), (395, 1, 17));
    assert_eq!(record.predecessor_ids(), ["Q17167", "Q2"]);
    assert_eq!(record.successor_ids(), ["Q12544", "Q42834"]);
    assert_eq!(record.war_refs, ["w1"]);
    assert_eq!(record.geometry["type"], "Polygon");
  }

  #[test]
  fn missing_optional_properties_take_defaults() {
    let record: GeoRecord = serde_json::from_value(json!({
      "properties": { "wikidata_id": "", "gwsyear": 10, "gweyear": 20 }
    }))
    .unwrap();

    assert_eq!(record.external_id, None);
    assert_eq!(record.name, "");
    assert_eq!(record.start_date(), (10, 1, 1));
    assert_eq!(record.end_date(), (20, 12, 31));
    assert!(record.predecessor_ids().is_empty());
    assert!(record.geometry.is_null());
  }

  #[test]
  fn null_relation_lists_are_empty() {
    let record: GeoRecord = serde_json::from_value(json!({
      "properties": { "gwsyear": 1, "gweyear": 2, "P155": null, "wars": null }
    }))
    .unwrap();
    assert!(record.predecessors_primary.is_empty());
    assert!(record.war_refs.is_empty());
  }

  #[test]
  fn serialises_back_to_a_feature() {
    let mut record = GeoRecord::new(Some("Q5"), "Wessex", 519, 927);
    record.successors_primary = vec!["Q6".into()];

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["type"], "Feature");
    assert_eq!(value["properties"]["wikidata_id"], "Q5");
    assert_eq!(value["properties"]["gwsyear"], 519);
    assert_eq!(value["properties"]["P156"], json!(["Q6"]));
    assert!(value["properties"].get("P155").is_none());
  }

  #[test]
  fn visibility_uses_full_dates_for_positive_years() {
    let mut record = GeoRecord::new(Some("Q1"), "x", 1800, 1850);
    record.start_month = 6;
    record.end_month = 1;
    record.end_day = 1;

    // Starts mid-1800, so not yet on the map on 1 January 1800.
    assert!(!record.visible_at(1800));
    assert!(record.visible_at(1801));
    // Ends exactly on 1 January 1850.
    assert!(!record.visible_at(1850));
  }

  #[test]
  fn visibility_is_inclusive_by_year_for_negative_years() {
    let record = GeoRecord::new(Some("Q1"), "x", -300, 10);
    assert!(record.visible_at(-300));
    assert!(record.visible_at(10));
    assert!(!record.visible_at(11));
  }
}
