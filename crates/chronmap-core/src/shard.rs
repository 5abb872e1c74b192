//! Shards: the parsed, immutable record collection of one period.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Error, Result, period::Period, record::GeoRecord};

// ─── Shard ───────────────────────────────────────────────────────────────────

/// The ordered records of one period plus a digest of the artifacts they
/// were parsed from.
///
/// Cloning is cheap: the record list is reference-counted and records are
/// never mutated after parsing.
#[derive(Debug, Clone)]
pub struct Shard {
  inner: Arc<ShardInner>,
}

#[derive(Debug)]
struct ShardInner {
  period:  String,
  records: Vec<Arc<GeoRecord>>,
  etag:    String,
}

impl Shard {
  /// Build a shard directly from records; the etag is derived from the
  /// period name and record count.
  pub fn from_records(period: impl Into<String>, records: Vec<GeoRecord>) -> Self {
    let period = period.into();
    let mut hasher = Sha256::new();
    hasher.update(period.as_bytes());
    hasher.update((records.len() as u64).to_le_bytes());
    Self::build(period, records, hasher)
  }

  /// Parse the raw artifacts of `period` (in part order) into one shard.
  ///
  /// Each part must be a complete FeatureCollection; their features are
  /// concatenated in the order given.
  pub fn assemble(period: &Period, parts: &[Bytes]) -> Result<Self> {
    let names = period.artifact_names();
    if parts.len() != names.len() {
      return Err(Error::format(
        &period.name,
        format!("expected {} part(s), got {}", names.len(), parts.len()),
      ));
    }

    let mut hasher = Sha256::new();
    let mut records = Vec::new();
    for (name, bytes) in names.iter().zip(parts) {
      hasher.update(bytes);
      let mut part = parse_feature_collection(name, bytes)?;
      tracing::debug!(artifact = %name, records = part.len(), "parsed shard part");
      records.append(&mut part);
    }

    Ok(Self::build(period.name.clone(), records, hasher))
  }

  fn build(period: String, records: Vec<GeoRecord>, hasher: Sha256) -> Self {
    let etag = format!("\"{}\"", hex::encode(hasher.finalize()));
    Self {
      inner: Arc::new(ShardInner {
        period,
        records: records.into_iter().map(Arc::new).collect(),
        etag,
      }),
    }
  }

  /// Name of the period this shard was loaded for.
  pub fn period(&self) -> &str { &self.inner.period }

  pub fn records(&self) -> &[Arc<GeoRecord>] { &self.inner.records }

  /// Quoted hex SHA-256 over the raw artifact bytes.
  pub fn etag(&self) -> &str { &self.inner.etag }

  pub fn len(&self) -> usize { self.inner.records.len() }

  pub fn is_empty(&self) -> bool { self.inner.records.is_empty() }

  /// Records carrying external id `id`, in shard order.
  pub fn with_id<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Iterator<Item = &'a Arc<GeoRecord>> + 'a {
    self.inner.records.iter().filter(move |r| r.has_id(id))
  }

  /// Records on the map on 1 January of `year`.
  pub fn visible_at(&self, year: i32) -> Vec<Arc<GeoRecord>> {
    self
      .inner
      .records
      .iter()
      .filter(|r| r.visible_at(year))
      .cloned()
      .collect()
  }

  /// Two handles to the same loaded shard.
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.inner, &other.inner) }
}

// ─── FeatureCollection ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CollectionWire {
  #[serde(rename = "type", default)]
  kind:     Option<String>,
  features: Vec<serde_json::Value>,
}

/// Parse one artifact. `artifact` is used for error messages only.
///
/// Only the collection shape is checked. A feature that does not describe a
/// record (no properties, a missing or non-integer year) is skipped.
pub fn parse_feature_collection(artifact: &str, bytes: &[u8]) -> Result<Vec<GeoRecord>> {
  let wire: CollectionWire =
    serde_json::from_slice(bytes).map_err(|e| Error::format(artifact, e))?;

  if let Some(other) = wire.kind.as_deref().filter(|k| *k != "FeatureCollection") {
    return Err(Error::format(
      artifact,
      format!("expected a FeatureCollection, found {other:?}"),
    ));
  }

  let mut records = Vec::with_capacity(wire.features.len());
  for (index, feature) in wire.features.into_iter().enumerate() {
    match serde_json::from_value::<GeoRecord>(feature) {
      Ok(record) => records.push(record),
      Err(e) => tracing::debug!(%artifact, index, error = %e, "skipping unusable feature"),
    }
  }
  Ok(records)
}

/// Borrowed serialisation of records as a GeoJSON FeatureCollection.
#[derive(Debug, Serialize)]
pub struct FeatureCollection<'a> {
  #[serde(rename = "type")]
  kind:     &'static str,
  features: Vec<&'a GeoRecord>,
}

impl<'a> FeatureCollection<'a> {
  pub fn new(records: impl IntoIterator<Item = &'a Arc<GeoRecord>>) -> Self {
    Self {
      kind:     "FeatureCollection",
      features: records.into_iter().map(|r| &**r).collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn collection(ids: &[&str]) -> Bytes {
    let features: Vec<_> = ids
      .iter()
      .map(|id| {
        json!({
          "type": "Feature",
          "properties": { "wikidata_id": id, "cntry_name": id, "gwsyear": 1, "gweyear": 2 },
          "geometry": null
        })
      })
      .collect();
    Bytes::from(
      serde_json::to_vec(&json!({ "type": "FeatureCollection", "features": features }))
        .unwrap(),
    )
  }

  #[test]
  fn multi_part_shards_concatenate_in_part_order() {
    let period = Period::new("p", 0, 10).with_parts(2);
    let shard =
      Shard::assemble(&period, &[collection(&["Q1", "Q2"]), collection(&["Q3"])])
        .unwrap();

    let ids: Vec<_> = shard
      .records()
      .iter()
      .map(|r| r.external_id.clone().unwrap())
      .collect();
    assert_eq!(ids, ["Q1", "Q2", "Q3"]);
    assert_eq!(shard.period(), "p");
  }

  #[test]
  fn wrong_part_count_is_a_format_error() {
    let period = Period::new("p", 0, 10).with_parts(2);
    let err = Shard::assemble(&period, &[collection(&["Q1"])]).unwrap_err();
    assert!(matches!(err, Error::Format { .. }));
  }

  #[test]
  fn missing_features_is_a_format_error() {
    let err = parse_feature_collection("x.json", br#"{"type":"FeatureCollection"}"#)
      .unwrap_err();
    assert!(matches!(err, Error::Format { ref artifact, .. } if artifact == "x.json"));
  }

  #[test]
  fn non_collection_shapes_are_format_errors() {
    assert!(parse_feature_collection("x", b"[1,2,3]").is_err());
    assert!(parse_feature_collection("x", b"not json").is_err());
    assert!(
      parse_feature_collection("x", br#"{"type":"Feature","features":[]}"#).is_err()
    );
  }

  #[test]
  fn unusable_features_are_skipped() {
    let bytes = serde_json::to_vec(&json!({
      "type": "FeatureCollection",
      "features": [
        { "type": "Feature", "properties": { "wikidata_id": "Q1", "gwsyear": 1, "gweyear": 2 } },
        { "type": "Feature", "properties": { "wikidata_id": "Q2", "gwsyear": null, "gweyear": 2 } },
        { "type": "Feature", "properties": { "wikidata_id": "Q3", "gwsyear": "x", "gweyear": 2 } },
        { "type": "Feature", "properties": { "wikidata_id": "Q4", "gweyear": 2 } },
        { "type": "Feature", "geometry": null },
        42,
        { "type": "Feature", "properties": { "wikidata_id": "Q5", "gwsyear": 3, "gweyear": 4 } }
      ]
    }))
    .unwrap();

    let records = parse_feature_collection("p.json", &bytes).unwrap();
    let ids: Vec<_> = records.iter().filter_map(|r| r.external_id.as_deref()).collect();
    assert_eq!(ids, ["Q1", "Q5"]);
  }

  #[test]
  fn untyped_collections_are_accepted() {
    let records = parse_feature_collection("x", br#"{"features":[]}"#).unwrap();
    assert!(records.is_empty());
  }

  #[test]
  fn etag_tracks_content() {
    let period = Period::new("p", 0, 10);
    let a = Shard::assemble(&period, &[collection(&["Q1"])]).unwrap();
    let b = Shard::assemble(&period, &[collection(&["Q1"])]).unwrap();
    let c = Shard::assemble(&period, &[collection(&["Q2"])]).unwrap();
    assert_eq!(a.etag(), b.etag());
    assert_ne!(a.etag(), c.etag());
    assert!(!a.ptr_eq(&b));
    assert!(a.ptr_eq(&a.clone()));
  }

  #[test]
  fn feature_collection_serialises_records() {
    let shard = Shard::from_records("p", vec![GeoRecord::new(Some("Q1"), "a", 1, 2)]);
    let value = serde_json::to_value(FeatureCollection::new(shard.records())).unwrap();
    assert_eq!(value["type"], "FeatureCollection");
    assert_eq!(value["features"][0]["properties"]["wikidata_id"], "Q1");
  }
}
