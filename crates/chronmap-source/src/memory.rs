//! [`MemorySource`]: artifacts held in memory.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use bytes::Bytes;
use chronmap_core::{
  period::Period,
  record::GeoRecord,
  shard::FeatureCollection,
  source::ShardSource,
};

use crate::Result;

#[derive(Default)]
struct Inner {
  artifacts: HashMap<String, Bytes>,
  failing:   HashSet<String>,
  fetches:   HashMap<String, usize>,
}

/// An in-memory source that records how often each artifact was fetched.
///
/// Artifacts can be replaced or made to fail between fetches, and an
/// optional latency is applied to every fetch so concurrent callers can
/// overlap.
#[derive(Default)]
pub struct MemorySource {
  inner:   Mutex<Inner>,
  total:   AtomicUsize,
  latency: Option<Duration>,
}

impl MemorySource {
  pub fn new() -> Self { Self::default() }

  /// Sleep for `latency` inside every fetch.
  pub fn with_latency(mut self, latency: Duration) -> Self {
    self.latency = Some(latency);
    self
  }

  /// Store (or replace) a raw artifact.
  pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Bytes>) {
    self.lock().artifacts.insert(name.into(), bytes.into());
  }

  /// Store `records` as the artifacts of `period`, split into contiguous
  /// runs across its parts. Trailing parts may be empty.
  pub fn insert_records(&self, period: &Period, records: Vec<GeoRecord>) -> Result<()> {
    let names = period.artifact_names();
    let chunk = records.len().div_ceil(names.len()).max(1);

    let mut records = records.into_iter();
    for name in names {
      self.insert_artifact_records(name, records.by_ref().take(chunk).collect())?;
    }
    Ok(())
  }

  /// Store `records` as a FeatureCollection under `name`.
  pub fn insert_artifact_records(
    &self,
    name: impl Into<String>,
    records: Vec<GeoRecord>,
  ) -> Result<()> {
    let records: Vec<_> = records.into_iter().map(std::sync::Arc::new).collect();
    let bytes = serde_json::to_vec(&FeatureCollection::new(&records))?;
    self.insert(name, bytes);
    Ok(())
  }

  /// Make every fetch of `name` fail until [`heal`](Self::heal) is called.
  pub fn fail(&self, name: impl Into<String>) { self.lock().failing.insert(name.into()); }

  pub fn heal(&self, name: &str) { self.lock().failing.remove(name); }

  /// Total fetches across all artifacts.
  pub fn fetch_count(&self) -> usize { self.total.load(Ordering::SeqCst) }

  /// Fetches of one artifact.
  pub fn fetch_count_for(&self, name: &str) -> usize {
    self.lock().fetches.get(name).copied().unwrap_or(0)
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
    // Poisoned only after a panic elsewhere; the map itself stays consistent.
    self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl ShardSource for MemorySource {
  async fn fetch_artifact(&self, name: &str) -> chronmap_core::Result<Bytes> {
    self.total.fetch_add(1, Ordering::SeqCst);
    *self.lock().fetches.entry(name.to_owned()).or_default() += 1;

    if let Some(latency) = self.latency {
      tokio::time::sleep(latency).await;
    }

    let inner = self.lock();
    if inner.failing.contains(name) {
      return Err(chronmap_core::Error::io(name, "simulated transport failure"));
    }
    inner
      .artifacts
      .get(name)
      .cloned()
      .ok_or_else(|| chronmap_core::Error::io(name, "404 Not Found"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn counts_fetches_and_serves_records() {
    let source = MemorySource::new();
    let period = Period::new("p", 0, 10);
    source
      .insert_records(&period, vec![GeoRecord::new(Some("Q1"), "a", 1, 2)])
      .unwrap();

    let shard = source.load(&period).await.unwrap();
    assert_eq!(shard.len(), 1);
    assert_eq!(source.fetch_count(), 1);
    assert_eq!(source.fetch_count_for("p.json"), 1);
  }

  #[tokio::test]
  async fn records_are_spread_across_every_part() {
    let source = MemorySource::new();
    let period = Period::new("p", 0, 10).with_parts(3);
    let records = (1..=5)
      .map(|i| GeoRecord::new(Some(format!("Q{i}").as_str()), "r", i, i + 1))
      .collect();
    source.insert_records(&period, records).unwrap();

    let shard = source.load(&period).await.unwrap();
    let ids: Vec<_> = shard.records().iter().map(|r| r.external_id.as_deref().unwrap()).collect();
    assert_eq!(ids, ["Q1", "Q2", "Q3", "Q4", "Q5"]);
    for name in period.artifact_names() {
      assert_eq!(source.fetch_count_for(&name), 1);
    }
  }

  #[tokio::test]
  async fn failures_can_be_injected_and_healed() {
    let source = MemorySource::new();
    let period = Period::new("p", 0, 10);
    source.insert_records(&period, vec![]).unwrap();
    source.fail("p.json");

    assert!(matches!(
      source.load(&period).await,
      Err(chronmap_core::Error::Io { .. })
    ));
    source.heal("p.json");
    assert!(source.load(&period).await.is_ok());
    assert_eq!(source.fetch_count_for("p.json"), 2);
  }
}
