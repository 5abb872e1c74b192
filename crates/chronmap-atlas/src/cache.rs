//! [`TemporalCache`]: loaded shards keyed by period, with single-flight
//! loading.
//!
//! An entry moves `Empty → Loading → Ready | Failed`. `Ready` is never
//! reloaded implicitly; `Failed` is retried by the next request; only
//! [`TemporalCache::clear`] returns entries to `Empty`.
//!
//! Each load runs on its own task. Every caller for the period, including
//! the one that started it, waits on one `watch` channel and receives the
//! same result. Callers that give up do not cancel the load.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard},
  time::Instant,
};

use chronmap_core::{
  Error, Result,
  period::Period,
  shard::Shard,
  source::ShardSource,
};
use tokio::sync::watch;

type LoadResult = Option<Result<Shard>>;

enum Slot {
  Loading(watch::Receiver<LoadResult>),
  Ready(Shard),
  Failed(Error),
}

#[derive(Default)]
struct Entries {
  slots:      HashMap<String, Slot>,
  /// Bumped by `clear()`; loads started under an older generation do not
  /// write back.
  generation: u64,
}

/// A point-in-time view of one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
  Empty,
  Loading,
  Ready,
  Failed(Error),
}

// ─── Cache ───────────────────────────────────────────────────────────────────

/// Owns every loaded shard for the lifetime of the process.
pub struct TemporalCache<S> {
  source:  Arc<S>,
  entries: Arc<Mutex<Entries>>,
}

enum Next {
  Hit(Shard),
  Wait(watch::Receiver<LoadResult>),
}

impl<S: ShardSource + 'static> TemporalCache<S> {
  pub fn new(source: S) -> Self {
    Self {
      source:  Arc::new(source),
      entries: Arc::new(Mutex::new(Entries::default())),
    }
  }

  pub fn source(&self) -> &S { &self.source }

  /// The shard for `period`, loading it if no load has succeeded yet.
  pub async fn get(&self, period: &Period) -> Result<Shard> {
    loop {
      let next = {
        let mut entries = self.lock();
        match entries.slots.get(&period.name) {
          Some(Slot::Ready(shard)) => Next::Hit(shard.clone()),
          // A closed channel on a `Loading` slot means the load task died.
          Some(Slot::Loading(rx)) if rx.has_changed().is_ok() => {
            tracing::debug!(period = %period.name, "joining in-flight shard load");
            Next::Wait(rx.clone())
          }
          Some(Slot::Loading(_)) | Some(Slot::Failed(_)) | None => {
            let (tx, rx) = watch::channel(None);
            entries.slots.insert(period.name.clone(), Slot::Loading(rx.clone()));
            self.spawn_load(period.clone(), tx, entries.generation);
            Next::Wait(rx)
          }
        }
      };

      match next {
        Next::Hit(shard) => {
          tracing::debug!(period = %period.name, "shard cache hit");
          return Ok(shard);
        }
        Next::Wait(mut rx) => {
          let outcome = rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|done| done.clone());
          match outcome {
            Some(result) => return result,
            // The load task went away without an answer; start another.
            None => continue,
          }
        }
      }
    }
  }

  fn spawn_load(&self, period: Period, tx: watch::Sender<LoadResult>, generation: u64) {
    let source = self.source.clone();
    let entries = self.entries.clone();

    tokio::spawn(async move {
      tracing::info!(period = %period.name, parts = period.parts, "loading shard");
      let started = Instant::now();
      let result = source.load(&period).await;
      let elapsed_ms = started.elapsed().as_millis() as u64;

      match &result {
        Ok(shard) => tracing::info!(
          period = %period.name,
          records = shard.len(),
          elapsed_ms,
          "shard loaded"
        ),
        Err(e) => tracing::warn!(
          period = %period.name,
          error = %e,
          elapsed_ms,
          "shard load failed"
        ),
      }

      {
        let mut entries = lock_entries(&entries);
        if entries.generation == generation {
          let slot = match &result {
            Ok(shard) => Slot::Ready(shard.clone()),
            Err(e) => Slot::Failed(e.clone()),
          };
          entries.slots.insert(period.name.clone(), slot);
        } else {
          tracing::debug!(period = %period.name, "cache cleared during load; not storing");
        }
      }

      tx.send_replace(Some(result));
    });
  }

  /// Reset every entry to `Empty`. Loads already in flight still deliver
  /// their result to their own waiters but are not stored.
  pub fn clear(&self) {
    let mut entries = self.lock();
    let dropped = entries.slots.len();
    entries.slots.clear();
    entries.generation += 1;
    tracing::info!(entries = dropped, "shard cache cleared");
  }

  pub fn state(&self, period: &str) -> EntryState {
    match self.lock().slots.get(period) {
      None => EntryState::Empty,
      Some(Slot::Loading(_)) => EntryState::Loading,
      Some(Slot::Ready(_)) => EntryState::Ready,
      Some(Slot::Failed(e)) => EntryState::Failed(e.clone()),
    }
  }

  /// Names of periods whose shard is `Ready`, sorted.
  pub fn loaded_periods(&self) -> Vec<String> {
    let mut names: Vec<String> = self
      .lock()
      .slots
      .iter()
      .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
      .map(|(name, _)| name.clone())
      .collect();
    names.sort();
    names
  }

  fn lock(&self) -> MutexGuard<'_, Entries> { lock_entries(&self.entries) }
}

fn lock_entries(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
  // Never held across an await and never left half-updated.
  entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use chronmap_core::record::GeoRecord;
  use chronmap_source::MemorySource;

  use super::*;

  fn period() -> Period { Period::new("p", 0, 100) }

  fn slow_source(latency_ms: u64) -> MemorySource {
    let source = MemorySource::new().with_latency(Duration::from_millis(latency_ms));
    source
      .insert_records(&period(), vec![GeoRecord::new(Some("Q1"), "a", 1, 2)])
      .unwrap();
    source
  }

  #[tokio::test]
  async fn concurrent_callers_share_one_load() {
    let cache = Arc::new(TemporalCache::new(slow_source(50)));

    let mut handles = Vec::new();
    for _ in 0..16 {
      let cache = cache.clone();
      handles.push(tokio::spawn(async move { cache.get(&period()).await }));
    }

    let mut shards = Vec::new();
    for h in handles {
      shards.push(h.await.unwrap().unwrap());
    }

    assert_eq!(cache.source().fetch_count(), 1);
    assert!(shards.iter().all(|s| s.ptr_eq(&shards[0])));
    assert_eq!(cache.state("p"), EntryState::Ready);
  }

  #[tokio::test]
  async fn ready_entries_are_not_reloaded() {
    let cache = TemporalCache::new(slow_source(0));
    let first = cache.get(&period()).await.unwrap();
    let second = cache.get(&period()).await.unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(cache.source().fetch_count(), 1);
  }

  #[tokio::test]
  async fn clear_forces_a_reload() {
    let cache = TemporalCache::new(slow_source(0));
    cache.get(&period()).await.unwrap();
    assert_eq!(cache.loaded_periods(), ["p"]);

    cache.clear();
    assert_eq!(cache.state("p"), EntryState::Empty);
    assert!(cache.loaded_periods().is_empty());

    cache.get(&period()).await.unwrap();
    assert_eq!(cache.source().fetch_count(), 2);
  }

  #[tokio::test]
  async fn failure_reaches_every_waiter_and_is_retried_later() {
    let cache = Arc::new(TemporalCache::new(slow_source(50)));
    cache.source().fail("p.json");

    let mut handles = Vec::new();
    for _ in 0..8 {
      let cache = cache.clone();
      handles.push(tokio::spawn(async move { cache.get(&period()).await }));
    }
    for h in handles {
      assert!(matches!(h.await.unwrap(), Err(Error::Io { .. })));
    }
    assert_eq!(cache.source().fetch_count(), 1);
    assert!(matches!(cache.state("p"), EntryState::Failed(Error::Io { .. })));

    cache.source().heal("p.json");
    assert!(cache.get(&period()).await.is_ok());
    assert_eq!(cache.source().fetch_count(), 2);
    assert_eq!(cache.state("p"), EntryState::Ready);
  }

  #[tokio::test]
  async fn dropped_first_caller_does_not_restart_the_load() {
    let cache = Arc::new(TemporalCache::new(slow_source(100)));

    let first = {
      let cache = cache.clone();
      tokio::spawn(async move { cache.get(&period()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(cache.state("p"), EntryState::Loading);

    let waiter = {
      let cache = cache.clone();
      tokio::spawn(async move { cache.get(&period()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    first.abort();
    let _ = first.await;

    assert!(waiter.await.unwrap().is_ok());
    assert_eq!(cache.source().fetch_count(), 1);
    assert_eq!(cache.state("p"), EntryState::Ready);
  }

  #[tokio::test]
  async fn abandoned_caller_leaves_the_load_running() {
    let cache = TemporalCache::new(slow_source(50));
    let attempt = tokio::time::timeout(Duration::from_millis(10), cache.get(&period())).await;
    assert!(attempt.is_err());
    assert_eq!(cache.state("p"), EntryState::Loading);

    let shard = cache.get(&period()).await.unwrap();
    assert_eq!(shard.len(), 1);
    assert_eq!(cache.source().fetch_count(), 1);
    assert_eq!(cache.state("p"), EntryState::Ready);
  }

  #[tokio::test]
  async fn load_finishing_after_clear_is_not_stored() {
    let cache = Arc::new(TemporalCache::new(slow_source(50)));

    let pending = {
      let cache = cache.clone();
      tokio::spawn(async move { cache.get(&period()).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    cache.clear();

    assert!(pending.await.unwrap().is_ok());
    assert_eq!(cache.state("p"), EntryState::Empty);
  }
}
