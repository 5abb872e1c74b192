//! The `ShardSource` trait: the I/O boundary shards are loaded through.
//!
//! Implementations (filesystem, HTTP, in-memory) live in `chronmap-source`.
//! Higher layers depend on this abstraction, not on any concrete backend.
//! Sources never cache; that is the temporal cache's job.

use std::{future::Future, sync::Arc};

use bytes::Bytes;

use crate::{Result, period::Period, shard::Shard};

/// Retrieves raw artifacts by name.
///
/// All methods return `Send` futures so sources can be shared across tasks
/// on a multi-threaded runtime.
pub trait ShardSource: Send + Sync {
  /// Fetch one artifact (e.g. `classical.json`).
  ///
  /// Fails with [`Error::Io`](crate::Error::Io) when the artifact cannot be
  /// retrieved.
  fn fetch_artifact<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Bytes>> + Send + 'a;

  /// Fetch every part of `period`'s shard, in part order.
  fn fetch<'a>(
    &'a self,
    period: &'a Period,
  ) -> impl Future<Output = Result<Vec<Bytes>>> + Send + 'a {
    async move {
      let mut parts = Vec::with_capacity(period.parts as usize);
      for name in period.artifact_names() {
        parts.push(self.fetch_artifact(&name).await?);
      }
      Ok(parts)
    }
  }

  /// Fetch and parse `period`'s shard.
  fn load<'a>(
    &'a self,
    period: &'a Period,
  ) -> impl Future<Output = Result<Shard>> + Send + 'a {
    async move {
      let parts = self.fetch(period).await?;
      Shard::assemble(period, &parts)
    }
  }
}

impl<S: ShardSource> ShardSource for Arc<S> {
  fn fetch_artifact<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Bytes>> + Send + 'a {
    (**self).fetch_artifact(name)
  }

  fn fetch<'a>(
    &'a self,
    period: &'a Period,
  ) -> impl Future<Output = Result<Vec<Bytes>>> + Send + 'a {
    (**self).fetch(period)
  }

  fn load<'a>(
    &'a self,
    period: &'a Period,
  ) -> impl Future<Output = Result<Shard>> + Send + 'a {
    (**self).load(period)
  }
}
