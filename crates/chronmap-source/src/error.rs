//! Error type for `chronmap-source`.
//!
//! These errors surface when a source is constructed. Failures while
//! fetching an artifact are reported through the core taxonomy
//! ([`chronmap_core::Error::Io`]) so the cache can hand them to every
//! waiter.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("io error on {path:?}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("{0:?} is not a directory")]
  NotADirectory(PathBuf),

  #[error("http client error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("invalid base url {0:?}")]
  InvalidBaseUrl(String),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
