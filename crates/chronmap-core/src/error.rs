//! Error types for `chronmap-core`.
//!
//! "No data" outcomes (a year outside the period table, an identifier that
//! does not resolve) are never errors; they are returned as `None`.

use thiserror::Error;

/// The error taxonomy shared by every crate in the workspace.
///
/// `Clone` so that a single failed shard load can be handed to every caller
/// waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// The artifact could not be retrieved (missing file, non-success status,
  /// transport failure).
  #[error("failed to fetch {artifact}: {message}")]
  Io { artifact: String, message: String },

  /// The artifact was retrieved but is not a well-formed record collection.
  #[error("malformed artifact {artifact}: {message}")]
  Format { artifact: String, message: String },

  #[error("invalid period table: {0}")]
  InvalidPeriodTable(String),
}

impl Error {
  pub fn io(artifact: impl Into<String>, message: impl ToString) -> Self {
    Self::Io {
      artifact: artifact.into(),
      message:  message.to_string(),
    }
  }

  pub fn format(artifact: impl Into<String>, message: impl ToString) -> Self {
    Self::Format {
      artifact: artifact.into(),
      message:  message.to_string(),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
