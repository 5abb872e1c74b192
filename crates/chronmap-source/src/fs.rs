//! [`FsSource`]: artifacts read from a local directory.

use std::{
  path::{Path, PathBuf},
  time::Instant,
};

use bytes::Bytes;
use chronmap_core::source::ShardSource;

use crate::{Error, Result};

/// Reads `<root>/<artifact>` with `tokio::fs`.
#[derive(Debug, Clone)]
pub struct FsSource {
  root: PathBuf,
}

impl FsSource {
  /// Open a source rooted at `root`, which must be an existing directory.
  pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
    let root = root.as_ref().to_path_buf();
    let meta = tokio::fs::metadata(&root).await.map_err(|source| Error::Io {
      path: root.clone(),
      source,
    })?;
    if !meta.is_dir() {
      return Err(Error::NotADirectory(root));
    }
    Ok(Self { root })
  }

  pub fn root(&self) -> &Path { &self.root }

  fn path_for(&self, name: &str) -> chronmap_core::Result<PathBuf> {
    if !is_plain_file_name(name) {
      return Err(chronmap_core::Error::io(name, "artifact name is not a plain file name"));
    }
    Ok(self.root.join(name))
  }
}

/// Artifact names are single path components; no separators, no `..`.
fn is_plain_file_name(name: &str) -> bool {
  !name.is_empty()
    && !name.starts_with('.')
    && !name.contains(['/', '\\'])
}

impl ShardSource for FsSource {
  async fn fetch_artifact(&self, name: &str) -> chronmap_core::Result<Bytes> {
    let path = self.path_for(name)?;
    let started = Instant::now();

    let bytes = tokio::fs::read(&path).await.map_err(|source| {
      let err = Error::Io { path: path.clone(), source };
      tracing::warn!(artifact = %name, error = %err, "artifact read failed");
      chronmap_core::Error::io(name, err)
    })?;

    tracing::debug!(
      artifact = %name,
      bytes = bytes.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "read artifact"
    );
    Ok(Bytes::from(bytes))
  }
}
