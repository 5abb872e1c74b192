//! [`HttpSource`]: artifacts fetched from a static file server.

use std::time::{Duration, Instant};

use bytes::Bytes;
use chronmap_core::source::ShardSource;
use reqwest::Client;

use crate::{Error, Result};

/// Fetches `<base_url>/<artifact>` over HTTP.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpSource {
  client:   Client,
  base_url: String,
}

impl HttpSource {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let base_url = base_url.into();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
      return Err(Error::InvalidBaseUrl(base_url));
    }
    let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_owned(),
    })
  }

  fn url(&self, name: &str) -> String { format!("{}/{}", self.base_url, name) }
}

impl ShardSource for HttpSource {
  async fn fetch_artifact(&self, name: &str) -> chronmap_core::Result<Bytes> {
    let url = self.url(name);
    let started = Instant::now();

    let resp = self.client.get(&url).send().await.map_err(|e| {
      tracing::warn!(%url, error = %e, "artifact request failed");
      chronmap_core::Error::io(name, Error::Http(e))
    })?;

    let status = resp.status();
    if !status.is_success() {
      tracing::warn!(%url, %status, "artifact request returned non-success status");
      return Err(chronmap_core::Error::io(name, format!("GET {url} → {status}")));
    }

    let bytes = resp
      .bytes()
      .await
      .map_err(|e| chronmap_core::Error::io(name, Error::Http(e)))?;

    tracing::debug!(
      %url,
      bytes = bytes.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "fetched artifact"
    );
    Ok(bytes)
  }
}
