//! chronmap server: configuration, data source selection and the top-level
//! router.
//!
//! The binary in `main.rs` only parses flags, reads configuration and calls
//! into this crate.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use bytes::Bytes;
use chronmap_atlas::{Atlas, lineage::DEFAULT_RADIUS};
use chronmap_core::{
  period::{Period, PeriodTable},
  source::ShardSource,
};
use chronmap_source::{FsSource, HttpSource};
use serde::Deserialize;
use thiserror::Error;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:           String,
  pub port:           u16,
  /// Directory holding the shard artifacts.
  #[serde(default)]
  pub data_root:      Option<PathBuf>,
  /// Base URL the shard artifacts are served from.
  #[serde(default)]
  pub data_url:       Option<String>,
  #[serde(default)]
  pub wars_file:      Option<String>,
  #[serde(default)]
  pub chains_file:    Option<String>,
  #[serde(default = "default_lineage_radius")]
  pub lineage_radius: usize,
  /// Replaces the built-in period table when set.
  #[serde(default)]
  pub periods:        Option<Vec<Period>>,
}

impl ServerConfig {
  pub fn period_table(&self) -> Result<PeriodTable> {
    match &self.periods {
      Some(periods) => Ok(PeriodTable::new(periods.clone())?),
      None => Ok(PeriodTable::standard()),
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

fn default_lineage_radius() -> usize { DEFAULT_RADIUS }

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum Error {
  #[error("one of `data_root` or `data_url` must be set")]
  NoDataSource,

  #[error("`data_root` and `data_url` are mutually exclusive")]
  AmbiguousDataSource,

  #[error(transparent)]
  Source(#[from] chronmap_source::Error),

  #[error(transparent)]
  Data(#[from] chronmap_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Data source ──────────────────────────────────────────────────────────────

/// The configured backend.
#[derive(Debug, Clone)]
pub enum AnySource {
  Fs(FsSource),
  Http(HttpSource),
}

impl AnySource {
  pub async fn from_config(cfg: &ServerConfig) -> Result<Self> {
    match (&cfg.data_root, &cfg.data_url) {
      (Some(root), None) => Ok(Self::Fs(FsSource::open(root).await?)),
      (None, Some(url)) => Ok(Self::Http(HttpSource::new(url.as_str())?)),
      (None, None) => Err(Error::NoDataSource),
      (Some(_), Some(_)) => Err(Error::AmbiguousDataSource),
    }
  }
}

impl ShardSource for AnySource {
  async fn fetch_artifact(&self, name: &str) -> chronmap_core::Result<Bytes> {
    match self {
      Self::Fs(source) => source.fetch_artifact(name).await,
      Self::Http(source) => source.fetch_artifact(name).await,
    }
  }
}

// ─── Assembly ─────────────────────────────────────────────────────────────────

/// Build the atlas described by `cfg`, loading the war and chain
/// annotations if configured.
pub async fn build_atlas(cfg: &ServerConfig) -> Result<Atlas<AnySource>> {
  let table = cfg.period_table()?;
  let source = AnySource::from_config(cfg).await?;
  tracing::info!(periods = table.len(), ?source, "opened data source");

  let mut atlas = Atlas::new(table, source).with_lineage_radius(cfg.lineage_radius);
  if let Some(wars) = &cfg.wars_file {
    atlas = atlas.load_wars(wars).await?;
  }
  if let Some(chains) = &cfg.chains_file {
    atlas = atlas.load_chains(chains).await?;
  }
  Ok(atlas)
}

/// The top-level router: the JSON API under `/api`.
pub fn router<S>(atlas: Arc<Atlas<S>>) -> Router
where
  S: ShardSource + 'static,
{
  Router::new().nest("/api", chronmap_api::api_router(atlas))
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use tower::ServiceExt;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  fn scratch_dir() -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
      "chronmap-server-{}-{}",
      std::process::id(),
      NEXT.fetch_add(1, Ordering::SeqCst)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  #[test]
  fn defaults_apply_when_optional_keys_are_absent() {
    let cfg = parse("host = \"127.0.0.1\"\nport = 8080\ndata_url = \"http://localhost:9000\"");
    assert_eq!(cfg.lineage_radius, 1);
    assert!(cfg.wars_file.is_none());
    assert_eq!(cfg.period_table().unwrap(), PeriodTable::standard());
    assert_eq!(cfg.address(), "127.0.0.1:8080");
  }

  #[test]
  fn configured_periods_replace_the_built_in_table() {
    let cfg = parse(
      r#"
        host = "0.0.0.0"
        port = 80
        data_url = "http://localhost:9000"
        lineage_radius = 2

        [[periods]]
        name = "old"
        start_year = -500
        end_year = 0

        [[periods]]
        name = "new"
        start_year = 1
        end_year = 2000
        parts = 2
      "#,
    );
    let table = cfg.period_table().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.period_for_year(1500).unwrap().parts, 2);
    assert_eq!(cfg.lineage_radius, 2);
  }

  #[test]
  fn invalid_periods_are_rejected() {
    let cfg = parse(
      r#"
        host = "0.0.0.0"
        port = 80
        data_url = "http://localhost:9000"

        [[periods]]
        name = "a"
        start_year = 100
        end_year = 10
      "#,
    );
    assert!(matches!(
      cfg.period_table(),
      Err(Error::Data(chronmap_core::Error::InvalidPeriodTable(_)))
    ));
  }

  #[tokio::test]
  async fn exactly_one_data_source_is_required() {
    let none = parse("host = \"h\"\nport = 1");
    assert!(matches!(AnySource::from_config(&none).await, Err(Error::NoDataSource)));

    let both = parse("host = \"h\"\nport = 1\ndata_root = \"/tmp\"\ndata_url = \"http://x\"");
    assert!(matches!(
      AnySource::from_config(&both).await,
      Err(Error::AmbiguousDataSource)
    ));
  }

  #[tokio::test]
  async fn serves_shards_from_a_data_directory() {
    let dir = scratch_dir();
    std::fs::write(
      dir.join("all.json"),
      br#"{"type":"FeatureCollection","features":[
        {"type":"Feature","geometry":null,
         "properties":{"wikidata_id":"Q1","cntry_name":"Realm","gwsyear":1,"gweyear":900}}
      ]}"#,
    )
    .unwrap();
    std::fs::write(dir.join("wars.json"), br#"{"wars":{}}"#).unwrap();

    let mut cfg = parse("host = \"127.0.0.1\"\nport = 0\nwars_file = \"wars.json\"");
    cfg.data_root = Some(dir.clone());
    cfg.periods = Some(vec![Period::new("all", 1, 1000)]);

    let atlas = Arc::new(build_atlas(&cfg).await.unwrap());
    let req = Request::builder().uri("/api/shards/500").body(Body::empty()).unwrap();
    let resp = router(atlas).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["features"][0]["properties"]["cntry_name"], "Realm");

    std::fs::remove_dir_all(dir).ok();
  }

  #[tokio::test]
  async fn missing_annotation_file_fails_startup() {
    let dir = scratch_dir();
    let mut cfg = parse("host = \"127.0.0.1\"\nport = 0\nchains_file = \"chains.json\"");
    cfg.data_root = Some(dir.clone());

    assert!(matches!(
      build_atlas(&cfg).await,
      Err(Error::Data(chronmap_core::Error::Io { .. }))
    ));
    std::fs::remove_dir_all(dir).ok();
  }
}
