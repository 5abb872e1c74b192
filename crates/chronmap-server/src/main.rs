//! chronmap server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! configured shard source, and serves the JSON API over HTTP.
//!
//! # Validating a configuration
//!
//! ```sh
//! cargo run -p chronmap-server -- --config config.toml --check
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use chronmap_server::{ServerConfig, build_atlas, router};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Historical boundary map server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Validate the period table, print it and exit.
  #[arg(long)]
  check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CHRONMAP"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  if cli.check {
    let table = server_cfg.period_table().context("invalid period table")?;
    for period in table.iter() {
      println!(
        "{:<16} {:>8} .. {:<8} {} part(s)",
        period.name, period.start_year, period.end_year, period.parts
      );
    }
    return Ok(());
  }

  server_cfg.data_root = server_cfg.data_root.as_deref().map(expand_tilde);

  let atlas = build_atlas(&server_cfg)
    .await
    .context("failed to initialise atlas")?;

  let app = router(Arc::new(atlas));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
