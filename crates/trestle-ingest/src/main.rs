//! `trestle`: bridge-inventory ingestion binary.
//!
//! Reads `trestle.toml` (or the path given with `--config`), layers
//! `TRESTLE_*` environment variables on top, validates the result, and then
//! runs one of:
//!
//! - `trestle run` (the default): fetch, normalize, deduplicate, load, refresh
//! - `trestle refresh`: only rebuild the destination's region aggregates
//! - `trestle stats`: print global and per-region condition statistics
//!
//! ```text
//! TRESTLE_DESTINATION__URL=https://db.example.org \
//! TRESTLE_DESTINATION__API_KEY=… \
//! TRESTLE_SOURCE__BASE_URL=https://wfs.example.org/ows \
//!   cargo run -p trestle-ingest --bin trestle -- run
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use trestle_core::store::RecordStore;
use trestle_ingest::{DestinationKind, IngestConfig, LazyStore, Phase, Pipeline};
use trestle_source::SourceClient;
use trestle_store_rest::RestStore;
use trestle_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Trestle bridge-inventory ingestion")]
struct Cli {
  /// Path to the TOML configuration file. Missing is fine; environment
  /// variables may supply everything.
  #[arg(short, long, default_value = "trestle.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Default)]
enum Command {
  /// Run the full ingestion pipeline.
  #[default]
  Run,
  /// Recompute the destination's region aggregates and exit.
  Refresh,
  /// Print global and per-region condition statistics.
  Stats,
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
  let command = cli.command.unwrap_or_default();

  let cfg = trestle_ingest::config::load(&cli.config)
    .with_context(|| format!("failed to read configuration from {:?}", cli.config))?;

  // Fatal before any network activity.
  let checked = match command {
    Command::Run => cfg.validate(),
    Command::Refresh | Command::Stats => cfg.validate_destination(),
  };
  if let Err(e) = checked {
    tracing::error!(phase = %Phase::Error, error = %e, "configuration error");
    return Err(e).context("invalid configuration");
  }

  match cfg.destination.kind {
    DestinationKind::Sqlite => {
      let path = cfg
        .destination
        .path
        .as_deref()
        .map(expand_tilde)
        .context("destination.path is not set")?;
      let threshold = cfg.pipeline.critical_threshold;
      // Nothing is created on disk until the first store call.
      let store = LazyStore::new(move || {
        let path = path.clone();
        async move {
          tracing::debug!(?path, "opening store");
          SqliteStore::open(&path)
            .await
            .map(|store| store.with_critical_threshold(threshold))
        }
      });
      dispatch(command, &cfg, store).await
    }
    DestinationKind::Rest => {
      let store =
        RestStore::new(cfg.destination.rest()).context("failed to build REST client")?;
      dispatch(command, &cfg, store).await
    }
  }
}

async fn dispatch<S: RecordStore>(
  command: Command,
  cfg: &IngestConfig,
  store: S,
) -> anyhow::Result<()> {
  match command {
    Command::Run => run(cfg, store).await,
    Command::Refresh => refresh(store).await,
    Command::Stats => stats(store).await,
  }
}

async fn run<S: RecordStore>(cfg: &IngestConfig, store: S) -> anyhow::Result<()> {
  let source =
    SourceClient::connect(&cfg.source).context("failed to build HTTP client")?;
  tracing::info!(
    endpoint = %cfg.source.base_url,
    type_name = %cfg.source.type_name,
    strategy = ?cfg.source.strategy,
    "starting ingestion"
  );

  let mut pipeline = Pipeline::new(source, store, cfg.pipeline.clone());
  let summary = pipeline.run().await?;
  println!("{summary}");
  Ok(())
}

async fn refresh<S: RecordStore>(store: S) -> anyhow::Result<()> {
  store
    .refresh_aggregates()
    .await
    .context("aggregate refresh failed")?;
  tracing::info!("region aggregates refreshed");
  Ok(())
}

async fn stats<S: RecordStore>(store: S) -> anyhow::Result<()> {
  let rows = store.count().await.context("failed to count rows")?;
  let global = store
    .global_stats()
    .await
    .context("failed to read global statistics")?;
  let regions = store
    .region_stats()
    .await
    .context("failed to read region statistics")?;

  println!("rows           {rows}");
  println!("scored         {}", global.scored_count);
  println!("avg condition  {}", fmt_opt(global.avg_condition, 2));
  println!("avg year built {}", fmt_opt(global.avg_year_built, 0));
  println!();
  println!(
    "{:<24} {:>7} {:>7} {:>6} {:>9} {:>7} {:>5} {:>5}",
    "region", "bridges", "scored", "avg", "critical", "crit %", "min", "max"
  );
  for r in &regions {
    println!(
      "{:<24} {:>7} {:>7} {:>6} {:>9} {:>7.1} {:>5} {:>5}",
      r.region,
      r.bridge_count,
      r.scored_count,
      fmt_opt(r.avg_condition, 2),
      r.critical_count,
      r.critical_pct,
      fmt_opt(r.min_condition, 1),
      fmt_opt(r.max_condition, 1),
    );
  }
  Ok(())
}

fn fmt_opt(v: Option<f64>, precision: usize) -> String {
  v.map_or_else(|| "-".to_owned(), |v| format!("{v:.precision$}"))
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
