//! Run configuration, deserialised once at startup and threaded through
//! constructors.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use trestle_core::stats::DEFAULT_CRITICAL_THRESHOLD;
use trestle_source::{MAX_TILES, SourceConfig, Strategy, grid_size};
use trestle_store_rest::RestConfig;

use crate::{error::ConfigError, loader::DEFAULT_BATCH_SIZE};

// ─── Destination ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
  #[default]
  Rest,
  Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
  pub kind:            DestinationKind,
  /// Project URL of the REST destination.
  pub url:             String,
  pub api_key:         String,
  /// Database file of the SQLite destination.
  pub path:            Option<PathBuf>,
  pub table:           String,
  pub refresh_fn:      String,
  pub global_stats_fn: String,
  pub region_stats_fn: String,
  pub timeout_secs:    u64,
}

impl Default for DestinationConfig {
  fn default() -> Self {
    let rest = RestConfig::default();
    Self {
      kind:            DestinationKind::Rest,
      url:             rest.url,
      api_key:         rest.api_key,
      path:            None,
      table:           rest.table,
      refresh_fn:      rest.refresh_fn,
      global_stats_fn: rest.global_stats_fn,
      region_stats_fn: rest.region_stats_fn,
      timeout_secs:    rest.timeout_secs,
    }
  }
}

impl DestinationConfig {
  pub fn rest(&self) -> RestConfig {
    RestConfig {
      url:             self.url.clone(),
      api_key:         self.api_key.clone(),
      table:           self.table.clone(),
      refresh_fn:      self.refresh_fn.clone(),
      global_stats_fn: self.global_stats_fn.clone(),
      region_stats_fn: self.region_stats_fn.clone(),
      timeout_secs:    self.timeout_secs,
    }
  }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// Records per upsert call.
  pub batch_size:         usize,
  /// Condition score at or above which a bridge counts as critical.
  pub critical_threshold: f64,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    Self { batch_size: DEFAULT_BATCH_SIZE, critical_threshold: DEFAULT_CRITICAL_THRESHOLD }
  }
}

// ─── Root ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
  pub source:      SourceConfig,
  pub destination: DestinationConfig,
  pub pipeline:    PipelineConfig,
}

impl IngestConfig {
  /// Reject configurations that cannot possibly run. Called before any I/O.
  pub fn validate(&self) -> Result<(), ConfigError> {
    self.validate_destination()?;

    if self.source.base_url.trim().is_empty() {
      return Err(ConfigError::MissingSourceUrl);
    }
    if self.source.page_size == 0 {
      return Err(ConfigError::NonPositive { field: "source.page_size" });
    }
    if self.source.strategy == Strategy::Tiled {
      if !(self.source.tile_size_m > 0.0) {
        return Err(ConfigError::NonPositive { field: "source.tile_size_m" });
      }
      let tiles = grid_size(&self.source.tiling_bounds(), self.source.tile_size_m);
      if tiles > MAX_TILES {
        return Err(ConfigError::TooManyTiles { tiles, max: MAX_TILES });
      }
    }
    if self.pipeline.batch_size == 0 {
      return Err(ConfigError::NonPositive { field: "pipeline.batch_size" });
    }
    Ok(())
  }

  /// The destination half of [`validate`](Self::validate); all that the
  /// `refresh` and `stats` commands need.
  pub fn validate_destination(&self) -> Result<(), ConfigError> {
    let dest = &self.destination;
    match dest.kind {
      DestinationKind::Rest => {
        if dest.url.trim().is_empty() {
          return Err(ConfigError::MissingEndpoint);
        }
        if dest.api_key.trim().is_empty() {
          return Err(ConfigError::MissingCredential);
        }
      }
      DestinationKind::Sqlite => {
        if dest.path.as_ref().is_none_or(|p| p.as_os_str().is_empty()) {
          return Err(ConfigError::MissingEndpoint);
        }
      }
    }
    Ok(())
  }
}

/// Layer the optional TOML file at `path` under `TRESTLE_*` environment
/// variables. Nested keys use a double underscore, e.g.
/// `TRESTLE_DESTINATION__API_KEY`.
pub fn load(path: &Path) -> Result<IngestConfig, ::config::ConfigError> {
  ::config::Config::builder()
    .add_source(::config::File::from(path).required(false))
    .add_source(
      ::config::Environment::with_prefix("TRESTLE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()?
    .try_deserialize()
}
