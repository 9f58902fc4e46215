//! Error types for `trestle-ingest`.

use thiserror::Error;

/// A configuration problem detected before any network activity.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("destination endpoint is not set (destination.url or destination.path)")]
  MissingEndpoint,

  #[error("destination credential is not set (destination.api_key)")]
  MissingCredential,

  #[error("source endpoint is not set (source.base_url)")]
  MissingSourceUrl,

  #[error("{field} must be greater than zero")]
  NonPositive { field: &'static str },

  #[error("source.tile_size_m yields {tiles} tiles; at most {max} are allowed")]
  TooManyTiles { tiles: u64, max: u64 },
}

/// Why a run ended without loading anything.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// The source was exhausted without yielding a single usable record. The
  /// destination was left untouched.
  #[error(
    "no usable records after draining the source ({units} units, {fetched} features fetched)"
  )]
  NoData { units: u64, fetched: u64 },
}
