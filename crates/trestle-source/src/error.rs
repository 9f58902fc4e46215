//! Error type for `trestle-source`.

use thiserror::Error;

/// Why a single request unit (page or tile) failed.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("network error: {0}")]
  Network(#[from] reqwest::Error),

  #[error("{type_name}: unexpected HTTP status {status}")]
  Status { status: u16, type_name: String },

  #[error("malformed feature collection: {0}")]
  Decode(#[from] serde_json::Error),
}

pub type Result<T, E = SourceError> = std::result::Result<T, E>;
