//! Error type for `trestle-store-rest`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid record: {0}")]
  Core(#[from] trestle_core::Error),

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{endpoint} → {status}: {body}")]
  Status { endpoint: String, status: u16, body: String },

  #[error("unexpected response body: {0}")]
  Json(#[from] serde_json::Error),

  #[error("missing or malformed Content-Range header")]
  ContentRange,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
