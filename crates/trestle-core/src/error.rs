//! Error types for `trestle-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("record has an empty asset id")]
  EmptyAssetId,

  #[error("record {asset_id} has non-finite coordinates")]
  NonFiniteCoordinates { asset_id: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
