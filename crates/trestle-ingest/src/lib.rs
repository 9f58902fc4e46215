//! The Trestle ingestion pipeline.
//!
//! Composes a [`trestle_source::FeatureSource`], the [`Normalizer`], the
//! [`Deduplicator`], and a [`Loader`] over any
//! [`trestle_core::store::RecordStore`] into one batch run driven by
//! [`Pipeline::run`]. Configuration is read once into an [`IngestConfig`]
//! and threaded through constructors.

pub mod config;
pub mod dedup;
pub mod error;
pub mod lazy;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod subdivision;
pub mod summary;

pub use self::config::{DestinationConfig, DestinationKind, IngestConfig, PipelineConfig};
pub use dedup::Deduplicator;
pub use error::{ConfigError, PipelineError};
pub use lazy::LazyStore;
pub use loader::{FailedBatch, LoadReport, Loader, RefreshOutcome};
pub use normalize::{Normalizer, Rejection};
pub use pipeline::{Phase, Pipeline};
pub use summary::RunSummary;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests;
