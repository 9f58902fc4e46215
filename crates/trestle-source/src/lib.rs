//! Feature Source Client for Trestle.
//!
//! Pulls bridge features from a WFS endpoint one request unit at a time,
//! using either offset pagination or spatial tiling, and decodes each
//! response into [`trestle_core::record::RawFeature`]s. Transient failures
//! are retried once and then skipped so a run always makes forward progress.

mod client;
mod config;
mod pacing;
mod paged;
mod source;
mod tiled;

pub mod error;
pub mod query;
pub mod transport;
pub mod wire;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::SourceClient;
pub use config::{SourceConfig, Strategy};
pub use error::{Result, SourceError};
pub use paged::PagedSource;
pub use source::{Batch, FeatureSource, UnitOutcome};
pub use tiled::{MAX_TILES, TiledSource, grid_size, tile_grid};
