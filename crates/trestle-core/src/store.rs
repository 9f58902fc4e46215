//! The `RecordStore` trait: the pipeline's only contract with the
//! destination.
//!
//! The trait is implemented by storage backends (`trestle-store-sqlite`,
//! `trestle-store-rest`). The ingest crate depends on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  record::CanonicalRecord,
  stats::{GlobalStats, RegionAggregate},
};

/// Abstraction over a destination table keyed by `asset_id`.
///
/// Writes are upserts: inserting a record whose `asset_id` already exists
/// replaces the stored row, so repeating a load is idempotent. Rows are never
/// deleted through this trait.
///
/// All methods return `Send` futures so the trait can be used from a
/// multi-threaded tokio runtime.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert-or-replace `records` as a single unit. Returns the number of rows
  /// written. Either the whole batch lands or none of it does.
  fn upsert_batch<'a>(
    &'a self,
    records: &'a [CanonicalRecord],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Recompute region-level aggregates from the full table.
  fn refresh_aggregates(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Global statistics over rows with a present condition score.
  fn global_stats(
    &self,
  ) -> impl Future<Output = Result<GlobalStats, Self::Error>> + Send + '_;

  /// The region aggregates as of the last refresh, ordered by region.
  fn region_stats(
    &self,
  ) -> impl Future<Output = Result<Vec<RegionAggregate>, Self::Error>> + Send + '_;

  /// Total number of persisted rows.
  fn count(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Retrieve a single row by asset id. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    asset_id: &'a str,
  ) -> impl Future<Output = Result<Option<CanonicalRecord>, Self::Error>> + Send + 'a;
}
