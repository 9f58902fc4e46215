//! The Loader: batched idempotent upserts, then an aggregate refresh.
//!
//! A failing batch is recorded and skipped; the remaining batches still run.
//! A failing refresh leaves the loaded rows valid and only makes the derived
//! aggregates stale, so it is reported as a warning rather than an error.

use std::fmt;

use trestle_core::{record::CanonicalRecord, store::RecordStore};

/// Records per upsert call unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// One upsert call that the destination rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedBatch {
  /// Zero-based position of the batch in the load.
  pub index: usize,
  pub size:  usize,
  pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RefreshOutcome {
  #[default]
  NotRun,
  Refreshed,
  Failed { error: String },
}

impl fmt::Display for RefreshOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NotRun => f.write_str("not run"),
      Self::Refreshed => f.write_str("ok"),
      Self::Failed { error } => write!(f, "FAILED ({error}); run `trestle refresh` to retry"),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
  /// Rows in batches the destination accepted.
  pub succeeded:      usize,
  pub failed_batches: Vec<FailedBatch>,
  pub refresh:        RefreshOutcome,
}

impl LoadReport {
  pub fn failed_rows(&self) -> usize { self.failed_batches.iter().map(|b| b.size).sum() }
}

/// Writes a record set to a [`RecordStore`] in fixed-size batches.
pub struct Loader<'s, S> {
  store:      &'s S,
  batch_size: usize,
}

impl<'s, S: RecordStore> Loader<'s, S> {
  pub fn new(store: &'s S, batch_size: usize) -> Self {
    Self { store, batch_size: batch_size.max(1) }
  }

  /// Upsert every batch, then refresh the aggregates.
  pub async fn load(&self, records: &[CanonicalRecord]) -> LoadReport {
    let mut report = self.upsert_all(records).await;
    report.refresh = self.refresh().await;
    report
  }

  /// Upsert every batch without refreshing. The returned report's
  /// `refresh` is [`RefreshOutcome::NotRun`].
  pub async fn upsert_all(&self, records: &[CanonicalRecord]) -> LoadReport {
    let batches = records.len().div_ceil(self.batch_size);
    let mut report = LoadReport::default();

    for (index, batch) in records.chunks(self.batch_size).enumerate() {
      match self.store.upsert_batch(batch).await {
        Ok(_) => {
          report.succeeded += batch.len();
          tracing::debug!(batch = index + 1, of = batches, rows = batch.len(), "batch upserted");
        }
        Err(e) => {
          tracing::error!(
            batch = index + 1,
            of = batches,
            rows = batch.len(),
            error = %e,
            "batch upsert failed; continuing with the next batch"
          );
          report.failed_batches.push(FailedBatch {
            index,
            size: batch.len(),
            error: e.to_string(),
          });
        }
      }
    }

    tracing::info!(
      succeeded = report.succeeded,
      failed_batches = report.failed_batches.len(),
      "load finished"
    );
    report
  }

  /// Ask the destination to recompute its region aggregates.
  pub async fn refresh(&self) -> RefreshOutcome {
    match self.store.refresh_aggregates().await {
      Ok(()) => {
        tracing::info!("region aggregates refreshed");
        RefreshOutcome::Refreshed
      }
      Err(e) => {
        tracing::warn!(
          error = %e,
          "aggregate refresh failed; loaded rows are intact, \
           run `trestle refresh` to rebuild the aggregates"
        );
        RefreshOutcome::Failed { error: e.to_string() }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::MemoryStore;

  fn records(n: usize) -> Vec<CanonicalRecord> {
    (0..n)
      .map(|i| CanonicalRecord::new(format!("B-{i:04}"), 51.0, 10.0))
      .collect()
  }

  #[tokio::test]
  async fn splits_into_fixed_size_batches() {
    let store = MemoryStore::default();
    let report = Loader::new(&store, DEFAULT_BATCH_SIZE).load(&records(1201)).await;

    assert_eq!(store.upsert_calls(), 3);
    assert_eq!(report.succeeded, 1201);
    assert!(report.failed_batches.is_empty());
    assert_eq!(report.refresh, RefreshOutcome::Refreshed);
    assert_eq!(store.rows().len(), 1201);
  }

  #[tokio::test]
  async fn failed_batch_is_isolated() {
    let store = MemoryStore::failing_upserts([2]);
    let all = records(6);
    let report = Loader::new(&store, 2).load(&all).await;

    assert_eq!(store.upsert_calls(), 3, "batch 3 still attempted");
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed_batches.len(), 1);
    assert_eq!(report.failed_batches[0].index, 1);
    assert_eq!(report.failed_batches[0].size, 2);
    assert_eq!(report.failed_rows(), 2);

    let stored: Vec<_> = store.rows().into_iter().map(|r| r.asset_id).collect();
    assert_eq!(stored, ["B-0000", "B-0001", "B-0004", "B-0005"]);
    assert_eq!(report.refresh, RefreshOutcome::Refreshed, "refresh runs regardless");
  }

  #[tokio::test]
  async fn refresh_failure_is_reported_not_raised() {
    let store = MemoryStore::failing_refresh();
    let report = Loader::new(&store, DEFAULT_BATCH_SIZE).load(&records(3)).await;

    assert_eq!(report.succeeded, 3);
    assert!(matches!(report.refresh, RefreshOutcome::Failed { .. }));
    assert!(report.refresh.to_string().contains("trestle refresh"));
  }

  #[tokio::test]
  async fn upsert_all_does_not_refresh() {
    let store = MemoryStore::default();
    let report = Loader::new(&store, 10).upsert_all(&records(3)).await;
    assert_eq!(report.refresh, RefreshOutcome::NotRun);
    assert_eq!(store.refreshes(), 0);
  }

  #[tokio::test]
  async fn zero_batch_size_is_clamped() {
    let store = MemoryStore::default();
    let report = Loader::new(&store, 0).upsert_all(&records(2)).await;
    assert_eq!(report.succeeded, 2);
    assert_eq!(store.upsert_calls(), 2);
  }
}
