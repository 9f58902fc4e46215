//! [`LazyStore`]: a [`RecordStore`] that opens its backend on first use.
//!
//! Opening a file-backed store creates the file and its schema, so the
//! binary wraps the destination in a `LazyStore`. A run that ends in
//! [`PipelineError::NoData`](crate::PipelineError::NoData) never calls the
//! store and the destination is never created.

use std::future::Future;

use tokio::sync::OnceCell;
use trestle_core::{
  record::CanonicalRecord,
  stats::{GlobalStats, RegionAggregate},
  store::RecordStore,
};

pub struct LazyStore<S, F> {
  open:  F,
  store: OnceCell<S>,
}

impl<S, F, Fut> LazyStore<S, F>
where
  S: RecordStore,
  F: Fn() -> Fut + Send + Sync,
  Fut: Future<Output = Result<S, S::Error>> + Send,
{
  pub fn new(open: F) -> Self { Self { open, store: OnceCell::new() } }

  /// The backend, if any call has opened it yet.
  pub fn opened(&self) -> Option<&S> { self.store.get() }

  async fn backend(&self) -> Result<&S, S::Error> {
    self.store.get_or_try_init(|| (self.open)()).await
  }
}

impl<S, F, Fut> RecordStore for LazyStore<S, F>
where
  S: RecordStore,
  F: Fn() -> Fut + Send + Sync,
  Fut: Future<Output = Result<S, S::Error>> + Send + 'static,
{
  type Error = S::Error;

  async fn upsert_batch(&self, records: &[CanonicalRecord]) -> Result<usize, S::Error> {
    self.backend().await?.upsert_batch(records).await
  }

  async fn refresh_aggregates(&self) -> Result<(), S::Error> {
    self.backend().await?.refresh_aggregates().await
  }

  async fn global_stats(&self) -> Result<GlobalStats, S::Error> {
    self.backend().await?.global_stats().await
  }

  async fn region_stats(&self) -> Result<Vec<RegionAggregate>, S::Error> {
    self.backend().await?.region_stats().await
  }

  async fn count(&self) -> Result<u64, S::Error> { self.backend().await?.count().await }

  async fn get(&self, asset_id: &str) -> Result<Option<CanonicalRecord>, S::Error> {
    self.backend().await?.get(asset_id).await
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::testing::{Injected, MemoryStore};

  #[tokio::test]
  async fn opens_once_on_first_call() {
    let opens = AtomicUsize::new(0);
    let store = LazyStore::new(|| {
      opens.fetch_add(1, Ordering::SeqCst);
      async { Ok::<_, Injected>(MemoryStore::default()) }
    });
    assert!(store.opened().is_none());

    let record = CanonicalRecord::new("B-1", 50.0, 8.0);
    store.upsert_batch(std::slice::from_ref(&record)).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.get("B-1").await.unwrap(), Some(record));

    assert_eq!(opens.load(Ordering::SeqCst), 1);
    assert_eq!(store.opened().map(MemoryStore::upsert_calls), Some(1));
  }
}
