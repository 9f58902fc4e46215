//! An in-memory [`RecordStore`] with injectable failures.

use std::{
  collections::{BTreeMap, BTreeSet},
  sync::{
    Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
  },
};

use thiserror::Error;
use trestle_core::{
  record::CanonicalRecord,
  stats::{GlobalStats, RegionAggregate},
  store::RecordStore,
};

#[derive(Debug, Error)]
#[error("injected failure on {0}")]
pub struct Injected(pub &'static str);

/// Rows live in a `BTreeMap`; upsert calls listed in `fail_upserts` (1-based)
/// fail without writing anything.
#[derive(Default)]
pub struct MemoryStore {
  rows:         Mutex<BTreeMap<String, CanonicalRecord>>,
  upsert_calls: AtomicUsize,
  refreshes:    AtomicUsize,
  fail_upserts: BTreeSet<usize>,
  fail_refresh: bool,
}

impl MemoryStore {
  pub fn failing_upserts(calls: impl IntoIterator<Item = usize>) -> Self {
    Self { fail_upserts: calls.into_iter().collect(), ..Self::default() }
  }

  pub fn failing_refresh() -> Self { Self { fail_refresh: true, ..Self::default() } }

  pub fn upsert_calls(&self) -> usize { self.upsert_calls.load(Ordering::SeqCst) }

  pub fn refreshes(&self) -> usize { self.refreshes.load(Ordering::SeqCst) }

  pub fn rows(&self) -> Vec<CanonicalRecord> {
    self
      .rows
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .values()
      .cloned()
      .collect()
  }
}

impl RecordStore for MemoryStore {
  type Error = Injected;

  async fn upsert_batch(&self, records: &[CanonicalRecord]) -> Result<usize, Injected> {
    let call = self.upsert_calls.fetch_add(1, Ordering::SeqCst) + 1;
    if self.fail_upserts.contains(&call) {
      return Err(Injected("upsert"));
    }
    let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
    for r in records {
      rows.insert(r.asset_id.clone(), r.clone());
    }
    Ok(records.len())
  }

  async fn refresh_aggregates(&self) -> Result<(), Injected> {
    self.refreshes.fetch_add(1, Ordering::SeqCst);
    if self.fail_refresh {
      return Err(Injected("refresh"));
    }
    Ok(())
  }

  async fn global_stats(&self) -> Result<GlobalStats, Injected> { Ok(GlobalStats::default()) }

  async fn region_stats(&self) -> Result<Vec<RegionAggregate>, Injected> { Ok(Vec::new()) }

  async fn count(&self) -> Result<u64, Injected> {
    Ok(self.rows.lock().unwrap_or_else(PoisonError::into_inner).len() as u64)
  }

  async fn get(&self, asset_id: &str) -> Result<Option<CanonicalRecord>, Injected> {
    Ok(self.rows.lock().unwrap_or_else(PoisonError::into_inner).get(asset_id).cloned())
  }
}
