//! The Deduplicator: one record per asset id, last write wins.

use std::collections::BTreeMap;

use trestle_core::record::CanonicalRecord;

/// The run's working set, keyed by `asset_id`.
///
/// Owned by the pipeline loop and fed in fetch order, so "last" means the
/// record seen in the latest unit. Iteration order is by asset id.
#[derive(Debug, Default)]
pub struct Deduplicator {
  records: BTreeMap<String, CanonicalRecord>,
}

impl Deduplicator {
  pub fn new() -> Self { Self::default() }

  /// Insert `record`, replacing any earlier record with the same asset id.
  /// Returns `true` if one was replaced.
  pub fn insert(&mut self, record: CanonicalRecord) -> bool {
    self.records.insert(record.asset_id.clone(), record).is_some()
  }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  pub fn get(&self, asset_id: &str) -> Option<&CanonicalRecord> { self.records.get(asset_id) }

  pub fn into_records(self) -> Vec<CanonicalRecord> { self.records.into_values().collect() }
}
