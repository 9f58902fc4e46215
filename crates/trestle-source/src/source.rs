//! The `FeatureSource` trait: a "next batch" view over the remote service.

use std::future::Future;

use trestle_core::record::RawFeature;

/// What happened to the request unit behind a [`Batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitOutcome {
  /// The unit was fetched (possibly empty).
  Fetched,
  /// The unit failed twice and was skipped.
  Skipped { reason: String },
  /// The source was already drained; no request was made.
  Exhausted,
}

/// One request unit's worth of features.
#[derive(Debug, Clone)]
pub struct Batch {
  /// Human-readable unit label, e.g. `page 3` or `tile 12/240`.
  pub unit:     String,
  pub features: Vec<RawFeature>,
  pub outcome:  UnitOutcome,
  /// `true` once no further units remain.
  pub done:     bool,
}

impl Batch {
  pub(crate) fn exhausted() -> Self {
    Self {
      unit:     "exhausted".to_owned(),
      features: Vec::new(),
      outcome:  UnitOutcome::Exhausted,
      done:     true,
    }
  }

  pub fn is_skipped(&self) -> bool { matches!(self.outcome, UnitOutcome::Skipped { .. }) }
}

/// A sequence of feature batches, fetched one request unit per call.
///
/// Implementations never fail a call: transient errors are retried once and
/// then reported as [`UnitOutcome::Skipped`], so the caller always makes
/// forward progress and stops only on `done`.
pub trait FeatureSource: Send {
  fn fetch_next(&mut self) -> impl Future<Output = Batch> + Send + '_;
}
