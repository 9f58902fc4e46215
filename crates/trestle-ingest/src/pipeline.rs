//! The Pipeline Orchestrator.
//!
//! One sequential loop: pull a unit from the source, normalize and
//! deduplicate its features, repeat until the source reports `done`. The
//! drained working set is then loaded in batches and the destination's
//! aggregates are refreshed.

use std::{
  collections::{BTreeMap, BTreeSet},
  fmt,
};

use chrono::Utc;
use tracing::Instrument as _;
use trestle_core::{stats::percentage, store::RecordStore};
use trestle_source::{FeatureSource, UnitOutcome};
use uuid::Uuid;

use crate::{
  config::PipelineConfig,
  dedup::Deduplicator,
  error::PipelineError,
  loader::Loader,
  normalize::Normalizer,
  summary::RunSummary,
};

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Fetching,
  Drained,
  Loading,
  Refreshing,
  Done,
  /// Unrecoverable configuration error; set by the caller before fetching.
  Error,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Fetching => "fetching",
      Self::Drained => "drained",
      Self::Loading => "loading",
      Self::Refreshing => "refreshing",
      Self::Done => "done",
      Self::Error => "error",
    })
  }
}

pub struct Pipeline<F, S> {
  source:     F,
  store:      S,
  normalizer: Normalizer,
  config:     PipelineConfig,
  phase:      Phase,
}

impl<F: FeatureSource, S: RecordStore> Pipeline<F, S> {
  pub fn new(source: F, store: S, config: PipelineConfig) -> Self {
    Self {
      source,
      store,
      normalizer: Normalizer::default(),
      config,
      phase: Phase::Fetching,
    }
  }

  pub fn phase(&self) -> Phase { self.phase }

  pub fn store(&self) -> &S { &self.store }

  fn enter(&mut self, phase: Phase) {
    tracing::debug!(from = %self.phase, to = %phase, "phase");
    self.phase = phase;
  }

  /// Drain the source, load the unique records, refresh the aggregates.
  ///
  /// Returns [`PipelineError::NoData`] without touching the store when the
  /// source yields no usable record.
  pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id);
    self.run_inner(run_id).instrument(span).await
  }

  async fn run_inner(&mut self, run_id: Uuid) -> Result<RunSummary, PipelineError> {
    let started_at = Utc::now();
    self.enter(Phase::Fetching);
    tracing::info!("fetching");

    let mut dedup = Deduplicator::new();
    let mut units = 0u64;
    let mut skipped_units = 0u64;
    let mut fetched = 0u64;
    let mut rejected: BTreeMap<&'static str, u64> = BTreeMap::new();

    loop {
      let batch = self.source.fetch_next().await;
      if batch.outcome == UnitOutcome::Exhausted {
        break;
      }
      units += 1;
      if batch.is_skipped() {
        skipped_units += 1;
      }
      fetched += batch.features.len() as u64;

      for feature in &batch.features {
        match self.normalizer.normalize(feature) {
          Ok(record) => {
            dedup.insert(record);
          }
          Err(rejection) => {
            tracing::debug!(id = ?feature.id, %rejection, "feature rejected");
            *rejected.entry(rejection.reason()).or_default() += 1;
          }
        }
      }

      tracing::info!(
        unit = %batch.unit,
        fetched = batch.features.len(),
        total_fetched = fetched,
        unique = dedup.len(),
        "unit processed"
      );

      if batch.done {
        break;
      }
    }

    self.enter(Phase::Drained);
    if dedup.is_empty() {
      tracing::error!(units, fetched, "no usable records; destination left untouched");
      return Err(PipelineError::NoData { units, fetched });
    }

    let records = dedup.into_records();
    let scored = records.iter().filter(|r| r.condition_score.is_some()).count();
    let critical = records
      .iter()
      .filter(|r| r.condition_score.is_some_and(|s| s >= self.config.critical_threshold))
      .count();
    let regions = records
      .iter()
      .filter_map(|r| r.region.as_deref())
      .collect::<BTreeSet<_>>()
      .len();
    let subdivisions = records
      .iter()
      .filter_map(|r| r.country_subdivision.as_deref())
      .collect::<BTreeSet<_>>()
      .len();

    self.enter(Phase::Loading);
    tracing::info!(records = records.len(), batch_size = self.config.batch_size, "loading");
    let batch_size = self.config.batch_size;
    let mut load = Loader::new(&self.store, batch_size).upsert_all(&records).await;

    self.enter(Phase::Refreshing);
    load.refresh = Loader::new(&self.store, batch_size).refresh().await;

    self.enter(Phase::Done);
    let summary = RunSummary {
      run_id,
      started_at,
      finished_at: Utc::now(),
      units,
      skipped_units,
      fetched,
      rejected,
      unique: records.len(),
      scored,
      critical,
      critical_pct: percentage(critical as u64, scored as u64),
      regions,
      subdivisions,
      load,
    };
    tracing::info!(
      unique = summary.unique,
      loaded = summary.load.succeeded,
      failed_batches = summary.load.failed_batches.len(),
      "run complete"
    );
    Ok(summary)
  }
}
