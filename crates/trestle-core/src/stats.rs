//! Aggregate statistics derived from the persisted record set.
//!
//! These are read models owned by the destination store: recomputed wholesale
//! on refresh, never maintained incrementally by the pipeline.

use serde::{Deserialize, Serialize};

/// Default condition score at or above which a bridge counts as critical.
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 3.0;

/// Per-region condition statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAggregate {
  pub region:         String,
  /// All rows in the region, scored or not.
  pub bridge_count:   u64,
  /// Rows with a present condition score.
  pub scored_count:   u64,
  pub avg_condition:  Option<f64>,
  pub critical_count: u64,
  /// Share of `scored_count` that is critical, in percent.
  pub critical_pct:   f64,
  pub avg_year_built: Option<f64>,
  pub min_condition:  Option<f64>,
  pub max_condition:  Option<f64>,
}

/// Condition statistics over every row with a present condition score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
  pub scored_count:   u64,
  pub avg_condition:  Option<f64>,
  pub avg_year_built: Option<f64>,
}

/// `part` as a percentage of `whole`, rounded to one decimal. Zero when
/// `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
  if whole == 0 {
    return 0.0;
  }
  (part as f64 * 1000.0 / whole as f64).round() / 10.0
}
