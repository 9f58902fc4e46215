//! The end-of-run summary block.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::loader::LoadReport;

#[derive(Debug, Clone)]
pub struct RunSummary {
  pub run_id:        Uuid,
  pub started_at:    DateTime<Utc>,
  pub finished_at:   DateTime<Utc>,
  /// Request units (pages or tiles) fetched or skipped.
  pub units:         u64,
  pub skipped_units: u64,
  /// Raw features received.
  pub fetched:       u64,
  /// Rejected features by [`Rejection::reason`](crate::Rejection::reason).
  pub rejected:      BTreeMap<&'static str, u64>,
  pub unique:        usize,
  /// Unique records with a present condition score.
  pub scored:        usize,
  pub critical:      usize,
  /// `critical` as a share of `scored`, in percent.
  pub critical_pct:  f64,
  pub regions:       usize,
  pub subdivisions:  usize,
  pub load:          LoadReport,
}

impl RunSummary {
  pub fn rejected_total(&self) -> u64 { self.rejected.values().sum() }
}

impl fmt::Display for RunSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let elapsed = (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0;
    let rejected = self
      .rejected
      .iter()
      .map(|(reason, n)| format!("{reason} {n}"))
      .collect::<Vec<_>>()
      .join(", ");

    writeln!(f, "── run {} ──", self.run_id)?;
    writeln!(f, "started        {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(f, "elapsed        {elapsed:.1}s")?;
    writeln!(f, "units          {} ({} skipped)", self.units, self.skipped_units)?;
    writeln!(f, "fetched        {}", self.fetched)?;
    if rejected.is_empty() {
      writeln!(f, "rejected       0")?;
    } else {
      writeln!(f, "rejected       {} ({rejected})", self.rejected_total())?;
    }
    writeln!(f, "unique         {}", self.unique)?;
    writeln!(f, "scored         {}", self.scored)?;
    writeln!(f, "critical       {} ({:.1}% of scored)", self.critical, self.critical_pct)?;
    writeln!(f, "regions        {}", self.regions)?;
    writeln!(f, "subdivisions   {}", self.subdivisions)?;
    writeln!(
      f,
      "loaded         {} rows, {} failed batches ({} rows)",
      self.load.succeeded,
      self.load.failed_batches.len(),
      self.load.failed_rows()
    )?;
    write!(f, "refresh        {}", self.load.refresh)
  }
}
