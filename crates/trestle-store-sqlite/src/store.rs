//! [`SqliteStore`]: the SQLite implementation of [`RecordStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use trestle_core::{
  record::CanonicalRecord,
  stats::{DEFAULT_CRITICAL_THRESHOLD, GlobalStats, RegionAggregate},
  store::RecordStore,
};

use crate::{
  Result,
  encode::{count, decode_dt, encode_dt, record_from_row, region_from_row},
  schema::{BRIDGE_COLUMNS, REBUILD_REGION_STATS, SCHEMA, UPSERT_BRIDGE},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Trestle destination store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:               tokio_rusqlite::Connection,
  critical_threshold: f64,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, critical_threshold: DEFAULT_CRITICAL_THRESHOLD };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, critical_threshold: DEFAULT_CRITICAL_THRESHOLD };
    store.init_schema().await?;
    Ok(store)
  }

  /// Condition score at or above which a bridge counts as critical in the
  /// region aggregates.
  pub fn with_critical_threshold(mut self, threshold: f64) -> Self {
    self.critical_threshold = threshold;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// When the region aggregates were last rebuilt, if ever.
  pub async fn last_refreshed_at(&self) -> Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT MAX(refreshed_at) FROM region_stats", [], |r| r.get(0))?)
      })
      .await?;

    raw.as_deref().map(decode_dt).transpose()
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = crate::Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert_batch(&self, records: &[CanonicalRecord]) -> Result<usize> {
    for record in records {
      record.validate()?;
    }

    let rows = records.to_vec();
    let loaded_at = encode_dt(Utc::now());

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare_cached(UPSERT_BRIDGE)?;
          for r in &rows {
            stmt.execute(rusqlite::params![
              r.asset_id,
              r.name,
              r.condition_score,
              r.condition_class,
              r.year_built,
              r.road_name,
              r.locality,
              r.region,
              r.country_subdivision,
              r.material_class,
              r.load_capacity_index,
              r.length_m,
              r.width_m,
              r.latitude,
              r.longitude,
              r.last_updated,
              loaded_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    Ok(written)
  }

  async fn refresh_aggregates(&self) -> Result<()> {
    let threshold = self.critical_threshold;
    let refreshed_at = encode_dt(Utc::now());

    let regions = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM region_stats", [])?;
        let n = tx.execute(
          REBUILD_REGION_STATS,
          rusqlite::params![threshold, refreshed_at],
        )?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    tracing::debug!(regions, threshold, "region aggregates rebuilt");
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn global_stats(&self) -> Result<GlobalStats> {
    let stats = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(condition_score), AVG(condition_score), AVG(year_built)
           FROM bridges
           WHERE condition_score IS NOT NULL",
          [],
          |row| {
            Ok(GlobalStats {
              scored_count:   count(row.get(0)?),
              avg_condition:  row.get(1)?,
              avg_year_built: row.get(2)?,
            })
          },
        )?)
      })
      .await?;
    Ok(stats)
  }

  async fn region_stats(&self) -> Result<Vec<RegionAggregate>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT region, bridge_count, scored_count, avg_condition, critical_count,
                  critical_pct, avg_year_built, min_condition, max_condition
           FROM region_stats
           ORDER BY region",
        )?;
        let rows = stmt
          .query_map([], region_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn count(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM bridges", [], |r| r.get(0))?))
      .await?;
    Ok(count(n))
  }

  async fn get(&self, asset_id: &str) -> Result<Option<CanonicalRecord>> {
    let id = asset_id.to_owned();
    let record = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {BRIDGE_COLUMNS} FROM bridges WHERE asset_id = ?1"),
            rusqlite::params![id],
            record_from_row,
          )
          .optional()?)
      })
      .await?;
    Ok(record)
  }
}
