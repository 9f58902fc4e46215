//! Conversions between domain types and SQLite rows.
//!
//! Timestamps are stored as RFC 3339 strings. Counts are stored as SQLite
//! integers and widened to `u64` on read.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use trestle_core::{record::CanonicalRecord, stats::RegionAggregate};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// Read a `bridges` row selected with [`crate::schema::BRIDGE_COLUMNS`].
pub fn record_from_row(row: &Row<'_>) -> rusqlite::Result<CanonicalRecord> {
  Ok(CanonicalRecord {
    asset_id:            row.get(0)?,
    name:                row.get(1)?,
    condition_score:     row.get(2)?,
    condition_class:     row.get(3)?,
    year_built:          row.get(4)?,
    road_name:           row.get(5)?,
    locality:            row.get(6)?,
    region:              row.get(7)?,
    country_subdivision: row.get(8)?,
    material_class:      row.get(9)?,
    load_capacity_index: row.get(10)?,
    length_m:            row.get(11)?,
    width_m:             row.get(12)?,
    latitude:            row.get(13)?,
    longitude:           row.get(14)?,
    last_updated:        row.get(15)?,
  })
}

/// Read a `region_stats` row in column order.
pub fn region_from_row(row: &Row<'_>) -> rusqlite::Result<RegionAggregate> {
  Ok(RegionAggregate {
    region:         row.get(0)?,
    bridge_count:   count(row.get(1)?),
    scored_count:   count(row.get(2)?),
    avg_condition:  row.get(3)?,
    critical_count: count(row.get(4)?),
    critical_pct:   row.get(5)?,
    avg_year_built: row.get(6)?,
    min_condition:  row.get(7)?,
    max_condition:  row.get(8)?,
  })
}

pub fn count(v: i64) -> u64 { v.max(0) as u64 }
