//! SQL schema for the Trestle SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per physical bridge. Rows are upserted, never deleted.
CREATE TABLE IF NOT EXISTS bridges (
    asset_id            TEXT PRIMARY KEY,
    name                TEXT NOT NULL,
    condition_score     REAL,
    condition_class     TEXT,
    year_built          INTEGER,
    road_name           TEXT,
    locality            TEXT,
    region              TEXT,
    country_subdivision TEXT,
    material_class      TEXT,
    load_capacity_index REAL,
    length_m            REAL,
    width_m             REAL,
    latitude            REAL NOT NULL,
    longitude           REAL NOT NULL,
    last_updated        TEXT,              -- opaque stamp from the source
    loaded_at           TEXT NOT NULL      -- RFC 3339 UTC; set on every upsert
);

CREATE INDEX IF NOT EXISTS bridges_region_idx    ON bridges(region);
CREATE INDEX IF NOT EXISTS bridges_condition_idx ON bridges(condition_score);

-- Derived from `bridges` on refresh; rebuilt wholesale, never patched.
CREATE TABLE IF NOT EXISTS region_stats (
    region          TEXT PRIMARY KEY,
    bridge_count    INTEGER NOT NULL,
    scored_count    INTEGER NOT NULL,
    avg_condition   REAL,
    critical_count  INTEGER NOT NULL,
    critical_pct    REAL NOT NULL,
    avg_year_built  REAL,
    min_condition   REAL,
    max_condition   REAL,
    refreshed_at    TEXT NOT NULL
);

PRAGMA user_version = 1;
";

/// Insert-or-replace keyed by `asset_id`.
pub const UPSERT_BRIDGE: &str = "
INSERT INTO bridges (
    asset_id, name, condition_score, condition_class, year_built,
    road_name, locality, region, country_subdivision, material_class,
    load_capacity_index, length_m, width_m, latitude, longitude,
    last_updated, loaded_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
ON CONFLICT(asset_id) DO UPDATE SET
    name                = excluded.name,
    condition_score     = excluded.condition_score,
    condition_class     = excluded.condition_class,
    year_built          = excluded.year_built,
    road_name           = excluded.road_name,
    locality            = excluded.locality,
    region              = excluded.region,
    country_subdivision = excluded.country_subdivision,
    material_class      = excluded.material_class,
    load_capacity_index = excluded.load_capacity_index,
    length_m            = excluded.length_m,
    width_m             = excluded.width_m,
    latitude            = excluded.latitude,
    longitude           = excluded.longitude,
    last_updated        = excluded.last_updated,
    loaded_at           = excluded.loaded_at
";

/// Recompute every region's aggregates. `?1` is the critical threshold,
/// `?2` the refresh timestamp.
pub const REBUILD_REGION_STATS: &str = "
INSERT INTO region_stats (
    region, bridge_count, scored_count, avg_condition, critical_count,
    critical_pct, avg_year_built, min_condition, max_condition, refreshed_at
)
SELECT
    region,
    COUNT(*),
    COUNT(condition_score),
    AVG(condition_score),
    SUM(CASE WHEN condition_score >= ?1 THEN 1 ELSE 0 END),
    CASE WHEN COUNT(condition_score) = 0 THEN 0.0
         ELSE ROUND(100.0 * SUM(CASE WHEN condition_score >= ?1 THEN 1 ELSE 0 END)
                    / COUNT(condition_score), 1)
    END,
    AVG(year_built),
    MIN(condition_score),
    MAX(condition_score),
    ?2
FROM bridges
WHERE region IS NOT NULL
GROUP BY region
";

pub const BRIDGE_COLUMNS: &str = "
    asset_id, name, condition_score, condition_class, year_built,
    road_name, locality, region, country_subdivision, material_class,
    load_capacity_index, length_m, width_m, latitude, longitude, last_updated
";
