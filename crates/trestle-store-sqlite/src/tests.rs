//! Integration tests for `SqliteStore` against an in-memory database.

use trestle_core::{record::CanonicalRecord, store::RecordStore};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn bridge(
  id: &str,
  region: Option<&str>,
  score: Option<f64>,
  year: Option<i32>,
) -> CanonicalRecord {
  CanonicalRecord {
    name: format!("Bridge {id}"),
    region: region.map(str::to_owned),
    condition_score: score,
    year_built: year,
    ..CanonicalRecord::new(id, 50.1, 8.6)
  }
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_get_roundtrip() {
  let s = store().await;
  let mut r = bridge("B-1", Some("Hessen"), Some(2.4), Some(1972));
  r.road_name = Some("A 5".into());
  r.length_m = Some(412.5);
  r.last_updated = Some("2024-03-01".into());

  let written = s.upsert_batch(std::slice::from_ref(&r)).await.unwrap();
  assert_eq!(written, 1);

  let fetched = s.get("B-1").await.unwrap().expect("row present");
  assert_eq!(fetched, r);
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_replaces_existing_row() {
  let s = store().await;
  s.upsert_batch(&[bridge("B-1", Some("Hessen"), Some(2.0), None)])
    .await
    .unwrap();
  s.upsert_batch(&[bridge("B-1", Some("Bayern"), Some(3.5), Some(1960))])
    .await
    .unwrap();

  assert_eq!(s.count().await.unwrap(), 1);
  let fetched = s.get("B-1").await.unwrap().unwrap();
  assert_eq!(fetched.condition_score, Some(3.5));
  assert_eq!(fetched.region.as_deref(), Some("Bayern"));
  assert_eq!(fetched.year_built, Some(1960));
}

#[tokio::test]
async fn loading_the_same_set_twice_is_idempotent() {
  let s = store().await;
  let records: Vec<_> = (0..25)
    .map(|i| bridge(&format!("B-{i:03}"), Some("Sachsen"), Some(1.5 + (i % 3) as f64), None))
    .collect();

  s.upsert_batch(&records).await.unwrap();
  let first_count = s.count().await.unwrap();
  let first_rows: Vec<_> = {
    let mut out = Vec::new();
    for r in &records {
      out.push(s.get(&r.asset_id).await.unwrap());
    }
    out
  };

  s.upsert_batch(&records).await.unwrap();
  assert_eq!(s.count().await.unwrap(), first_count);
  assert_eq!(first_count, 25);
  for (r, before) in records.iter().zip(first_rows) {
    assert_eq!(s.get(&r.asset_id).await.unwrap(), before);
  }
}

#[tokio::test]
async fn invalid_record_rejects_the_whole_batch() {
  let s = store().await;
  let batch = vec![
    bridge("B-1", None, None, None),
    bridge("", None, None, None),
  ];

  let err = s.upsert_batch(&batch).await.unwrap_err();
  assert!(matches!(err, crate::Error::Core(trestle_core::Error::EmptyAssetId)));
  assert_eq!(s.count().await.unwrap(), 0);
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn refresh_builds_region_aggregates() {
  let s = store().await;
  s.upsert_batch(&[
    bridge("H-1", Some("Hessen"), Some(1.5), Some(1970)),
    bridge("H-2", Some("Hessen"), Some(3.5), Some(1990)),
    bridge("H-3", Some("Hessen"), None, Some(2000)),
    bridge("B-1", Some("Bayern"), Some(3.0), None),
    bridge("X-1", None, Some(4.0), None),
  ])
  .await
  .unwrap();

  assert!(s.region_stats().await.unwrap().is_empty(), "not yet refreshed");
  s.refresh_aggregates().await.unwrap();

  let regions = s.region_stats().await.unwrap();
  assert_eq!(regions.len(), 2, "rows without a region are not aggregated");

  let bayern = &regions[0];
  assert_eq!(bayern.region, "Bayern");
  assert_eq!(bayern.critical_count, 1, "threshold is inclusive");
  assert_eq!(bayern.critical_pct, 100.0);
  assert_eq!(bayern.avg_year_built, None);

  let hessen = &regions[1];
  assert_eq!(hessen.region, "Hessen");
  assert_eq!(hessen.bridge_count, 3);
  assert_eq!(hessen.scored_count, 2);
  assert_eq!(hessen.avg_condition, Some(2.5));
  assert_eq!(hessen.critical_count, 1);
  assert_eq!(hessen.critical_pct, 50.0);
  assert_eq!(hessen.avg_year_built, Some(1986.6666666666667));
  assert_eq!(hessen.min_condition, Some(1.5));
  assert_eq!(hessen.max_condition, Some(3.5));

  assert!(s.last_refreshed_at().await.unwrap().is_some());
}

#[tokio::test]
async fn refresh_recomputes_wholesale() {
  let s = store().await;
  s.upsert_batch(&[bridge("A-1", Some("Bremen"), Some(2.0), None)])
    .await
    .unwrap();
  s.refresh_aggregates().await.unwrap();

  // The only Bremen bridge moves region; Bremen must disappear.
  s.upsert_batch(&[bridge("A-1", Some("Hamburg"), Some(2.0), None)])
    .await
    .unwrap();
  s.refresh_aggregates().await.unwrap();

  let regions: Vec<_> = s
    .region_stats()
    .await
    .unwrap()
    .into_iter()
    .map(|r| r.region)
    .collect();
  assert_eq!(regions, ["Hamburg"]);
}

#[tokio::test]
async fn critical_threshold_is_configurable() {
  let s = store().await.with_critical_threshold(2.0);
  s.upsert_batch(&[
    bridge("A", Some("Saarland"), Some(2.0), None),
    bridge("B", Some("Saarland"), Some(1.9), None),
  ])
  .await
  .unwrap();
  s.refresh_aggregates().await.unwrap();

  let saarland = &s.region_stats().await.unwrap()[0];
  assert_eq!(saarland.critical_count, 1);
  assert_eq!(saarland.critical_pct, 50.0);
}

#[tokio::test]
async fn global_stats_cover_scored_rows_only() {
  let s = store().await;
  s.upsert_batch(&[
    bridge("A", Some("Berlin"), Some(2.0), Some(1950)),
    bridge("B", Some("Berlin"), Some(3.0), Some(1970)),
    bridge("C", Some("Berlin"), None, Some(2020)),
  ])
  .await
  .unwrap();

  let stats = s.global_stats().await.unwrap();
  assert_eq!(stats.scored_count, 2);
  assert_eq!(stats.avg_condition, Some(2.5));
  assert_eq!(stats.avg_year_built, Some(1960.0));
}

#[tokio::test]
async fn global_stats_on_empty_table() {
  let s = store().await;
  let stats = s.global_stats().await.unwrap();
  assert_eq!(stats.scored_count, 0);
  assert_eq!(stats.avg_condition, None);
}
