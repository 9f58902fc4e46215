//! Whole-pipeline tests: scripted source, real normalizer, in-memory stores.

use std::sync::atomic::{AtomicUsize, Ordering};

use trestle_core::{
  record::{AttrValue, RawFeature},
  store::RecordStore,
};
use trestle_source::{
  PagedSource, SourceClient, SourceConfig, SourceError, Strategy,
  query::BBox,
  testing::{ScriptedTransport, page_of, point_feature},
};
use trestle_store_sqlite::SqliteStore;

use crate::{
  LazyStore, Phase, Pipeline, PipelineConfig, PipelineError, RefreshOutcome,
  testing::{Injected, MemoryStore},
};

const BERLIN: (f64, f64) = (796_987.274, 5_827_473.090);
const MUNICH: (f64, f64) = (691_650.367, 5_334_754.246);
const HAMBURG: (f64, f64) = (566_296.251, 5_933_959.965);
// Far east of the envelope.
const OUT_OF_ZONE: (f64, f64) = (1_400_000.0, 5_600_000.0);

fn source_config(page_size: u64) -> SourceConfig {
  SourceConfig {
    base_url: "https://wfs.example.invalid/ows".into(),
    page_size,
    request_delay_ms: 0,
    retry_delay_ms: 0,
    ..SourceConfig::default()
  }
}

fn bridge(id: &str, at: (f64, f64), props: &[(&str, AttrValue)]) -> RawFeature {
  point_feature(id, at.0, at.1, props)
}

fn scored(score: f64, land: AttrValue) -> [(&'static str, AttrValue); 2] {
  [("zustandsnote", AttrValue::Float(score)), ("land", land)]
}

#[tokio::test]
async fn two_pages_with_a_repeated_asset_keep_the_later_values() {
  let transport = ScriptedTransport::new(vec![
    Ok(page_of(
      vec![
        bridge("A", BERLIN, &scored(2.0, AttrValue::Int(11))),
        bridge("B", MUNICH, &[("zustandsnote", "2,5".into()), ("land", "09".into())]),
      ],
      Some(4),
    )),
    Ok(page_of(
      vec![
        bridge("C", HAMBURG, &scored(1.2, AttrValue::Int(2))),
        bridge("A", BERLIN, &scored(3.5, AttrValue::Int(11))),
      ],
      Some(4),
    )),
  ]);
  let source = PagedSource::new(&source_config(2), transport);
  let store = SqliteStore::open_in_memory().await.unwrap();

  let mut pipeline = Pipeline::new(source, store.clone(), PipelineConfig::default());
  let summary = pipeline.run().await.unwrap();

  assert_eq!(pipeline.phase(), Phase::Done);
  assert_eq!(summary.units, 2);
  assert_eq!(summary.fetched, 4);
  assert_eq!(summary.rejected_total(), 0);
  assert_eq!(summary.unique, 3);
  assert_eq!(summary.scored, 3);
  assert_eq!(summary.critical, 1);
  assert_eq!(summary.critical_pct, 33.3);
  assert_eq!(summary.subdivisions, 3);
  assert_eq!(summary.regions, 3);
  assert_eq!(summary.load.succeeded, 3);
  assert_eq!(summary.load.refresh, RefreshOutcome::Refreshed);

  assert_eq!(store.count().await.unwrap(), 3);
  let a = store.get("A").await.unwrap().unwrap();
  assert_eq!(a.condition_score, Some(3.5));
  assert_eq!(a.region.as_deref(), Some("Berlin"));

  let regions = store.region_stats().await.unwrap();
  assert_eq!(regions.len(), 3);
  assert!(summary.to_string().contains("unique         3"));
}

#[tokio::test]
async fn rerunning_the_same_source_is_idempotent() {
  let page = || {
    Ok(page_of(
      vec![
        bridge("A", BERLIN, &[("zustandsnote", AttrValue::Float(2.0))]),
        bridge("B", MUNICH, &[]),
      ],
      Some(2),
    ))
  };
  let store = SqliteStore::open_in_memory().await.unwrap();

  for _ in 0..2 {
    let source = PagedSource::new(&source_config(10), ScriptedTransport::new(vec![page()]));
    Pipeline::new(source, store.clone(), PipelineConfig::default())
      .run()
      .await
      .unwrap();
  }

  assert_eq!(store.count().await.unwrap(), 2);
  assert_eq!(store.get("A").await.unwrap().unwrap().condition_score, Some(2.0));
}

#[tokio::test]
async fn rejections_are_counted_by_reason() {
  let mut nameless = bridge("", MUNICH, &[]);
  nameless.properties.clear();
  nameless.id = None;
  let mut pointless = bridge("P", MUNICH, &[]);
  pointless.geometry = None;

  let transport = ScriptedTransport::new(vec![Ok(page_of(
    vec![
      bridge("ok", BERLIN, &[]),
      bridge("far", OUT_OF_ZONE, &[]),
      nameless,
      pointless,
    ],
    Some(4),
  ))]);
  let source = PagedSource::new(&source_config(10), transport);

  let summary = Pipeline::new(source, MemoryStore::default(), PipelineConfig::default())
    .run()
    .await
    .unwrap();

  assert_eq!(summary.unique, 1);
  assert_eq!(summary.rejected_total(), 3);
  assert_eq!(summary.rejected.get("missing_id"), Some(&1));
  assert_eq!(summary.rejected.get("missing_geometry"), Some(&1));
  assert_eq!(summary.rejected.get("outside_envelope"), Some(&1));
}

#[tokio::test]
async fn no_usable_records_leaves_the_store_untouched() {
  let transport = ScriptedTransport::new(vec![Ok(page_of(
    vec![bridge("far", OUT_OF_ZONE, &[])],
    None,
  ))]);
  let source = PagedSource::new(&source_config(10), transport);
  let mut pipeline = Pipeline::new(source, MemoryStore::default(), PipelineConfig::default());

  let err = pipeline.run().await.unwrap_err();
  assert!(matches!(err, PipelineError::NoData { units: 4, fetched: 1 }));
  assert_eq!(pipeline.phase(), Phase::Drained);
  assert_eq!(pipeline.store().upsert_calls(), 0);
  assert_eq!(pipeline.store().refreshes(), 0);
}

#[tokio::test]
async fn no_usable_records_never_opens_a_lazy_store() {
  let transport = ScriptedTransport::new(vec![Ok(page_of(
    vec![bridge("far", OUT_OF_ZONE, &[])],
    Some(1),
  ))]);
  let source = PagedSource::new(&source_config(10), transport);
  let opens = AtomicUsize::new(0);
  let store = LazyStore::new(|| {
    opens.fetch_add(1, Ordering::SeqCst);
    async { Ok::<_, Injected>(MemoryStore::default()) }
  });
  let mut pipeline = Pipeline::new(source, store, PipelineConfig::default());

  let err = pipeline.run().await.unwrap_err();
  assert!(matches!(err, PipelineError::NoData { units: 1, fetched: 1 }));
  assert_eq!(opens.load(Ordering::SeqCst), 0);
  assert!(pipeline.store().opened().is_none());
}

#[tokio::test]
async fn lazy_store_opens_once_a_run_has_records() {
  let transport = ScriptedTransport::new(vec![Ok(page_of(
    vec![bridge("A", BERLIN, &[]), bridge("B", MUNICH, &[])],
    Some(2),
  ))]);
  let source = PagedSource::new(&source_config(10), transport);
  let opens = AtomicUsize::new(0);
  let store = LazyStore::new(|| {
    opens.fetch_add(1, Ordering::SeqCst);
    async { SqliteStore::open_in_memory().await }
  });
  let mut pipeline = Pipeline::new(source, store, PipelineConfig::default());

  let summary = pipeline.run().await.unwrap();
  assert_eq!(summary.load.succeeded, 2);
  assert_eq!(summary.load.refresh, RefreshOutcome::Refreshed);
  assert_eq!(opens.load(Ordering::SeqCst), 1);
  assert_eq!(pipeline.store().count().await.unwrap(), 2);
}

#[tokio::test]
async fn skipped_units_do_not_abort_the_run() {
  let transport = ScriptedTransport::new(vec![
    Err(SourceError::Status { status: 503, type_name: "bast:bruecken".into() }),
    Err(SourceError::Status { status: 503, type_name: "bast:bruecken".into() }),
    Ok(page_of(vec![bridge("A", BERLIN, &[])], Some(2))),
  ]);
  let source = PagedSource::new(&source_config(1), transport);

  let summary = Pipeline::new(source, MemoryStore::default(), PipelineConfig::default())
    .run()
    .await
    .unwrap();

  assert_eq!(summary.units, 2);
  assert_eq!(summary.skipped_units, 1);
  assert_eq!(summary.unique, 1);
}

#[tokio::test]
async fn failed_batches_and_refresh_surface_in_the_summary() {
  let features: Vec<_> = (0..5).map(|i| bridge(&format!("B-{i}"), BERLIN, &[])).collect();
  let transport = ScriptedTransport::new(vec![Ok(page_of(features, Some(5)))]);
  let source = PagedSource::new(&source_config(10), transport);
  let config = PipelineConfig { batch_size: 2, ..PipelineConfig::default() };

  let mut pipeline = Pipeline::new(source, MemoryStore::failing_upserts([2]), config);
  let summary = pipeline.run().await.unwrap();

  assert_eq!(summary.load.succeeded, 3);
  assert_eq!(summary.load.failed_batches.len(), 1);
  assert_eq!(pipeline.store().refreshes(), 1);
  assert!(summary.to_string().contains("1 failed batches (2 rows)"));
}

#[tokio::test]
async fn tiled_strategy_drives_the_same_pipeline() {
  let cfg = SourceConfig {
    strategy: Strategy::Tiled,
    bounds: Some(BBox {
      min_easting:  690_000.0,
      min_northing: 5_330_000.0,
      max_easting:  700_000.0,
      max_northing: 5_340_000.0,
    }),
    tile_size_m: 5_000.0,
    ..source_config(10)
  };
  let transport = ScriptedTransport::new(vec![
    Ok(page_of(vec![bridge("M-1", MUNICH, &[])], None)),
    Ok(page_of(vec![], None)),
    Ok(page_of(
      vec![bridge("M-1", MUNICH, &[("zustandsnote", AttrValue::Float(3.0))])],
      None,
    )),
  ]);
  let source = SourceClient::new(&cfg, transport);

  let summary = Pipeline::new(source, MemoryStore::default(), PipelineConfig::default())
    .run()
    .await
    .unwrap();

  assert_eq!(summary.units, 4);
  assert_eq!(summary.unique, 1);
  assert_eq!(summary.critical, 1);
}
