//! Feature-source configuration, deserialised from the `[source]` table.

use serde::Deserialize;
use trestle_geo::{ETRS89_UTM32N, GERMANY};

use crate::query::BBox;

/// Which retrieval strategy walks the feature type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
  /// Offset pagination (`startIndex` + `count` + `sortBy`).
  #[default]
  Paged,
  /// One bounding-box query per square tile of a regular grid.
  Tiled,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
  /// WFS endpoint, without query string.
  pub base_url:         String,
  /// Feature type to request (`typeNames`).
  pub type_name:        String,
  /// Fallback feature type tried when a tile request gets an unexpected
  /// status.
  pub alt_type_name:    Option<String>,
  pub version:          String,
  pub output_format:    String,
  /// Projected CRS of request bounding boxes and returned geometries.
  pub srs_name:         String,
  pub strategy:         Strategy,

  // ── Paged ───────────────────────────────────────────────────────────────
  pub page_size:        u64,
  /// Result ordering key; keeps offsets stable between requests.
  pub sort_by:          Option<String>,
  /// Stop after this many consecutive empty (or skipped) pages.
  pub max_empty_pages:  u32,
  /// Hard cap on the number of request units.
  pub max_units:        Option<u64>,

  // ── Tiled ───────────────────────────────────────────────────────────────
  /// Edge length of a square tile in metres.
  pub tile_size_m:      f64,
  /// `count` sent with each tile request.
  pub tile_result_cap:  u64,
  /// Projected area to tile; defaults to the German envelope in UTM 32N.
  pub bounds:           Option<BBox>,

  // ── Pacing ──────────────────────────────────────────────────────────────
  pub request_delay_ms: u64,
  pub retry_delay_ms:   u64,
  pub timeout_secs:     u64,
}

impl Default for SourceConfig {
  fn default() -> Self {
    Self {
      base_url:         String::new(),
      type_name:        "bast:bruecken".to_owned(),
      alt_type_name:    None,
      version:          "2.0.0".to_owned(),
      output_format:    "application/json".to_owned(),
      srs_name:         "EPSG:25832".to_owned(),
      strategy:         Strategy::Paged,
      page_size:        1000,
      sort_by:          Some("objectid".to_owned()),
      max_empty_pages:  3,
      max_units:        None,
      tile_size_m:      50_000.0,
      tile_result_cap:  10_000,
      bounds:           None,
      request_delay_ms: 300,
      retry_delay_ms:   2000,
      timeout_secs:     60,
    }
  }
}

impl SourceConfig {
  /// The configured tiling area, or the German envelope projected into the
  /// source grid.
  pub fn tiling_bounds(&self) -> BBox {
    self.bounds.unwrap_or_else(|| {
      let (min_easting, min_northing, max_easting, max_northing) =
        GERMANY.projected_bounds(&ETRS89_UTM32N);
      BBox { min_easting, min_northing, max_easting, max_northing }
    })
  }
}
