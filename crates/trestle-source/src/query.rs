//! A single GetFeature request unit, independent of transport.

use serde::Deserialize;

/// An axis-aligned box in projected coordinates (metres).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BBox {
  pub min_easting:  f64,
  pub min_northing: f64,
  pub max_easting:  f64,
  pub max_northing: f64,
}

impl BBox {
  pub fn width(&self) -> f64 { self.max_easting - self.min_easting }

  pub fn height(&self) -> f64 { self.max_northing - self.min_northing }
}

/// How a request selects its slice of the feature type.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
  /// Offset pagination with an explicit ordering key.
  Page {
    start_index: u64,
    count:       u64,
    sort_by:     Option<String>,
  },
  /// Every feature inside `bbox`, capped at `count`.
  Tile { bbox: BBox, count: u64 },
}

/// One request unit: a feature type plus a selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
  pub type_name: String,
  pub selection: Selection,
}

impl FeatureQuery {
  /// The same selection against a different feature type.
  pub fn with_type_name(&self, type_name: &str) -> Self {
    Self {
      type_name: type_name.to_owned(),
      selection: self.selection.clone(),
    }
  }
}
