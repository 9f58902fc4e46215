//! GeoJSON feature-collection decoding.
//!
//! WFS servers disagree on the details: counts come as `numberMatched`
//! (sometimes the string `"unknown"`) or `totalFeatures`, feature ids may be
//! strings or numbers, and points may carry a Z value. Decoding is lenient at
//! the collection level; a feature with an unusable geometry still decodes,
//! with `geometry: None`, and is rejected later by the normalizer.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use trestle_core::record::{AttrValue, ProjectedPoint, RawFeature};

use crate::Result;

/// One decoded page of features plus the server's total, if it reported one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeaturePage {
  pub features:      Vec<RawFeature>,
  pub total_matched: Option<u64>,
}

impl FeaturePage {
  /// Decode a GeoJSON `FeatureCollection` body.
  pub fn from_json(body: &str) -> Result<Self> {
    let wire: WireCollection = serde_json::from_str(body)?;
    Ok(wire.into_page())
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WireCollection {
  #[serde(default)]
  features:       Vec<WireFeature>,
  #[serde(default, rename = "numberMatched")]
  number_matched: Option<Value>,
  #[serde(default, rename = "totalFeatures")]
  total_features: Option<Value>,
}

#[derive(Deserialize)]
struct WireFeature {
  #[serde(default)]
  id:         Option<Value>,
  #[serde(default)]
  geometry:   Option<WireGeometry>,
  #[serde(default)]
  properties: Option<BTreeMap<String, AttrValue>>,
}

#[derive(Deserialize)]
struct WireGeometry {
  #[serde(rename = "type")]
  kind:        String,
  #[serde(default)]
  coordinates: Value,
}

impl WireCollection {
  fn into_page(self) -> FeaturePage {
    let total_matched = self
      .number_matched
      .as_ref()
      .and_then(count_value)
      .or_else(|| self.total_features.as_ref().and_then(count_value));

    FeaturePage {
      features: self.features.into_iter().map(WireFeature::into_raw).collect(),
      total_matched,
    }
  }
}

impl WireFeature {
  fn into_raw(self) -> RawFeature {
    RawFeature {
      id:         self.id.as_ref().and_then(id_value),
      geometry:   self.geometry.as_ref().and_then(WireGeometry::point),
      properties: self.properties.unwrap_or_default(),
    }
  }
}

impl WireGeometry {
  /// The point position, if this is a `Point` (or a single-member
  /// `MultiPoint`) with at least two finite coordinates.
  fn point(&self) -> Option<ProjectedPoint> {
    let position = match self.kind.as_str() {
      "Point" => &self.coordinates,
      "MultiPoint" => match self.coordinates.as_array()?.as_slice() {
        [only] => only,
        _ => return None,
      },
      _ => return None,
    };
    let coords = position.as_array()?;
    let easting = coords.first()?.as_f64()?;
    let northing = coords.get(1)?.as_f64()?;
    (easting.is_finite() && northing.is_finite())
      .then_some(ProjectedPoint { easting, northing })
  }
}

/// A count that may be a number, a numeric string, or a placeholder such as
/// `"unknown"`.
fn count_value(v: &Value) -> Option<u64> {
  match v {
    Value::Number(n) => n.as_u64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn id_value(v: &Value) -> Option<String> {
  match v {
    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}
