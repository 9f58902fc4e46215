//! Record types: what the feature service hands us, and what we persist.
//!
//! A [`RawFeature`] is one observation exactly as decoded from the source: an
//! optional identifier, an optional projected point, and an open-ended bag of
//! loosely-typed attributes. A [`CanonicalRecord`] is the flat, validated row
//! written to the destination store, keyed by `asset_id`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Attribute values ────────────────────────────────────────────────────────

/// A single untyped attribute value from a feature's property bag.
///
/// The upstream schema is inconsistent across deployments: the same field may
/// arrive as a number, a numeric string, or not at all. Consumers coerce
/// explicitly per target field rather than relying on any implicit
/// conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
  /// Nested arrays or objects; never coerced into a scalar field.
  Other(serde_json::Value),
}

impl AttrValue {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }
}

impl From<&str> for AttrValue {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for AttrValue {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<i64> for AttrValue {
  fn from(v: i64) -> Self { Self::Int(v) }
}

impl From<f64> for AttrValue {
  fn from(v: f64) -> Self { Self::Float(v) }
}

// ─── Raw features ────────────────────────────────────────────────────────────

/// A point in the source's projected national grid, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
  pub easting:  f64,
  pub northing: f64,
}

/// One observation as received from the feature service. Discarded after
/// normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeature {
  /// The service-assigned feature id. Not necessarily stable across runs;
  /// the stable asset id usually lives in `properties`.
  pub id:         Option<String>,
  /// `None` when the feature had no geometry or a non-point geometry.
  pub geometry:   Option<ProjectedPoint>,
  pub properties: BTreeMap<String, AttrValue>,
}

impl RawFeature {
  /// Look up a property, treating an explicit JSON `null` as absent.
  pub fn attr(&self, key: &str) -> Option<&AttrValue> {
    self.properties.get(key).filter(|v| !v.is_null())
  }
}

// ─── Canonical record ────────────────────────────────────────────────────────

/// The unit of truth persisted downstream. Serialised field names are the
/// destination column names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
  /// Primary key; stable across runs.
  pub asset_id:            String,
  pub name:                String,
  /// Conventionally 1.0 (best) to 4.0 (worst). Non-positive source values
  /// never reach this field.
  pub condition_score:     Option<f64>,
  pub condition_class:     Option<String>,
  pub year_built:          Option<i32>,
  pub road_name:           Option<String>,
  pub locality:            Option<String>,
  /// Aggregation key for region statistics.
  pub region:              Option<String>,
  pub country_subdivision: Option<String>,
  pub material_class:      Option<String>,
  pub load_capacity_index: Option<f64>,
  pub length_m:            Option<f64>,
  pub width_m:             Option<f64>,
  pub latitude:            f64,
  pub longitude:           f64,
  /// Opaque provenance/date stamp from the source.
  pub last_updated:        Option<String>,
}

impl CanonicalRecord {
  /// Sentinel used for `name` when the source carries none.
  pub const UNKNOWN_NAME: &'static str = "unknown";

  /// A record with every optional field absent.
  pub fn new(asset_id: impl Into<String>, latitude: f64, longitude: f64) -> Self {
    Self {
      asset_id: asset_id.into(),
      name: Self::UNKNOWN_NAME.to_owned(),
      condition_score: None,
      condition_class: None,
      year_built: None,
      road_name: None,
      locality: None,
      region: None,
      country_subdivision: None,
      material_class: None,
      load_capacity_index: None,
      length_m: None,
      width_m: None,
      latitude,
      longitude,
      last_updated: None,
    }
  }

  /// Check the invariants every persisted row must satisfy.
  pub fn validate(&self) -> Result<()> {
    if self.asset_id.trim().is_empty() {
      return Err(Error::EmptyAssetId);
    }
    if !self.latitude.is_finite() || !self.longitude.is_finite() {
      return Err(Error::NonFiniteCoordinates {
        asset_id: self.asset_id.clone(),
      });
    }
    Ok(())
  }
}
