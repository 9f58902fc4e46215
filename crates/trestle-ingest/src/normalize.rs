//! The Record Normalizer: raw feature in, canonical row (or a rejection) out.
//!
//! The upstream schema differs between deployments, so every target field has
//! an ordered list of candidate attribute names and the first one that
//! coerces to a usable value wins. Coercions are explicit and total: a value
//! that does not fit the target type is absent, never an error.

use thiserror::Error;
use trestle_core::record::{AttrValue, CanonicalRecord, RawFeature};
use trestle_geo::{ETRS89_UTM32N, Envelope, GERMANY, TransverseMercator};

use crate::subdivision;

// ─── Candidate attribute names ───────────────────────────────────────────────

const ASSET_ID: &[&str] = &["asset_id", "bauwerksnummer", "bw_nummer", "bwnr", "objectid"];
const NAME: &[&str] = &["name", "bauwerksname", "bw_name", "bezeichnung"];
const CONDITION_SCORE: &[&str] = &["condition_score", "zustandsnote", "zn", "note"];
const CONDITION_CLASS: &[&str] = &["condition_class", "zustandsklasse", "zustand"];
const YEAR_BUILT: &[&str] = &["year_built", "baujahr", "bj"];
const ROAD_NAME: &[&str] = &["road_name", "strasse", "strassenbezeichnung", "str_bez"];
const LOCALITY: &[&str] = &["locality", "ort", "gemeinde"];
const REGION: &[&str] = &["region", "landkreis", "kreis"];
const SUBDIVISION: &[&str] = &["country_subdivision", "land", "bundesland", "land_nr"];
const MATERIAL_CLASS: &[&str] = &["material_class", "bauart", "baustoff", "material"];
const LOAD_CAPACITY: &[&str] = &["load_capacity_index", "traglastindex", "tragfaehigkeit"];
const LENGTH_M: &[&str] = &["length_m", "laenge", "gesamtlaenge"];
const WIDTH_M: &[&str] = &["width_m", "breite", "gesamtbreite"];
const LAST_UPDATED: &[&str] = &["last_updated", "stand", "aktualisiert", "datum"];

// ─── Rejection ───────────────────────────────────────────────────────────────

/// Why a feature was dropped. Counted, never surfaced as a run failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
  #[error("missing or empty asset identifier")]
  MissingId,

  #[error("missing or non-point geometry")]
  MissingGeometry,

  #[error("coordinates outside the plausible envelope ({latitude}, {longitude})")]
  OutsideEnvelope { latitude: f64, longitude: f64 },
}

impl Rejection {
  /// A stable key for counting rejections by reason.
  pub fn reason(&self) -> &'static str {
    match self {
      Self::MissingId => "missing_id",
      Self::MissingGeometry => "missing_geometry",
      Self::OutsideEnvelope { .. } => "outside_envelope",
    }
  }
}

// ─── Coercions ───────────────────────────────────────────────────────────────

/// Trimmed, non-empty text. Numbers are stringified; integral floats lose
/// their trailing `.0`.
pub fn coerce_text(value: &AttrValue) -> Option<String> {
  match value {
    AttrValue::Text(s) => {
      let s = s.trim();
      (!s.is_empty()).then(|| s.to_owned())
    }
    AttrValue::Int(i) => Some(i.to_string()),
    AttrValue::Float(f) if f.is_finite() => {
      if f.fract() == 0.0 && f.abs() < 1e15 {
        Some(format!("{}", *f as i64))
      } else {
        Some(f.to_string())
      }
    }
    _ => None,
  }
}

/// A finite number strictly greater than zero. Numeric text is accepted,
/// including a decimal comma (`"2,4"`).
pub fn coerce_positive_f64(value: &AttrValue) -> Option<f64> {
  let n = match value {
    AttrValue::Int(i) => *i as f64,
    AttrValue::Float(f) => *f,
    AttrValue::Text(s) => s.trim().replace(',', ".").parse().ok()?,
    _ => return None,
  };
  (n.is_finite() && n > 0.0).then_some(n)
}

/// A positive integral year.
pub fn coerce_year(value: &AttrValue) -> Option<i32> {
  let n = coerce_positive_f64(value)?;
  if n.fract() != 0.0 || n > i32::MAX as f64 {
    return None;
  }
  Some(n as i32)
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Maps [`RawFeature`]s onto [`CanonicalRecord`]s.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
  projection: TransverseMercator,
  envelope:   Envelope,
}

impl Default for Normalizer {
  fn default() -> Self { Self::new(ETRS89_UTM32N, GERMANY) }
}

impl Normalizer {
  pub fn new(projection: TransverseMercator, envelope: Envelope) -> Self {
    Self { projection, envelope }
  }

  pub fn normalize(&self, feature: &RawFeature) -> Result<CanonicalRecord, Rejection> {
    let asset_id = first(feature, ASSET_ID, coerce_text)
      .or_else(|| feature.id.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned))
      .ok_or(Rejection::MissingId)?;

    let point = feature.geometry.ok_or(Rejection::MissingGeometry)?;
    let geo = self.projection.to_geographic(point.easting, point.northing);
    if !self.envelope.contains(geo) {
      return Err(Rejection::OutsideEnvelope {
        latitude:  geo.latitude,
        longitude: geo.longitude,
      });
    }

    let subdivision = first(feature, SUBDIVISION, |v| subdivision::lookup(v).map(str::to_owned));
    let region = first(feature, REGION, coerce_text).or_else(|| subdivision.clone());

    Ok(CanonicalRecord {
      name: first(feature, NAME, coerce_text)
        .unwrap_or_else(|| CanonicalRecord::UNKNOWN_NAME.to_owned()),
      condition_score: first(feature, CONDITION_SCORE, coerce_positive_f64),
      condition_class: first(feature, CONDITION_CLASS, coerce_text),
      year_built: first(feature, YEAR_BUILT, coerce_year),
      road_name: first(feature, ROAD_NAME, coerce_text),
      locality: first(feature, LOCALITY, coerce_text),
      region,
      country_subdivision: subdivision,
      material_class: first(feature, MATERIAL_CLASS, coerce_text),
      load_capacity_index: first(feature, LOAD_CAPACITY, coerce_positive_f64),
      length_m: first(feature, LENGTH_M, coerce_positive_f64),
      width_m: first(feature, WIDTH_M, coerce_positive_f64),
      last_updated: first(feature, LAST_UPDATED, coerce_text),
      ..CanonicalRecord::new(asset_id, geo.latitude, geo.longitude)
    })
  }
}

/// The first candidate attribute that coerces to a value.
fn first<T>(
  feature: &RawFeature,
  candidates: &[&str],
  coerce: impl Fn(&AttrValue) -> Option<T>,
) -> Option<T> {
  candidates
    .iter()
    .filter_map(|key| feature.attr(key))
    .find_map(coerce)
}
