//! Geographic plausibility envelope.
//!
//! A cheap bounding-box test that catches points from other projection zones
//! and corrupted geometries without a full boundary-polygon check.

use serde::{Deserialize, Serialize};

use crate::{GeoPoint, TransverseMercator};

/// An inclusive latitude/longitude box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
  pub min_lat: f64,
  pub max_lat: f64,
  pub min_lon: f64,
  pub max_lon: f64,
}

/// The plausible extent of Germany, with some margin.
pub const GERMANY: Envelope = Envelope {
  min_lat: 47.0,
  max_lat: 55.5,
  min_lon: 5.0,
  max_lon: 15.5,
};

impl Envelope {
  /// `true` if `p` lies inside the box (edges included). NaN and infinities
  /// are never inside.
  pub fn contains(&self, p: GeoPoint) -> bool {
    p.latitude.is_finite()
      && p.longitude.is_finite()
      && (self.min_lat..=self.max_lat).contains(&p.latitude)
      && (self.min_lon..=self.max_lon).contains(&p.longitude)
  }

  /// The projected bounding box `(min_e, min_n, max_e, max_n)` that covers
  /// this envelope in `grid`.
  ///
  /// Meridians converge towards the pole, so the extreme eastings come from
  /// the southern corners and the extreme northings from the northern edge on
  /// the central meridian; all four corners and the central-meridian edge
  /// points are sampled.
  pub fn projected_bounds(&self, grid: &TransverseMercator) -> (f64, f64, f64, f64) {
    let cm = grid.central_meridian.clamp(self.min_lon, self.max_lon);
    let samples = [
      (self.min_lat, self.min_lon),
      (self.min_lat, self.max_lon),
      (self.max_lat, self.min_lon),
      (self.max_lat, self.max_lon),
      (self.min_lat, cm),
      (self.max_lat, cm),
    ];
    samples.iter().fold(
      (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
      |(min_e, min_n, max_e, max_n), &(lat, lon)| {
        let (e, n) = grid.to_projected(lat, lon);
        (min_e.min(e), min_n.min(n), max_e.max(e), max_n.max(n))
      },
    )
  }
}
