//! Transverse Mercator forward and inverse projection.
//!
//! Closed-form series after Snyder, *Map Projections: A Working Manual*
//! (USGS PP 1395), pp. 60–64. The inverse computes the footpoint latitude from
//! the rectifying latitude via the meridional-arc series, then applies the
//! curvature corrections in powers of `D`. Millimetre-accurate inside a UTM
//! zone and still well under a metre a few degrees beyond it.

use serde::{Deserialize, Serialize};

/// A geographic coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
  pub latitude:  f64,
  pub longitude: f64,
}

/// Parameters of a transverse Mercator grid on an ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercator {
  /// Ellipsoid semi-major axis in metres.
  pub semi_major:       f64,
  /// Ellipsoid flattening.
  pub flattening:       f64,
  /// Longitude of the central meridian in degrees.
  pub central_meridian: f64,
  /// Scale factor on the central meridian.
  pub scale:            f64,
  pub false_easting:    f64,
  pub false_northing:   f64,
}

/// ETRS89 / UTM zone 32N (EPSG:25832) on the GRS80 ellipsoid.
pub const ETRS89_UTM32N: TransverseMercator = TransverseMercator {
  semi_major:       6_378_137.0,
  flattening:       1.0 / 298.257_222_101,
  central_meridian: 9.0,
  scale:            0.9996,
  false_easting:    500_000.0,
  false_northing:   0.0,
};

impl TransverseMercator {
  fn e2(&self) -> f64 { self.flattening * (2.0 - self.flattening) }

  /// Meridional arc length from the equator to `phi` (radians).
  fn meridian_arc(&self, phi: f64) -> f64 {
    let e2 = self.e2();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    self.semi_major
      * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
  }

  /// Convert a projected easting/northing (metres) to latitude/longitude in
  /// degrees, rounded to six decimal places.
  ///
  /// Never fails. Inputs far outside the grid's zone produce meaningless
  /// coordinates; callers filter with an [`Envelope`](crate::Envelope).
  pub fn to_geographic(&self, easting: f64, northing: f64) -> GeoPoint {
    let a = self.semi_major;
    let k0 = self.scale;
    let e2 = self.e2();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    // Footpoint latitude.
    let m = (northing - self.false_northing) / k0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
    let root = (1.0 - e2).sqrt();
    let e1 = (1.0 - root) / (1.0 + root);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;
    let phi1 = mu
      + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
      + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
      + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
      + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    // Curvature terms at the footpoint.
    let (sin1, cos1) = phi1.sin_cos();
    let tan1 = phi1.tan();
    let c1 = ep2 * cos1 * cos1;
    let t1 = tan1 * tan1;
    let w = 1.0 - e2 * sin1 * sin1;
    let n1 = a / w.sqrt();
    let r1 = a * (1.0 - e2) / (w * w.sqrt());
    let d = (easting - self.false_easting) / (n1 * k0);
    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;

    let lat = phi1
      - (n1 * tan1 / r1)
        * (d2 / 2.0
          - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
          + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
            * d6
            / 720.0);
    let lon = self.central_meridian.to_radians()
      + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5
          / 120.0)
        / cos1;

    GeoPoint {
      latitude:  round6(lat.to_degrees()),
      longitude: round6(lon.to_degrees()),
    }
  }

  /// Convert latitude/longitude in degrees to a projected easting/northing in
  /// metres. Not rounded.
  pub fn to_projected(&self, latitude: f64, longitude: f64) -> (f64, f64) {
    let a = self.semi_major;
    let k0 = self.scale;
    let e2 = self.e2();
    let ep2 = e2 / (1.0 - e2);

    let phi = latitude.to_radians();
    let (sin, cos) = phi.sin_cos();
    let tan = phi.tan();
    let n = a / (1.0 - e2 * sin * sin).sqrt();
    let t = tan * tan;
    let c = ep2 * cos * cos;
    let big_a = (longitude - self.central_meridian).to_radians() * cos;
    let a2 = big_a * big_a;
    let a3 = a2 * big_a;
    let a4 = a3 * big_a;
    let a5 = a4 * big_a;
    let a6 = a5 * big_a;
    let m = self.meridian_arc(phi);

    let easting = self.false_easting
      + k0
        * n
        * (big_a
          + (1.0 - t + c) * a3 / 6.0
          + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0);
    let northing = self.false_northing
      + k0
        * (m
          + n * tan
            * (a2 / 2.0
              + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
              + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));

    (easting, northing)
  }
}

/// Round to six decimal places (~0.1 m on the ground).
fn round6(v: f64) -> f64 { (v * 1e6).round() / 1e6 }

#[cfg(test)]
mod tests {
  use super::*;

  /// (label, easting, northing, latitude, longitude); geographic values
  /// cross-checked with an independent sixth-order Krüger series.
  const REFERENCE: &[(&str, f64, f64, f64, f64)] = &[
    ("Berlin", 796_987.274, 5_827_473.090, 52.516275, 13.377704),
    ("Munich", 691_650.367, 5_334_754.246, 48.137154, 11.576124),
    ("Hamburg", 566_296.251, 5_933_959.965, 53.550341, 10.000654),
    ("Cologne", 356_558.858, 5_645_279.727, 50.941278, 6.958281),
    ("Frankfurt", 477_271.450, 5_551_012.235, 50.110924, 8.682127),
    ("Dresden", 831_972.142, 5_666_114.342, 51.050407, 13.737262),
    ("Freiburg", 413_625.116, 5_316_838.601, 47.999008, 7.842104),
    ("Flensburg", 528_740.071, 6_071_931.343, 54.793743, 9.446996),
  ];

  #[test]
  fn known_points_convert_within_tolerance() {
    for &(label, e, n, lat, lon) in REFERENCE {
      let p = ETRS89_UTM32N.to_geographic(e, n);
      assert!(
        (p.latitude - lat).abs() <= 1e-4,
        "{label}: latitude {} vs {lat}",
        p.latitude
      );
      assert!(
        (p.longitude - lon).abs() <= 1e-4,
        "{label}: longitude {} vs {lon}",
        p.longitude
      );
    }
  }

  #[test]
  fn forward_matches_reference_within_a_centimetre() {
    for &(label, e, n, lat, lon) in REFERENCE {
      let (pe, pn) = ETRS89_UTM32N.to_projected(lat, lon);
      assert!((pe - e).abs() < 0.01, "{label}: easting {pe} vs {e}");
      assert!((pn - n).abs() < 0.01, "{label}: northing {pn} vs {n}");
    }
  }

  #[test]
  fn central_meridian_maps_to_false_easting() {
    let p = ETRS89_UTM32N.to_geographic(500_000.0, 5_205_164.221);
    assert_eq!(p.longitude, 9.0);
    assert_eq!(p.latitude, 47.000001);
  }

  #[test]
  fn output_is_rounded_to_six_decimals() {
    let p = ETRS89_UTM32N.to_geographic(612_345.678, 5_712_345.678);
    assert_eq!(p.latitude, round6(p.latitude));
    assert_eq!(p.longitude, round6(p.longitude));
  }
}
