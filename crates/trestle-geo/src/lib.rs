//! Coordinate transformation for Trestle.
//!
//! Converts national-grid (transverse Mercator) eastings/northings into
//! WGS84-compatible latitude/longitude and back, and filters results against a
//! plausible geographic envelope. Pure and synchronous; no I/O.
//!
//! # Quick start
//!
//! ```
//! use trestle_geo::{ETRS89_UTM32N, GERMANY};
//!
//! let p = ETRS89_UTM32N.to_geographic(691_650.367, 5_334_754.246);
//! assert!(GERMANY.contains(p));
//! assert!((p.latitude - 48.137154).abs() < 1e-4);
//! ```

mod envelope;
mod projection;

pub use envelope::{Envelope, GERMANY};
pub use projection::{ETRS89_UTM32N, GeoPoint, TransverseMercator};
