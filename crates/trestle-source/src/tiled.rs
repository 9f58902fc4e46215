//! Spatial tiling.
//!
//! Partitions the projected bounds into a regular grid of square tiles and
//! issues one bounding-box query per tile. The grid index is the cursor, so
//! the walk terminates after exactly `rows × cols` units regardless of what
//! the server reports.

use std::time::Duration;

use crate::{
  SourceConfig,
  pacing::Pacer,
  query::{BBox, FeatureQuery, Selection},
  source::{Batch, FeatureSource, UnitOutcome},
  transport::Transport,
};

/// Largest grid a run will walk.
pub const MAX_TILES: u64 = 100_000;

/// Number of tiles `tile_grid` produces for `bounds` at `size` metres,
/// saturating instead of overflowing.
pub fn grid_size(bounds: &BBox, size: f64) -> u64 {
  if !(size > 0.0) || !(bounds.width() > 0.0) || !(bounds.height() > 0.0) {
    return 0;
  }
  let cols = (bounds.width() / size).ceil() as u64;
  let rows = (bounds.height() / size).ceil() as u64;
  rows.saturating_mul(cols)
}

/// Split `bounds` into square tiles of `size` metres, row-major from the
/// south-west corner. Edge tiles are clipped to `bounds`. Grids larger than
/// [`MAX_TILES`] come back empty.
pub fn tile_grid(bounds: BBox, size: f64) -> Vec<BBox> {
  let count = grid_size(&bounds, size);
  if count == 0 || count > MAX_TILES {
    return Vec::new();
  }
  let cols = (bounds.width() / size).ceil() as u64;
  let rows = (bounds.height() / size).ceil() as u64;

  let mut tiles = Vec::with_capacity(count as usize);
  for row in 0..rows {
    let min_northing = bounds.min_northing + row as f64 * size;
    let max_northing = (min_northing + size).min(bounds.max_northing);
    for col in 0..cols {
      let min_easting = bounds.min_easting + col as f64 * size;
      let max_easting = (min_easting + size).min(bounds.max_easting);
      tiles.push(BBox { min_easting, min_northing, max_easting, max_northing });
    }
  }
  tiles
}

pub struct TiledSource<T> {
  transport:     T,
  pacer:         Pacer,
  type_name:     String,
  alt_type_name: Option<String>,
  result_cap:    u64,
  tiles:         Vec<BBox>,
  cursor:        usize,
}

impl<T: Transport> TiledSource<T> {
  pub fn new(config: &SourceConfig, transport: T) -> Self {
    let tiles = tile_grid(config.tiling_bounds(), config.tile_size_m);
    let tiles = match config.max_units {
      Some(cap) => tiles.into_iter().take(cap as usize).collect(),
      None => tiles,
    };
    tracing::debug!(tiles = tiles.len(), size_m = config.tile_size_m, "tile grid built");

    Self {
      transport,
      pacer: Pacer::new(
        Duration::from_millis(config.request_delay_ms),
        Duration::from_millis(config.retry_delay_ms),
      ),
      type_name: config.type_name.clone(),
      alt_type_name: config.alt_type_name.clone(),
      result_cap: config.tile_result_cap.max(1),
      tiles,
      cursor: 0,
    }
  }

  pub fn tile_count(&self) -> usize { self.tiles.len() }

  pub fn transport(&self) -> &T { &self.transport }
}

impl<T: Transport> FeatureSource for TiledSource<T> {
  async fn fetch_next(&mut self) -> Batch {
    let Some(&bbox) = self.tiles.get(self.cursor) else {
      return Batch::exhausted();
    };
    self.cursor += 1;
    let unit = format!("tile {}/{}", self.cursor, self.tiles.len());
    let query = FeatureQuery {
      type_name: self.type_name.clone(),
      selection: Selection::Tile { bbox, count: self.result_cap },
    };

    let (features, outcome) = match self
      .pacer
      .fetch(&self.transport, &unit, &query, self.alt_type_name.as_deref())
      .await
    {
      Ok(fetched) => {
        if fetched.features.len() as u64 >= self.result_cap {
          tracing::warn!(
            unit = %unit,
            cap = self.result_cap,
            "tile hit the result cap; features may be missing, use a smaller tile size"
          );
        }
        (fetched.features, UnitOutcome::Fetched)
      }
      Err(e) => {
        tracing::warn!(unit = %unit, error = %e, "tile failed after retry");
        (Vec::new(), UnitOutcome::Skipped { reason: e.to_string() })
      }
    };

    Batch {
      unit,
      features,
      outcome,
      done: self.cursor >= self.tiles.len(),
    }
  }
}
