//! Tile grid resolution.
//!
//! Turns an [`Extent`] and zoom level into the set of tiles that must be
//! fetched to cover it. The minimal covering range is padded by one tile on
//! every side so that tiles straddling the extent's edges are never missing
//! from the mosaic.

use crate::coord::{lat_to_pixel_y, lon_to_pixel_x, CoordError, Extent, TileCoord, MAX_ZOOM, TILE_SIZE};

/// Number of tiles added around the minimal covering range on each side.
pub const GRID_PADDING: u32 = 1;

/// An inclusive rectangle of tile indices at one zoom level.
///
/// Iteration is column-major (x outer, y inner), which fixes the order in
/// which tiles are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGrid {
    pub zoom: u8,
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

impl TileGrid {
    /// Total number of tiles in the grid.
    pub fn len(&self) -> usize {
        let width = (self.max_x - self.min_x + 1) as usize;
        let height = (self.max_y - self.min_y + 1) as usize;
        width * height
    }

    /// A resolved grid always holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if `tile` lies within the grid.
    pub fn contains(&self, tile: &TileCoord) -> bool {
        tile.zoom == self.zoom
            && (self.min_x..=self.max_x).contains(&tile.x)
            && (self.min_y..=self.max_y).contains(&tile.y)
    }

    /// Iterates every tile coordinate in fetch order.
    pub fn iter(&self) -> TileGridIter {
        TileGridIter {
            grid: *self,
            next_x: self.min_x,
            next_y: self.min_y,
            done: false,
        }
    }

    /// Collects the grid into a vector in fetch order.
    pub fn tiles(&self) -> Vec<TileCoord> {
        self.iter().collect()
    }
}

impl IntoIterator for &TileGrid {
    type Item = TileCoord;
    type IntoIter = TileGridIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the tiles of a [`TileGrid`].
#[derive(Debug, Clone)]
pub struct TileGridIter {
    grid: TileGrid,
    next_x: u32,
    next_y: u32,
    done: bool,
}

impl Iterator for TileGridIter {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let tile = TileCoord::new(self.next_x, self.next_y, self.grid.zoom);

        if self.next_y < self.grid.max_y {
            self.next_y += 1;
        } else if self.next_x < self.grid.max_x {
            self.next_x += 1;
            self.next_y = self.grid.min_y;
        } else {
            self.done = true;
        }

        Some(tile)
    }
}

/// Resolves the padded tile grid covering `extent` at `zoom`.
///
/// Edges falling exactly on a tile boundary do not pull in the next tile
/// (the east/south pixel is taken one pixel inside). Padding never leaves the
/// world grid: at the antimeridian or the poles the range is clamped to
/// `0..2^zoom`.
///
/// # Errors
///
/// Returns [`CoordError::InvalidZoom`] if `zoom` exceeds [`MAX_ZOOM`].
/// Extents are validated when constructed, so an [`Extent`] value is
/// always well ordered here.
pub fn resolve(extent: &Extent, zoom: u8) -> Result<TileGrid, CoordError> {
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let size = TILE_SIZE as f64;
    let last_index = (1u32 << zoom) - 1;

    let px_west = lon_to_pixel_x(extent.west(), zoom);
    let px_east = lon_to_pixel_x(extent.east(), zoom);
    let py_north = lat_to_pixel_y(extent.north(), zoom);
    let py_south = lat_to_pixel_y(extent.south(), zoom);

    let to_index = |px: f64| ((px / size).floor().max(0.0) as u32).min(last_index);

    let x0 = to_index(px_west);
    let x1 = to_index(px_east - 1.0).max(x0);
    let y0 = to_index(py_north);
    let y1 = to_index(py_south - 1.0).max(y0);

    Ok(TileGrid {
        zoom,
        min_x: x0.saturating_sub(GRID_PADDING),
        max_x: (x1 + GRID_PADDING).min(last_index),
        min_y: y0.saturating_sub(GRID_PADDING),
        max_y: (y1 + GRID_PADDING).min(last_index),
    })
}

/// Resolves the grid from raw `[west, south, east, north]` bounds.
///
/// Fails fast with [`CoordError::InvalidExtent`] before any other work when
/// the bounds are malformed.
pub fn resolve_bounds(bounds: [f64; 4], zoom: u8) -> Result<TileGrid, CoordError> {
    let extent = Extent::try_from(bounds)?;
    resolve(&extent, zoom)
}
