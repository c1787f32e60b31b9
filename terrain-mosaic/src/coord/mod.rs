//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile/pixel coordinates used by slippy-map tile sources.

mod types;

pub use types::{
    CoordError, Extent, TileBounds, TileCoord, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM, TILE_SIZE,
};

use std::f64::consts::PI;

/// Target output width used to derive a zoom level when none is given.
pub const VIEWPORT_WIDTH: u32 = 1920;

/// Target output height used to derive a zoom level when none is given.
pub const VIEWPORT_HEIGHT: u32 = 1080;

/// Sine of latitude is clamped to this magnitude before projecting, which
/// keeps the poles finite.
const MAX_SIN_LAT: f64 = 0.9999;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 20)
///
/// # Returns
///
/// A `Result` containing the tile coordinates or an error if inputs are invalid.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    // Validate inputs
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    // Calculate number of tiles at this zoom level
    let n = 2.0_f64.powi(zoom as i32);
    let max_index = (n as u32).saturating_sub(1);

    // Convert longitude to tile X coordinate
    let x = (((lon + 180.0) / 360.0 * n) as u32).min(max_index);

    // Convert latitude to tile Y coordinate using Web Mercator projection
    let lat_rad = lat * PI / 180.0;
    let y = (((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32).min(max_index);

    Ok(TileCoord { x, y, zoom })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    corner_to_lat_lon(tile.x as f64, tile.y as f64, tile.zoom)
}

/// Returns the geographic footprint of a tile.
///
/// West/north come from the tile's own northwest corner, east/south from the
/// northwest corner of its diagonal neighbour.
pub fn tile_bounds(tile: &TileCoord) -> TileBounds {
    let (north, west) = corner_to_lat_lon(tile.x as f64, tile.y as f64, tile.zoom);
    let (south, east) = corner_to_lat_lon(tile.x as f64 + 1.0, tile.y as f64 + 1.0, tile.zoom);
    TileBounds {
        west,
        south,
        east,
        north,
    }
}

fn corner_to_lat_lon(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let n = 2.0_f64.powi(zoom as i32);

    let lon = x / n * 360.0 - 180.0;

    // Inverse Web Mercator
    let lat_rad = (PI * (1.0 - 2.0 * y / n)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Size of the world in pixels at `zoom`.
fn world_pixels(zoom: u8) -> f64 {
    TILE_SIZE as f64 * 2.0_f64.powi(zoom as i32)
}

/// Projects a longitude to a global pixel column at `zoom`.
///
/// The result is rounded to the nearest pixel and clamped to the world.
pub fn lon_to_pixel_x(lon: f64, zoom: u8) -> f64 {
    let size = world_pixels(zoom);
    let x = (size / 2.0 + lon * size / 360.0).round();
    x.clamp(0.0, size)
}

/// Projects a latitude to a global pixel row at `zoom`.
///
/// The result is rounded to the nearest pixel and clamped to the world.
pub fn lat_to_pixel_y(lat: f64, zoom: u8) -> f64 {
    let size = world_pixels(zoom);
    let f = (lat * PI / 180.0).sin().clamp(-MAX_SIN_LAT, MAX_SIN_LAT);
    let y = (size / 2.0 - 0.5 * ((1.0 + f) / (1.0 - f)).ln() * size / (2.0 * PI)).round();
    y.clamp(0.0, size)
}

/// Picks the deepest zoom at which `extent` fits inside a
/// `width` × `height` pixel viewport.
///
/// The extent is measured in pixels at [`MAX_ZOOM`]; each zoom level out
/// halves that size, so the fitting zoom is `MAX_ZOOM - log2(ratio)`
/// rounded down, clamped to the supported range.
pub fn zoom_for_viewport(extent: &Extent, width: u32, height: u32) -> u8 {
    let base = MAX_ZOOM;
    let px_width = lon_to_pixel_x(extent.east(), base) - lon_to_pixel_x(extent.west(), base);
    let px_height = lat_to_pixel_y(extent.south(), base) - lat_to_pixel_y(extent.north(), base);

    let ratio = (px_width / width.max(1) as f64).max(px_height / height.max(1) as f64);
    if ratio <= 0.0 {
        return MAX_ZOOM;
    }

    let adjusted = (base as f64 - ratio.log2()).floor();
    adjusted.clamp(MIN_ZOOM as f64, MAX_ZOOM as f64) as u8
}

/// Zoom level for the default 1920×1080 output.
pub fn default_zoom(extent: &Extent) -> u8 {
    zoom_for_viewport(extent, VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
}
