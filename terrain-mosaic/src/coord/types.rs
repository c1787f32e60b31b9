//! Coordinate types and errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;

/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;

/// Minimum zoom level.
pub const MIN_ZOOM: u8 = 0;

/// Maximum zoom level accepted for tile math.
///
/// Terrain-RGB sources publish up to zoom 15, but the math itself is valid
/// well beyond that, so the bound is kept at the viewport heuristic's base.
pub const MAX_ZOOM: u8 = 20;

/// Edge length of a slippy-map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Errors raised by coordinate validation and conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude outside the Web Mercator range.
    #[error("Invalid latitude: {0} (must be between -85.05112878 and 85.05112878)")]
    InvalidLatitude(f64),

    /// Longitude outside -180..180.
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// Zoom level outside the supported range.
    #[error("Invalid zoom level: {0} (must be between 0 and 20)")]
    InvalidZoom(u8),

    /// Malformed bounding box.
    #[error("Invalid extent [{west}, {south}, {east}, {north}]: {reason}")]
    InvalidExtent {
        west: f64,
        south: f64,
        east: f64,
        north: f64,
        reason: &'static str,
    },
}

/// A slippy-map tile address.
///
/// `x` grows west to east, `y` grows north to south, both in `0..2^zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column (west to east)
    pub x: u32,
    /// Row (north to south)
    pub y: u32,
    /// Zoom level
    pub zoom: u8,
}

impl TileCoord {
    /// Creates a tile coordinate without range checks.
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Number of tiles along one axis at this tile's zoom level.
    pub fn tiles_per_axis(&self) -> u32 {
        1u32 << self.zoom
    }

    /// Returns true if the coordinate lies inside the world grid.
    pub fn is_valid(&self) -> bool {
        self.zoom <= MAX_ZOOM && self.x < self.tiles_per_axis() && self.y < self.tiles_per_axis()
    }

    /// File stem used for this tile's intermediate files (`z_x_y`).
    pub fn file_stem(&self) -> String {
        format!("{}_{}_{}", self.zoom, self.x, self.y)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A geographic bounding box in degrees.
///
/// Field order matches the caller-facing `[west, south, east, north]` array.
/// Construct through [`Extent::new`] so the ordering invariant always holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl Extent {
    /// Creates an extent, rejecting non-finite or inverted bounds.
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, CoordError> {
        let invalid = |reason| CoordError::InvalidExtent {
            west,
            south,
            east,
            north,
            reason,
        };

        if ![west, south, east, north].iter().all(|v| v.is_finite()) {
            return Err(invalid("bounds must be finite numbers"));
        }
        if west >= east {
            return Err(invalid("west must be less than east"));
        }
        if south >= north {
            return Err(invalid("south must be less than north"));
        }
        if west < MIN_LON || east > MAX_LON {
            return Err(invalid("longitudes must lie within -180..180"));
        }
        if south < -90.0 || north > 90.0 {
            return Err(invalid("latitudes must lie within -90..90"));
        }

        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    /// Creates an extent from a `[west, south, east, north]` slice.
    pub fn from_slice(values: &[f64]) -> Result<Self, CoordError> {
        match values {
            [west, south, east, north] => Self::new(*west, *south, *east, *north),
            _ => Err(CoordError::InvalidExtent {
                west: f64::NAN,
                south: f64::NAN,
                east: f64::NAN,
                north: f64::NAN,
                reason: "extent must have exactly four values",
            }),
        }
    }

    pub fn west(&self) -> f64 {
        self.west
    }

    pub fn south(&self) -> f64 {
        self.south
    }

    pub fn east(&self) -> f64 {
        self.east
    }

    pub fn north(&self) -> f64 {
        self.north
    }

    /// Returns the bounds as `[west, south, east, north]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }
}

impl TryFrom<[f64; 4]> for Extent {
    type Error = CoordError;

    fn try_from(values: [f64; 4]) -> Result<Self, Self::Error> {
        Self::new(values[0], values[1], values[2], values[3])
    }
}

impl Serialize for Extent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_array().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Extent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = <[f64; 4]>::deserialize(deserializer)?;
        Extent::try_from(values).map_err(serde::de::Error::custom)
    }
}

/// Geographic footprint of a single tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}
