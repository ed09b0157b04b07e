//! Coordinate type definitions

use std::fmt;

use serde::{Deserialize, Serialize};

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Levels of detail supported by vector tile services
pub const MIN_ZOOM: u8 = 0;
pub const MAX_ZOOM: u8 = 22;

/// Tile coordinates in the Web Mercator / Slippy Map system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level (0-22)
    pub zoom: u8,
    /// Y coordinate (north-south), 0 at north
    pub row: u32,
    /// X coordinate (east-west), 0 at west
    pub col: u32,
}

impl TileCoord {
    pub const fn new(zoom: u8, row: u32, col: u32) -> Self {
        Self { zoom, row, col }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.row, self.col)
    }
}

/// An inclusive rectangle of tiles at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub zoom: u8,
    pub min_row: u32,
    pub max_row: u32,
    pub min_col: u32,
    pub max_col: u32,
}

impl TileRange {
    /// Number of tiles in the range.
    pub fn len(&self) -> u64 {
        let rows = (self.max_row - self.min_row) as u64 + 1;
        let cols = (self.max_col - self.min_col) as u64 + 1;
        rows * cols
    }

    /// Whether `coord` lies inside this range.
    pub fn contains(&self, coord: &TileCoord) -> bool {
        coord.zoom == self.zoom
            && (self.min_row..=self.max_row).contains(&coord.row)
            && (self.min_col..=self.max_col).contains(&coord.col)
    }

    /// Always false; a range holds at least one tile.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates tiles in row-major order.
    pub fn iter(&self) -> TileRangeIter {
        TileRangeIter {
            range: *self,
            row: self.min_row,
            col: self.min_col,
            done: false,
        }
    }
}

impl IntoIterator for TileRange {
    type Item = TileCoord;
    type IntoIter = TileRangeIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Row-major iterator over a [`TileRange`].
#[derive(Debug, Clone)]
pub struct TileRangeIter {
    range: TileRange,
    row: u32,
    col: u32,
    done: bool,
}

impl Iterator for TileRangeIter {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let tile = TileCoord::new(self.range.zoom, self.row, self.col);

        if self.col < self.range.max_col {
            self.col += 1;
        } else if self.row < self.range.max_row {
            self.col = self.range.min_col;
            self.row += 1;
        } else {
            self.done = true;
        }

        Some(tile)
    }
}

/// Errors from coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    InvalidLatitude(f64),
    InvalidLongitude(f64),
    InvalidZoom(u8),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(f, "Latitude {} outside [{}, {}]", lat, MIN_LAT, MAX_LAT)
            }
            CoordError::InvalidLongitude(lon) => {
                write!(f, "Longitude {} outside [{}, {}]", lon, MIN_LON, MAX_LON)
            }
            CoordError::InvalidZoom(zoom) => {
                write!(f, "Zoom {} outside [{}, {}]", zoom, MIN_ZOOM, MAX_ZOOM)
            }
        }
    }
}

impl std::error::Error for CoordError {}
