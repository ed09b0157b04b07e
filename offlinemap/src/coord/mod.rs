//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator tile coordinates, plus the scale ↔ level-of-detail mapping
//! used when choosing how deep an export goes.

mod types;

pub use types::{
    CoordError, TileCoord, TileRange, TileRangeIter, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT,
    MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

use crate::region::Extent;

/// Map scale of level 0 in the standard Web Mercator tiling scheme
/// (256px tiles at 96 DPI).
pub const LEVEL_ZERO_SCALE: f64 = 591_657_527.591_555;

/// Relative slack when comparing a requested scale to a level's scale.
const SCALE_TOLERANCE: f64 = 1e-6;

/// Converts geographic coordinates to tile coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-85.05112878 to 85.05112878)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
/// * `zoom` - Zoom level (0 to 22)
///
/// # Returns
///
/// A `Result` containing the tile coordinates or an error if inputs are invalid.
#[inline]
pub fn to_tile_coords(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let last = n as u32 - 1;

    // The east and south edges belong to the last column/row
    let col = (((lon + 180.0) / 360.0 * n) as u32).min(last);

    let lat_rad = lat * PI / 180.0;
    let row = (((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n) as u32).min(last);

    Ok(TileCoord { zoom, row, col })
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.col as f64 / n * 360.0 - 180.0;

    let y = tile.row as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Returns the tile range covering `extent` at `zoom`.
///
/// The extent must already be normalized to `[-180, 180]` longitude;
/// latitudes outside the Web Mercator limits are clamped.
pub fn tiles_for_extent(extent: &Extent, zoom: u8) -> Result<TileRange, CoordError> {
    let ymin = extent.ymin.clamp(MIN_LAT, MAX_LAT);
    let ymax = extent.ymax.clamp(MIN_LAT, MAX_LAT);

    let north_west = to_tile_coords(ymax, extent.xmin, zoom)?;
    let south_east = to_tile_coords(ymin, extent.xmax, zoom)?;

    Ok(TileRange {
        zoom,
        min_row: north_west.row,
        max_row: south_east.row,
        min_col: north_west.col,
        max_col: south_east.col,
    })
}

/// Map scale at which tiles of `zoom` are displayed 1:1.
#[inline]
pub fn scale_for_level(zoom: u8) -> f64 {
    LEVEL_ZERO_SCALE / 2.0_f64.powi(zoom as i32)
}

/// Deepest level whose scale is not finer than `scale`.
///
/// A tiling service never needs tiles more detailed than the scale they will
/// be viewed at, so this is the natural maximum level for an export. The
/// result is capped at `max_zoom`.
pub fn level_for_scale(scale: f64, max_zoom: u8) -> u8 {
    let max_zoom = max_zoom.min(MAX_ZOOM);
    if !(scale.is_finite() && scale > 0.0) {
        return MIN_ZOOM;
    }

    let mut level = MIN_ZOOM;
    while level < max_zoom && scale_for_level(level + 1) >= scale * (1.0 - SCALE_TOLERANCE) {
        level += 1;
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_range_contains() {
        let range = TileRange {
            zoom: 3,
            min_row: 2,
            max_row: 4,
            min_col: 5,
            max_col: 5,
        };
        assert!(range.contains(&TileCoord::new(3, 2, 5)));
        assert!(range.contains(&TileCoord::new(3, 4, 5)));
        assert!(!range.contains(&TileCoord::new(3, 4, 6)));
        assert!(!range.contains(&TileCoord::new(2, 3, 5)));
    }

    #[test]
    fn test_new_york_city_at_zoom_16() {
        // New York City: 40.7128°N, 74.0060°W
        let tile = to_tile_coords(40.7128, -74.0060, 16).unwrap();
        assert_eq!(tile.row, 24640);
        assert_eq!(tile.col, 19295);
        assert_eq!(tile.zoom, 16);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = to_tile_coords(90.0, 0.0, 10);
        assert!(matches!(
            result.unwrap_err(),
            CoordError::InvalidLatitude(_)
        ));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = to_tile_coords(0.0, 0.0, MAX_ZOOM + 1);
        assert_eq!(result.unwrap_err(), CoordError::InvalidZoom(MAX_ZOOM + 1));
    }

    #[test]
    fn test_east_edge_maps_to_last_column() {
        let tile = to_tile_coords(0.0, 180.0, 3).unwrap();
        assert_eq!(tile.col, 7);
    }

    #[test]
    fn test_tile_to_lat_lon_northwest_corner() {
        let tile = TileCoord::new(16, 24640, 19295);
        let (lat, lon) = tile_to_lat_lon(&tile);

        assert!((lat - 40.713).abs() < 0.01);
        assert!((lon - (-74.007)).abs() < 0.01);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let tile = to_tile_coords(40.7128, -74.0060, 16).unwrap();
        let (lat, lon) = tile_to_lat_lon(&tile);

        assert!((lat - 40.7128).abs() < 0.01);
        assert!((lon - (-74.0060)).abs() < 0.01);
    }

    #[test]
    fn test_tiles_for_whole_world_at_level_one() {
        let range = tiles_for_extent(&Extent::new(-180.0, -90.0, 180.0, 90.0), 1).unwrap();
        assert_eq!(range.len(), 4);
        let tiles: Vec<_> = range.iter().collect();
        assert_eq!(
            tiles,
            vec![
                TileCoord::new(1, 0, 0),
                TileCoord::new(1, 0, 1),
                TileCoord::new(1, 1, 0),
                TileCoord::new(1, 1, 1),
            ]
        );
    }

    #[test]
    fn test_tiles_for_small_extent_is_single_tile() {
        let range = tiles_for_extent(&Extent::new(2.29, 48.85, 2.30, 48.86), 5).unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_level_for_scale() {
        assert_eq!(level_for_scale(LEVEL_ZERO_SCALE, 22), 0);
        assert_eq!(level_for_scale(scale_for_level(10), 22), 10);
        // Slightly coarser than level 10 still stops at 9
        assert_eq!(level_for_scale(scale_for_level(10) * 1.5, 22), 9);
        assert_eq!(level_for_scale(1.0, 14), 14);
        assert_eq!(level_for_scale(0.0, 14), 0);
    }
}
