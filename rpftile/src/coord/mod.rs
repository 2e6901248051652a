//! Coordinate conversion and zone lookup.
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and the pixel/tile grid of a CADRG zone, plus selection of the zone
//! covering a reference point. A zone's pixel grid originates at its
//! northwest corner; tiles are fixed 256×256-pixel units.

use crate::toc::{TocFile, Zone};

/// Edge length of a decoded tile in pixels.
pub const TILE_SIZE: usize = 256;

/// A tile coordinate with the pixel offset inside that tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePosition {
    pub tile_row: i64,
    pub tile_col: i64,
    pub pixel_row: u32,
    pub pixel_col: u32,
}

/// Convert geographic coordinates to fractional pixel coordinates in a
/// zone's grid.
///
/// Row grows southward from the zone's northwest latitude, column grows
/// eastward from its northwest longitude, one interval unit per pixel.
#[inline]
pub fn lat_lon_to_pixel(zone: &Zone, lat: f64, lon: f64) -> (f64, f64) {
    let row = (zone.nw_lat - lat) / zone.vert_interval;
    let col = (lon - zone.nw_lon) / zone.horiz_interval;
    (row, col)
}

/// Convert pixel coordinates to a tile coordinate plus in-tile offset.
#[inline]
pub fn pixel_to_tile(row: f64, col: f64) -> TilePosition {
    let row = row.floor() as i64;
    let col = col.floor() as i64;
    let edge = TILE_SIZE as i64;
    TilePosition {
        tile_row: row.div_euclid(edge),
        tile_col: col.div_euclid(edge),
        pixel_row: row.rem_euclid(edge) as u32,
        pixel_col: col.rem_euclid(edge) as u32,
    }
}

/// Convert geographic coordinates directly to a tile position.
#[inline]
pub fn lat_lon_to_tile(zone: &Zone, lat: f64, lon: f64) -> TilePosition {
    let (row, col) = lat_lon_to_pixel(zone, lat, lon);
    pixel_to_tile(row, col)
}

/// Convert a tile position back to the geographic coordinates of the
/// addressed pixel.
#[inline]
pub fn tile_to_lat_lon(zone: &Zone, position: &TilePosition) -> (f64, f64) {
    let row = position.tile_row as f64 * TILE_SIZE as f64 + position.pixel_row as f64;
    let col = position.tile_col as f64 * TILE_SIZE as f64 + position.pixel_col as f64;
    let lat = zone.nw_lat - row * zone.vert_interval;
    let lon = zone.nw_lon + col * zone.horiz_interval;
    (lat, lon)
}

/// Find the first zone whose bounding box contains `(lat, lon)` and whose
/// `is_map_image` flag is set.
///
/// Inherits the plain box test of [`Zone::contains`], including its lack
/// of antimeridian handling.
pub fn find_best_zone(toc: &TocFile, lat: f64, lon: f64) -> Option<usize> {
    toc.zones
        .iter()
        .position(|zone| zone.is_map_image && zone.contains(lat, lon))
}
