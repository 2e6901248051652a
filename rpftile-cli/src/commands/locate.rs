//! Locate command: map a geographic coordinate to a zone and tile.

use std::path::PathBuf;

use rpftile::catalog::ScaleCatalog;
use rpftile::coord::{self, TilePosition};
use rpftile::frame::SUBFRAME_GRID;

use crate::error::CliError;

/// Arguments for the locate command.
pub struct LocateArgs {
    pub dirs: Vec<PathBuf>,
    pub lat: f64,
    pub lon: f64,
    pub scale: Option<String>,
}

/// Run the locate command.
pub fn run(args: LocateArgs) -> Result<(), CliError> {
    let catalog = ScaleCatalog::build(&args.dirs);
    if catalog.is_empty() {
        return Err(CliError::Dataset(
            "no A.TOC found in the given directories".to_string(),
        ));
    }

    let level_index = match args.scale.as_deref() {
        Some(scale) => catalog
            .nearest_scale(scale)
            .ok_or_else(|| CliError::Usage(format!("unknown scale: {scale}")))?,
        None => 0,
    };
    let level = catalog
        .level(level_index)
        .ok_or_else(|| CliError::Dataset("catalog has no levels".to_string()))?;

    let zone_index = coord::find_best_zone(&level.toc, args.lat, args.lon).ok_or_else(|| {
        CliError::Dataset(format!(
            "({}, {}) is not covered at scale {}",
            args.lat, args.lon, level.scale
        ))
    })?;
    let zone = &level.toc.zones[zone_index];
    let position = coord::lat_lon_to_tile(zone, args.lat, args.lon);

    println!("Scale: {}", level.scale);
    println!("Zone:  {} [{}]", zone_index, zone.zone_id);
    println!(
        "Tile:  ({}, {}) pixel ({}, {})",
        position.tile_row, position.tile_col, position.pixel_row, position.pixel_col
    );
    let (frame_row, frame_col) = frame_cell(&position);
    match zone.slot(frame_row as usize, frame_col as usize) {
        Some(slot) if slot.exists => {
            if let Some(path) = &slot.path {
                println!(
                    "Frame: {}",
                    zone.source_dir.join(&path.directory).join(&path.filename).display()
                );
            }
        }
        _ => println!("Frame: (no coverage)"),
    }
    Ok(())
}

/// Frame grid cell covering a tile position.
fn frame_cell(position: &TilePosition) -> (i64, i64) {
    let edge = SUBFRAME_GRID as i64;
    (position.tile_row / edge, position.tile_col / edge)
}
