//! Info command: list the scales and zones of a dataset.

use std::path::PathBuf;

use rpftile::catalog::ScaleCatalog;

use crate::error::CliError;

/// Run the info command over one or more dataset directories.
pub fn run(dirs: Vec<PathBuf>) -> Result<(), CliError> {
    let catalog = ScaleCatalog::build(&dirs);
    if catalog.is_empty() {
        return Err(CliError::Dataset(
            "no A.TOC found in the given directories".to_string(),
        ));
    }

    for level in catalog.levels() {
        println!("{}", level.scale);
        for (index, zone) in level.toc.zones.iter().enumerate() {
            let frames = (0..zone.rows)
                .flat_map(|row| (0..zone.cols).map(move |col| (row, col)))
                .filter(|&(row, col)| zone.slot(row, col).map(|s| s.exists).unwrap_or(false))
                .count();
            println!(
                "  zone {} [{}]: {}x{} frames ({} present), lat {:.3}..{:.3}, lon {:.3}..{:.3}{}",
                index,
                zone.zone_id,
                zone.rows,
                zone.cols,
                frames,
                zone.sw_lat,
                zone.ne_lat,
                zone.sw_lon,
                zone.ne_lon,
                if zone.is_map_image { "" } else { " (non-map)" },
            );
        }
    }
    Ok(())
}
