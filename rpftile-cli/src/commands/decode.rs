//! Decode command: expand one frame file to a PNG.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use rpftile::frame::{Clut, ClutSize, FrameDecoder, SUBFRAME_GRID};
use rpftile::TILE_SIZE;
use tracing::info;

use crate::error::CliError;

/// Arguments for the decode command.
pub struct DecodeArgs {
    pub frame: PathBuf,
    pub output: Option<PathBuf>,
    /// Treat the frame as CIB imagery (grayscale color table).
    pub cib: bool,
}

/// Run the decode command: the full 6×6 subframe grid becomes a
/// 1536×1536 image.
pub fn run(args: DecodeArgs) -> Result<(), CliError> {
    let data = fs::read(&args.frame)?;
    let frame = FrameDecoder::load_bytes(&data)?;
    let clut = Clut::load_bytes(&data, args.cib, ClutSize::Colors216)?;

    let edge = (SUBFRAME_GRID * TILE_SIZE) as u32;
    let mut out = RgbImage::new(edge, edge);
    for sub_row in 0..SUBFRAME_GRID {
        for sub_col in 0..SUBFRAME_GRID {
            let tile = frame.decompress(sub_row, sub_col);
            for (i, index_row) in tile.iter().enumerate() {
                for (j, &index) in index_row.iter().enumerate() {
                    let rgb = clut.get(index);
                    let x = (sub_col * TILE_SIZE + j) as u32;
                    let y = (sub_row * TILE_SIZE + i) as u32;
                    out.put_pixel(x, y, image::Rgb([rgb.r, rgb.g, rgb.b]));
                }
            }
        }
    }

    let output = args
        .output
        .unwrap_or_else(|| default_output(&args.frame));
    out.save(&output)?;
    info!(output = %output.display(), "frame decoded");
    println!("Wrote {}", output.display());
    Ok(())
}

/// Default output path: the frame filename with a `.png` extension.
fn default_output(frame: &Path) -> PathBuf {
    frame.with_extension("png")
}
