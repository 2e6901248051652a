//! CADRG frame file decoding.
//!
//! A frame file covers a 6×6 grid of subframes, each a 256×256-pixel tile
//! compressed with vector quantization: 12-bit codewords index a
//! 4096-entry codebook of 4×4 palette-index blocks, and a color lookup
//! table maps palette indices to RGB. [`FrameDecoder`] loads the codebook,
//! subframe mask, and raw subframe data; [`DecodedFrame::decompress`]
//! expands one subframe to palette indices; [`Clut`] supplies the colors.

mod clut;
mod decoder;

pub use clut::{Clut, ClutSize, Rgb};
pub use decoder::{DecodedFrame, FrameDecoder, IndexTile};

use std::path::PathBuf;

use thiserror::Error;

use crate::reader::ReadError;

/// Subframes per frame along each axis.
pub const SUBFRAME_GRID: usize = 6;

/// Compressed size of one subframe: 64×64 codewords at 12 bits each.
pub const SUBFRAME_BYTES: usize = 6144;

/// Number of codewords in the VQ codebook.
pub const CODEBOOK_SIZE: usize = 4096;

/// Palette index used to fill masked or unavailable subframes.
pub const BLANK_INDEX: u8 = 255;

/// Sentinel marking a masked subframe (or a wholly absent mask table).
pub const MASK_ABSENT: u32 = 0xFFFF_FFFF;

/// Errors that can occur while loading a frame file.
///
/// These are fatal to the frame only: the pager degrades a frame that
/// fails to load to fully masked instead of propagating further.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame's backing file does not exist or could not be opened.
    #[error("frame file not found: {0}")]
    FileNotFound(PathBuf),

    /// I/O error while reading the backing file.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mandatory component id is missing from the location section.
    #[error("mandatory section {0} missing from frame location table")]
    MissingSection(u16),

    /// A codebook descriptor does not describe a 4096×4×8-bit table.
    #[error(
        "bad codebook descriptor {index}: {records} records × {values} values × {bits}-bit"
    )]
    BadCodebook {
        index: usize,
        records: u32,
        values: u16,
        bits: u16,
    },

    /// The color section is missing or malformed.
    #[error("bad color lookup table: {0}")]
    BadColorTable(String),

    /// A binary field read ran past the end of the file.
    #[error(transparent)]
    Read(#[from] ReadError),
}
