//! Frame file loading and VQ decompression.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::coord::TILE_SIZE;
use crate::reader::EndianReader;
use crate::rpf::{components, LocationTable, RpfHeader};

use super::{
    DecodeError, BLANK_INDEX, CODEBOOK_SIZE, MASK_ABSENT, SUBFRAME_BYTES, SUBFRAME_GRID,
};

/// One codebook entry: a 4×4 block of palette indices.
type CodeBlock = [[u8; 4]; 4];

/// A 256×256 tile of palette indices, the output of decompression.
pub type IndexTile = [[u8; TILE_SIZE]; TILE_SIZE];

/// Number of subframes in one frame.
const SUBFRAME_COUNT: usize = SUBFRAME_GRID * SUBFRAME_GRID;

/// Bytes in one raw codebook table (one block row for every codeword).
const CODEBOOK_TABLE_BYTES: usize = CODEBOOK_SIZE * 4;

/// Fallback distance from the compression section subheader to the
/// compression lookup subsection when the location table omits id 132.
const COMPRESSION_LOOKUP_FALLBACK: usize = 10;

/// Fallback distance from the image display parameters subheader to the
/// spatial data subsection when the location table omits id 143.
const SPATIAL_DATA_FALLBACK: usize = 14;

/// A fully loaded frame: codebook, subframe mask, and raw subframe data.
///
/// Owned exclusively by one `FrameSlot` while checked out; the pager
/// releases it back to the slot's empty state on eviction.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Codeword → 4×4 palette-index block.
    codebook: Vec<CodeBlock>,
    /// Raw compressed subframes in row-major order; masked entries are
    /// zero-filled and never read.
    subframes: Vec<[u8; SUBFRAME_BYTES]>,
    /// 36-bit bitmap, bit `row * 6 + col` set when that subframe is masked.
    masked: u64,
}

impl DecodedFrame {
    /// A frame with every subframe masked.
    ///
    /// Used when a backing file fails to load: decompression of a fully
    /// masked frame yields blank fill, never an error.
    pub fn fully_masked() -> Self {
        Self {
            codebook: Vec::new(),
            subframes: Vec::new(),
            masked: (1u64 << SUBFRAME_COUNT) - 1,
        }
    }

    /// Whether the subframe at local `(row, col)` is masked.
    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        if row >= SUBFRAME_GRID || col >= SUBFRAME_GRID {
            return true;
        }
        self.masked & (1u64 << (row * SUBFRAME_GRID + col)) != 0
    }

    /// Decompress the subframe covering absolute tile `(tile_row, tile_col)`.
    ///
    /// The tile coordinate is mapped to the local subframe via modulo 6.
    /// A masked (or never loaded) subframe yields a uniform
    /// [`BLANK_INDEX`] fill; this method never fails.
    pub fn decompress(&self, tile_row: usize, tile_col: usize) -> Box<IndexTile> {
        let sub_row = tile_row % SUBFRAME_GRID;
        let sub_col = tile_col % SUBFRAME_GRID;
        let mut out: Box<IndexTile> = Box::new([[BLANK_INDEX; TILE_SIZE]; TILE_SIZE]);
        if self.is_masked(sub_row, sub_col) {
            return out;
        }

        let raw = &self.subframes[sub_row * SUBFRAME_GRID + sub_col];
        let mut at = 0;
        // Each 3-byte group packs two 12-bit codewords whose 4×4 blocks
        // land side by side, so rows advance by 4 and columns by 8.
        for i in (0..TILE_SIZE).step_by(4) {
            for j in (0..TILE_SIZE).step_by(8) {
                let b0 = raw[at] as u16;
                let b1 = raw[at + 1] as u16;
                let b2 = raw[at + 2] as u16;
                at += 3;
                let left = &self.codebook[((b0 << 4) | (b1 >> 4)) as usize];
                let right = &self.codebook[(((b1 & 0x0F) << 8) | b2) as usize];
                for t in 0..4 {
                    for e in 0..4 {
                        out[i + t][j + e] = left[t][e];
                        out[i + t][j + 4 + e] = right[t][e];
                    }
                }
            }
        }
        out
    }
}

/// Loads CADRG frame files.
pub struct FrameDecoder;

impl FrameDecoder {
    /// Load a frame from its backing file.
    pub fn load(path: &Path) -> Result<DecodedFrame, DecodeError> {
        let data = fs::read(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => DecodeError::FileNotFound(path.to_path_buf()),
            _ => DecodeError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::load_bytes(&data)
    }

    /// Load a frame from an in-memory copy of its backing file.
    pub fn load_bytes(data: &[u8]) -> Result<DecodedFrame, DecodeError> {
        let header = RpfHeader::parse(data)?;
        let locations = LocationTable::parse(data, header.endian, header.location_offset as usize)?;
        let mut reader = EndianReader::new(data, header.endian);

        let compression_offset = locations
            .offset(components::COMPRESSION_SECTION_SUBHEADER)
            .ok_or(DecodeError::MissingSection(
                components::COMPRESSION_SECTION_SUBHEADER,
            ))?;
        let lookup_offset = locations
            .offset(components::COMPRESSION_LOOKUP_SUBSECTION)
            .unwrap_or(compression_offset + COMPRESSION_LOOKUP_FALLBACK);

        let codebook = read_codebook(&mut reader, lookup_offset)?;

        let description_offset = locations
            .offset(components::IMAGE_DESCRIPTION_SUBHEADER)
            .ok_or(DecodeError::MissingSection(
                components::IMAGE_DESCRIPTION_SUBHEADER,
            ))?;
        let display_offset = locations
            .offset(components::IMAGE_DISPLAY_PARAMETERS_SUBHEADER)
            .ok_or(DecodeError::MissingSection(
                components::IMAGE_DISPLAY_PARAMETERS_SUBHEADER,
            ))?;

        reader.seek(description_offset);
        let _spectral_groups = reader.read_u16()?;
        let _subframe_tables = reader.read_u16()?;
        let _spectral_band_tables = reader.read_u16()?;
        let _spectral_band_lines = reader.read_u16()?;
        let horiz_subframes = reader.read_u16()?;
        let vert_subframes = reader.read_u16()?;
        let _output_cols = reader.read_u32()?;
        let _output_rows = reader.read_u32()?;
        let mask_table_offset = reader.read_u32()?;
        let _transparency_offset = reader.read_u32()?;
        if horiz_subframes as usize != SUBFRAME_GRID || vert_subframes as usize != SUBFRAME_GRID {
            warn!(
                horiz = horiz_subframes,
                vert = vert_subframes,
                "unexpected subframe layout, treating as 6x6"
            );
        }

        let masked = if mask_table_offset == MASK_ABSENT {
            0
        } else {
            let mask_offset = locations
                .offset(components::MASK_SUBSECTION)
                .ok_or(DecodeError::MissingSection(components::MASK_SUBSECTION))?;
            reader.seek(mask_offset + mask_table_offset as usize);
            let mut bits = 0u64;
            for index in 0..SUBFRAME_COUNT {
                if reader.read_u32()? == MASK_ABSENT {
                    bits |= 1u64 << index;
                }
            }
            bits
        };

        let spatial_offset = locations
            .offset(components::SPATIAL_DATA_SUBSECTION)
            .unwrap_or(display_offset + SPATIAL_DATA_FALLBACK);
        reader.seek(spatial_offset);
        let mut subframes = vec![[0u8; SUBFRAME_BYTES]; SUBFRAME_COUNT];
        for (index, subframe) in subframes.iter_mut().enumerate() {
            if masked & (1u64 << index) != 0 {
                continue; // masked subframes are not present on disk
            }
            subframe.copy_from_slice(reader.read_bytes(SUBFRAME_BYTES)?);
        }

        Ok(DecodedFrame {
            codebook,
            subframes,
            masked,
        })
    }
}

/// Read the four codebook tables and transpose them into one
/// codeword → 4×4 block lookup (table `t` holds block row `t`).
fn read_codebook(
    reader: &mut EndianReader<'_>,
    subsection_start: usize,
) -> Result<Vec<CodeBlock>, DecodeError> {
    reader.seek(subsection_start);
    let table_offset = reader.read_u32()?;
    let _record_length = reader.read_u16()?;

    reader.seek(subsection_start + table_offset as usize);
    let mut table_offsets = [0usize; 4];
    for (index, slot) in table_offsets.iter_mut().enumerate() {
        let _table_id = reader.read_u16()?;
        let records = reader.read_u32()?;
        let values = reader.read_u16()?;
        let bits = reader.read_u16()?;
        let offset = reader.read_u32()?;
        if records as usize != CODEBOOK_SIZE || values != 4 || bits != 8 {
            return Err(DecodeError::BadCodebook {
                index,
                records,
                values,
                bits,
            });
        }
        *slot = offset as usize;
    }

    let mut codebook = vec![[[0u8; 4]; 4]; CODEBOOK_SIZE];
    for (row, &offset) in table_offsets.iter().enumerate() {
        reader.seek(subsection_start + offset);
        let table = reader.read_bytes(CODEBOOK_TABLE_BYTES)?;
        for (code, block) in codebook.iter_mut().enumerate() {
            block[row].copy_from_slice(&table[code * 4..code * 4 + 4]);
        }
    }
    Ok(codebook)
}
