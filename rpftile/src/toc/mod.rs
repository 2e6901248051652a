//! Table-of-Contents (`A.TOC`) parsing.
//!
//! The TOC lists the boundary rectangles (zones) of an RPF dataset and
//! the on-disk location of every frame file. Parsing is pure file
//! discovery: it produces a fully structured [`TocFile`] with zero pixel
//! data loaded.

mod types;

pub use types::{FramePath, FrameSlot, ProductType, TocFile, Zone};

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::reader::{EndianReader, ReadError};
use crate::rpf::{components, LocationTable, RpfHeader};

/// Fixed length of a frame filename in the frame-file index.
const FRAME_FILENAME_LEN: usize = 12;

/// Validation cap on a zone's frame grid along either axis, carried over
/// from the original format limits. A boundary record past it is corrupt.
const MAX_FRAME_GRID: u32 = 4096;

/// Errors that can occur while parsing an `A.TOC`.
///
/// A failure is fatal to the directory only: a source directory whose TOC
/// fails to parse contributes no zones.
#[derive(Debug, Error)]
pub enum TocError {
    /// Neither `A.TOC` nor `a.toc` exists in the directory.
    #[error("no A.TOC or a.toc in {0}")]
    FileNotFound(PathBuf),

    /// I/O error while reading the TOC.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A mandatory component id is missing from the location section.
    #[error("mandatory section {0} missing from TOC location table")]
    MissingSection(u16),

    /// A boundary record declares a frame grid beyond the format's
    /// validation limits.
    #[error("boundary record frame grid {rows}x{cols} exceeds limit {limit}")]
    BadFrameGrid { rows: u32, cols: u32, limit: u32 },

    /// A frame-file index record points outside its zone's grid, or at a
    /// zone that does not exist.
    #[error("frame index record out of range: zone {zone}, frame ({row}, {col})")]
    BadFrameCoordinate { zone: usize, row: u32, col: u32 },

    /// Two frame-file index records target the same `(zone, row, col)`.
    #[error("duplicate frame record: zone {zone}, frame ({row}, {col})")]
    DuplicateFrameRecord { zone: usize, row: u32, col: u32 },

    /// A binary field read ran past the end of the file.
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Parses `A.TOC` files into [`TocFile`] trees.
pub struct TocParser;

impl TocParser {
    /// Parse the TOC in `dir`, trying `A.TOC` then lowercase `a.toc`.
    pub fn parse(dir: &Path) -> Result<TocFile, TocError> {
        let upper = dir.join("A.TOC");
        let lower = dir.join("a.toc");
        let path = if upper.is_file() {
            upper
        } else if lower.is_file() {
            lower
        } else {
            return Err(TocError::FileNotFound(dir.to_path_buf()));
        };
        let data = std::fs::read(&path).map_err(|source| TocError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse_bytes(&data, dir)
    }

    /// Parse TOC bytes; `dir` becomes the zones' source directory.
    pub fn parse_bytes(data: &[u8], dir: &Path) -> Result<TocFile, TocError> {
        let header = RpfHeader::parse(data)?;
        let locations = LocationTable::parse(data, header.endian, header.location_offset as usize)?;

        let require = |id: u16| locations.offset(id).ok_or(TocError::MissingSection(id));
        let boundary_subheader = require(components::BOUNDARY_SECTION_SUBHEADER)?;
        let boundary_table = require(components::BOUNDARY_RECTANGLE_TABLE)?;
        let index_subheader = require(components::FRAME_FILE_INDEX_SUBHEADER)?;
        let index_subsection = require(components::FRAME_FILE_INDEX_SUBSECTION)?;

        let mut reader = EndianReader::new(data, header.endian);

        // Boundary section subheader: record count for the table below.
        reader.seek(boundary_subheader);
        let _table_offset = reader.read_u32()?;
        let zone_count = reader.read_u16()?;
        let _record_length = reader.read_u16()?;

        let mut zones = Vec::with_capacity(zone_count as usize);
        reader.seek(boundary_table);
        for _ in 0..zone_count {
            zones.push(read_boundary_record(&mut reader, dir)?);
        }

        // Frame-file index subheader: record count and stride.
        reader.seek(index_subheader);
        let _security = reader.read_u8()?;
        let _index_table_offset = reader.read_u32()?;
        let record_count = reader.read_u32()?;
        let _pathname_count = reader.read_u16()?;
        let record_length = reader.read_u16()?;

        for record in 0..record_count as usize {
            reader.seek(index_subsection + record * record_length as usize);
            let zone_index = reader.read_u16()? as usize;
            let row = reader.read_u16()? as u32;
            let col = reader.read_u16()? as u32;
            let pathname_offset = reader.read_u32()?;
            let filename = reader.read_str(FRAME_FILENAME_LEN)?;

            let zone = zones.get_mut(zone_index).ok_or(TocError::BadFrameCoordinate {
                zone: zone_index,
                row,
                col,
            })?;
            if row as usize >= zone.rows || col as usize >= zone.cols {
                return Err(TocError::BadFrameCoordinate {
                    zone: zone_index,
                    row,
                    col,
                });
            }

            // Pathname record: length-prefixed directory, offset relative
            // to the start of the index subsection.
            reader.seek(index_subsection + pathname_offset as usize);
            let dir_len = reader.read_u16()? as usize;
            let mut directory = reader.read_str(dir_len)?;
            if let Some(stripped) = directory.strip_prefix("./") {
                directory = stripped.to_string();
            }

            let slot = zone
                .slot_mut(row as usize, col as usize)
                .ok_or(TocError::BadFrameCoordinate {
                    zone: zone_index,
                    row,
                    col,
                })?;
            if slot.path.is_some() {
                return Err(TocError::DuplicateFrameRecord {
                    zone: zone_index,
                    row,
                    col,
                });
            }
            slot.exists = true;
            slot.path = Some(FramePath {
                directory: PathBuf::from(directory),
                filename,
            });
        }

        debug!(
            zones = zones.len(),
            frames = record_count,
            dir = %dir.display(),
            "parsed TOC"
        );
        Ok(TocFile { zones })
    }
}

/// Read one boundary-rectangle record at the current cursor position.
fn read_boundary_record(reader: &mut EndianReader<'_>, dir: &Path) -> Result<Zone, TocError> {
    let kind = reader.read_str(5)?;
    reader.skip(5); // compression ratio
    let scale = reader.read_str(12)?;
    let zone_id = reader.read_str(1)?.chars().next().unwrap_or(' ');
    reader.skip(5); // producer

    let mut doubles = [0f64; 12];
    for value in doubles.iter_mut() {
        *value = reader.read_f64()?;
    }
    let rows = reader.read_u32()?;
    let cols = reader.read_u32()?;
    // The slot grid is allocated eagerly; reject corrupt counts before
    // they turn into a huge allocation.
    if rows > MAX_FRAME_GRID || cols > MAX_FRAME_GRID {
        return Err(TocError::BadFrameGrid {
            rows,
            cols,
            limit: MAX_FRAME_GRID,
        });
    }

    let product = if kind.starts_with("CADRG") {
        ProductType::Cadrg
    } else {
        ProductType::Cib
    };
    let is_map_image = kind.starts_with("CADRG") || kind.starts_with("CIB");

    Ok(Zone::new(
        scale,
        product,
        zone_id,
        [
            doubles[0], doubles[1], doubles[2], doubles[3], doubles[4], doubles[5], doubles[6],
            doubles[7],
        ],
        [doubles[8], doubles[9]],
        [doubles[10], doubles[11]],
        rows as usize,
        cols as usize,
        is_map_image,
        dir.to_path_buf(),
    ))
}
