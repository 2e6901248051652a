//! RPF container plumbing shared by the TOC and frame parsers.
//!
//! Every RPF file (the `A.TOC` and each frame file) starts with the same
//! machinery: an optional NITF wrapper whose `RPFHDR` marker locates the
//! real header, a fixed header ending in the offset of the location
//! section, and a location section mapping numeric component ids to
//! physical offsets within the file. The component ids themselves come
//! from MIL-STD-2411.

use crate::reader::{Endian, EndianReader, ReadError};

/// Location-section component ids used by this subsystem.
pub mod components {
    pub const COMPRESSION_SECTION_SUBHEADER: u16 = 131;
    pub const COMPRESSION_LOOKUP_SUBSECTION: u16 = 132;
    pub const COLOR_GRAYSCALE_SECTION_SUBHEADER: u16 = 134;
    pub const COLORMAP_SUBSECTION: u16 = 135;
    pub const IMAGE_DESCRIPTION_SUBHEADER: u16 = 136;
    pub const IMAGE_DISPLAY_PARAMETERS_SUBHEADER: u16 = 137;
    pub const MASK_SUBSECTION: u16 = 138;
    pub const SPATIAL_DATA_SUBSECTION: u16 = 143;
    pub const BOUNDARY_SECTION_SUBHEADER: u16 = 148;
    pub const BOUNDARY_RECTANGLE_TABLE: u16 = 149;
    pub const FRAME_FILE_INDEX_SUBHEADER: u16 = 150;
    pub const FRAME_FILE_INDEX_SUBSECTION: u16 = 151;
}

/// ASCII marker identifying the RPF header inside a NITF container.
pub const RPF_HEADER_MARKER: &[u8] = b"RPFHDR";

/// How far into the file the NITF wrapper scan looks for the marker.
pub const NITF_SCAN_WINDOW: usize = 1024;

/// Distance from the start of the marker to the start of the real header.
pub const NITF_MARKER_SKIP: usize = 11;

/// Locate the RPF header within `data`.
///
/// Scans the first [`NITF_SCAN_WINDOW`] bytes for [`RPF_HEADER_MARKER`];
/// if found, the header begins [`NITF_MARKER_SKIP`] bytes past the marker
/// start. Bare RPF files without a NITF wrapper start at byte 0.
pub fn header_start(data: &[u8]) -> usize {
    let window = &data[..data.len().min(NITF_SCAN_WINDOW)];
    window
        .windows(RPF_HEADER_MARKER.len())
        .position(|w| w == RPF_HEADER_MARKER)
        .map(|off| off + NITF_MARKER_SKIP)
        .unwrap_or(0)
}

/// Fixed RPF header fields needed downstream.
///
/// The header also carries an update indicator, country code, and release
/// marking; those are skipped, not stored.
#[derive(Debug, Clone)]
pub struct RpfHeader {
    pub endian: Endian,
    pub filename: String,
    pub spec_number: String,
    pub spec_date: String,
    pub security_class: String,
    /// Absolute file offset of the location section.
    pub location_offset: u32,
}

impl RpfHeader {
    /// Parse the RPF header, handling an optional NITF wrapper.
    pub fn parse(data: &[u8]) -> Result<RpfHeader, ReadError> {
        let start = header_start(data);
        let indicator = *data.get(start).ok_or(ReadError::UnexpectedEof {
            offset: start,
            wanted: 1,
            available: 0,
        })?;
        let endian = Endian::from_indicator(indicator);

        let mut reader = EndianReader::new(data, endian);
        reader.seek(start + 1);
        let _header_length = reader.read_u16()?;
        let filename = reader.read_str(12)?;
        reader.skip(1); // new/replacement/update indicator
        let spec_number = reader.read_str(15)?;
        let spec_date = reader.read_str(8)?;
        let security_class = reader.read_str(1)?;
        reader.skip(2); // country code
        reader.skip(2); // release marking
        let location_offset = reader.read_u32()?;

        Ok(RpfHeader {
            endian,
            filename,
            spec_number,
            spec_date,
            security_class,
            location_offset,
        })
    }
}

/// One entry of the location-section component directory.
#[derive(Debug, Clone, Copy)]
pub struct LocationRecord {
    pub id: u16,
    pub length: u32,
    /// Absolute file offset of the component.
    pub offset: u32,
}

/// Directory of `(component id, physical offset)` pairs.
#[derive(Debug, Clone)]
pub struct LocationTable {
    records: Vec<LocationRecord>,
}

impl LocationTable {
    /// Parse the location section starting at `section_start`.
    pub fn parse(
        data: &[u8],
        endian: Endian,
        section_start: usize,
    ) -> Result<LocationTable, ReadError> {
        let mut reader = EndianReader::new(data, endian);
        reader.seek(section_start);
        let _section_length = reader.read_u16()?;
        let table_offset = reader.read_u32()?;
        let count = reader.read_u16()?;
        let _record_length = reader.read_u16()?;
        let _aggregate_length = reader.read_u32()?;

        reader.seek(section_start + table_offset as usize);
        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let id = reader.read_u16()?;
            let length = reader.read_u32()?;
            let offset = reader.read_u32()?;
            records.push(LocationRecord { id, length, offset });
        }
        Ok(LocationTable { records })
    }

    /// Physical offset of a component, if present.
    pub fn offset(&self, id: u16) -> Option<usize> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.offset as usize)
    }

    /// All parsed records, in file order.
    pub fn records(&self) -> &[LocationRecord] {
        &self.records
    }
}
