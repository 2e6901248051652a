//! Color lookup table parsing and application.

use crate::reader::EndianReader;
use crate::rpf::{components, LocationTable, RpfHeader};

use super::DecodeError;

/// Validation caps carried over from the original format limits.
const MAX_OFFSET_RECORDS: u8 = 10;
const MAX_CONVERTER_RECORDS: u8 = 5;
const MAX_RECORD_LENGTH: u16 = 500;

/// Hard upper bound on loaded entries (216 colors + transparency).
const MAX_ENTRIES: usize = 217;

/// One RGB color entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
}

/// Which of the frame file's color tables to load.
///
/// CADRG frames carry a full-resolution 216-entry table plus reduced
/// 32- and 16-entry tables for distant rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClutSize {
    Colors216,
    Colors32,
    Colors16,
}

impl ClutSize {
    /// Minimum entry count of the matching offset record.
    ///
    /// CIB tables carry one extra transparency entry.
    fn wanted(self, is_cib: bool) -> usize {
        let base = match self {
            ClutSize::Colors216 => 216,
            ClutSize::Colors32 => 32,
            ClutSize::Colors16 => 16,
        };
        if is_cib {
            base + 1
        } else {
            base
        }
    }
}

/// A loaded color lookup table.
///
/// Loaded once per frame slot and cached for the slot's lifetime.
#[derive(Debug, Clone)]
pub struct Clut {
    entries: Vec<Rgb>,
}

impl Clut {
    /// A table with no entries; every index resolves to black.
    ///
    /// Used when a frame's color section fails to load.
    pub fn empty() -> Clut {
        Clut {
            entries: Vec::new(),
        }
    }

    /// Color for a palette index.
    ///
    /// Indices beyond the loaded table (including the 255 blank fill
    /// produced for masked subframes) resolve to black.
    pub fn get(&self, index: u8) -> Rgb {
        self.entries.get(index as usize).copied().unwrap_or(Rgb::BLACK)
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the color section of a frame file held in memory.
    pub fn load_bytes(data: &[u8], is_cib: bool, size: ClutSize) -> Result<Clut, DecodeError> {
        let header = RpfHeader::parse(data)?;
        let locations = LocationTable::parse(data, header.endian, header.location_offset as usize)?;
        Self::parse(data, &header, &locations, is_cib, size)
    }

    /// Parse the color section given an already-parsed header and
    /// location table.
    pub fn parse(
        data: &[u8],
        header: &RpfHeader,
        locations: &LocationTable,
        is_cib: bool,
        size: ClutSize,
    ) -> Result<Clut, DecodeError> {
        let section_offset = locations
            .offset(components::COLOR_GRAYSCALE_SECTION_SUBHEADER)
            .ok_or(DecodeError::MissingSection(
                components::COLOR_GRAYSCALE_SECTION_SUBHEADER,
            ))?;
        let colormap_offset = locations
            .offset(components::COLORMAP_SUBSECTION)
            .ok_or(DecodeError::MissingSection(components::COLORMAP_SUBSECTION))?;

        let mut reader = EndianReader::new(data, header.endian);
        reader.seek(section_offset);
        let offset_records = reader.read_u8()?;
        let converter_records = reader.read_u8()?;
        if offset_records == 0 || offset_records > MAX_OFFSET_RECORDS {
            return Err(DecodeError::BadColorTable(format!(
                "{} offset records (limit {})",
                offset_records, MAX_OFFSET_RECORDS
            )));
        }
        if converter_records > MAX_CONVERTER_RECORDS {
            return Err(DecodeError::BadColorTable(format!(
                "{} converter records (limit {})",
                converter_records, MAX_CONVERTER_RECORDS
            )));
        }

        reader.seek(colormap_offset);
        let table_offset = reader.read_u32()?;
        let record_length = reader.read_u16()?;
        if record_length > MAX_RECORD_LENGTH {
            return Err(DecodeError::BadColorTable(format!(
                "offset record length {} (limit {})",
                record_length, MAX_RECORD_LENGTH
            )));
        }

        // Pick the smallest table that satisfies the requested size.
        let wanted = size.wanted(is_cib);
        let mut best: Option<(u32, u8, u32)> = None; // (count, element length, offset)
        reader.seek(colormap_offset + table_offset as usize);
        for _ in 0..offset_records {
            let _table_id = reader.read_u16()?;
            let count = reader.read_u32()?;
            let element_length = reader.read_u8()?;
            let _histogram_length = reader.read_u16()?;
            let offset = reader.read_u32()?;
            if (count as usize) < wanted {
                continue;
            }
            if best.map(|(c, _, _)| count < c).unwrap_or(true) {
                best = Some((count, element_length, offset));
            }
        }
        let (count, element_length, offset) = best.ok_or_else(|| {
            DecodeError::BadColorTable(format!("no table with at least {} entries", wanted))
        })?;
        if element_length != 3 && element_length != 4 {
            return Err(DecodeError::BadColorTable(format!(
                "unsupported color element length {}",
                element_length
            )));
        }

        reader.seek(colormap_offset + offset as usize);
        let loaded = (count as usize).min(MAX_ENTRIES);
        let mut entries = Vec::with_capacity(loaded);
        for _ in 0..loaded {
            let raw = reader.read_bytes(element_length as usize)?;
            entries.push(Rgb {
                r: raw[0],
                g: raw[1],
                b: raw[2],
            });
        }
        Ok(Clut { entries })
    }
}
