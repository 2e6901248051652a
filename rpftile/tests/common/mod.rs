//! Synthetic RPF dataset builders for integration tests.
//!
//! These emit the same binary layout the parsers read: optional NITF
//! wrapper, RPF header, location section, and the component sections of
//! a TOC or frame file, in either byte order.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;

pub const SUBFRAME_BYTES: usize = 6144;
pub const SUBFRAME_COUNT: usize = 36;
pub const MASK_ABSENT: u32 = 0xFFFF_FFFF;

/// Endian-aware byte sink with offset patching.
pub struct Writer {
    buf: Vec<u8>,
    little: bool,
}

impl Writer {
    pub fn new(little: bool) -> Self {
        Self {
            buf: Vec::new(),
            little,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn u16(&mut self, value: u16) {
        let raw = if self.little {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        self.buf.extend_from_slice(&raw);
    }

    pub fn u32(&mut self, value: u32) {
        let raw = if self.little {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        self.buf.extend_from_slice(&raw);
    }

    pub fn f64(&mut self, value: f64) {
        let raw = if self.little {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        self.buf.extend_from_slice(&raw);
    }

    /// Space-padded fixed-width ASCII field.
    pub fn text(&mut self, value: &str, width: usize) {
        let mut bytes = value.as_bytes().to_vec();
        bytes.resize(width, b' ');
        self.buf.extend_from_slice(&bytes[..width]);
    }

    pub fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn pad(&mut self, n: usize) {
        self.buf.resize(self.buf.len() + n, 0);
    }

    /// Reserve a u32 slot to be patched later.
    pub fn reserve_u32(&mut self) -> usize {
        let at = self.buf.len();
        self.u32(0);
        at
    }

    pub fn patch_u32(&mut self, at: usize, value: u32) {
        let raw = if self.little {
            value.to_le_bytes()
        } else {
            value.to_be_bytes()
        };
        self.buf[at..at + 4].copy_from_slice(&raw);
    }
}

/// Write the RPF fixed header; returns the patch position of the
/// location-section offset field.
fn write_header(w: &mut Writer, filename: &str) -> usize {
    w.u8(if w.little { 0xFF } else { 0x00 });
    w.u16(48); // header section length
    w.text(filename, 12);
    w.u8(0); // update indicator
    w.text("MIL-STD-2411", 15);
    w.text("19941001", 8);
    w.text("U", 1);
    w.text("US", 2);
    w.text("  ", 2);
    w.reserve_u32()
}

/// Write a location section for the given component ids; returns the
/// patch positions of each component's offset field, in order.
fn write_location_section(w: &mut Writer, ids: &[u16]) -> Vec<usize> {
    w.u16(14 + ids.len() as u16 * 10); // section length
    w.u32(14); // component table offset, relative to section start
    w.u16(ids.len() as u16);
    w.u16(10); // record length
    w.u32(0); // aggregate length
    let mut patches = Vec::with_capacity(ids.len());
    for &id in ids {
        w.u16(id);
        w.u32(0); // component length
        patches.push(w.reserve_u32());
    }
    patches
}

/// One boundary rectangle for [`TocBuilder`].
pub struct ZoneSpec {
    pub kind: &'static str,
    pub scale: &'static str,
    pub zone_id: char,
    /// nw, sw, ne, se as (lat, lon).
    pub corners: [(f64, f64); 4],
    pub resolutions: (f64, f64),
    pub intervals: (f64, f64),
    pub rows: u32,
    pub cols: u32,
}

impl ZoneSpec {
    /// A 10°×10° CADRG zone at 1:250K with a given frame grid.
    pub fn cadrg(rows: u32, cols: u32) -> Self {
        Self {
            kind: "CADRG",
            scale: "1:250K",
            zone_id: '3',
            corners: [
                (40.0, -120.0),
                (30.0, -120.0),
                (40.0, -110.0),
                (30.0, -110.0),
            ],
            resolutions: (0.001, 0.001),
            intervals: (0.001, 0.001),
            rows,
            cols,
        }
    }

    pub fn with_scale(mut self, scale: &'static str) -> Self {
        self.scale = scale;
        self
    }
}

/// One frame-file index record for [`TocBuilder`].
pub struct FrameRecord {
    pub zone: u16,
    pub row: u16,
    pub col: u16,
    pub directory: &'static str,
    pub filename: &'static str,
}

/// Builds `A.TOC` images.
pub struct TocBuilder {
    pub little_endian: bool,
    pub nitf_wrapper: bool,
    pub zones: Vec<ZoneSpec>,
    pub frames: Vec<FrameRecord>,
    /// Component ids to omit from the location section.
    pub omit_sections: Vec<u16>,
}

impl TocBuilder {
    pub fn new() -> Self {
        Self {
            little_endian: false,
            nitf_wrapper: false,
            zones: Vec::new(),
            frames: Vec::new(),
            omit_sections: Vec::new(),
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer::new(self.little_endian);
        if self.nitf_wrapper {
            w.bytes(b"NITF02.10 filler");
            w.bytes(b"RPFHDR");
            w.pad(5); // header begins 11 bytes after the marker start
        }

        let location_patch = write_header(&mut w, "A.TOC");
        let location_start = w.len();
        w.patch_u32(location_patch, location_start as u32);

        let all_ids = [148u16, 149, 150, 151];
        let ids: Vec<u16> = all_ids
            .iter()
            .copied()
            .filter(|id| !self.omit_sections.contains(id))
            .collect();
        let patches = write_location_section(&mut w, &ids);
        let patch_for = |id: u16| ids.iter().position(|&i| i == id).map(|at| patches[at]);

        // Boundary section subheader.
        if let Some(p) = patch_for(148) {
            let at = w.len();
            w.patch_u32(p, at as u32);
        }
        w.u32(8); // boundary rectangle table offset
        w.u16(self.zones.len() as u16);
        w.u16(132); // record length

        // Boundary rectangle table.
        if let Some(p) = patch_for(149) {
            let at = w.len();
            w.patch_u32(p, at as u32);
        }
        for zone in &self.zones {
            w.text(zone.kind, 5);
            w.text("", 5); // compression ratio
            w.text(zone.scale, 12);
            w.text(&zone.zone_id.to_string(), 1);
            w.text("", 5); // producer
            for (lat, lon) in zone.corners {
                w.f64(lat);
                w.f64(lon);
            }
            w.f64(zone.resolutions.0);
            w.f64(zone.resolutions.1);
            w.f64(zone.intervals.0);
            w.f64(zone.intervals.1);
            w.u32(zone.rows);
            w.u32(zone.cols);
        }

        // Frame file index subheader.
        if let Some(p) = patch_for(150) {
            let at = w.len();
            w.patch_u32(p, at as u32);
        }
        w.u8(b'U');
        w.u32(0); // index table offset
        w.u32(self.frames.len() as u32);
        let dirs: Vec<&str> = {
            let mut seen = Vec::new();
            for frame in &self.frames {
                if !seen.contains(&frame.directory) {
                    seen.push(frame.directory);
                }
            }
            seen
        };
        w.u16(dirs.len() as u16);
        w.u16(22); // index record length

        // Frame file index subsection: records, then pathname records.
        let subsection_start = w.len();
        if let Some(p) = patch_for(151) {
            w.patch_u32(p, subsection_start as u32);
        }
        let mut pathname_patches = Vec::new();
        for frame in &self.frames {
            w.u16(frame.zone);
            w.u16(frame.row);
            w.u16(frame.col);
            pathname_patches.push((w.reserve_u32(), frame.directory));
            w.text(frame.filename, 12);
        }
        for dir in dirs {
            let offset = (w.len() - subsection_start) as u32;
            for &(patch, frame_dir) in &pathname_patches {
                if frame_dir == dir {
                    w.patch_u32(patch, offset);
                }
            }
            w.u16(dir.len() as u16);
            w.bytes(dir.as_bytes());
        }

        w.into_bytes()
    }

    pub fn write(&self, dir: &Path) {
        std::fs::write(dir.join("A.TOC"), self.build()).unwrap();
    }
}

/// Builds CADRG frame-file images.
pub struct FrameBuilder {
    pub little_endian: bool,
    /// Subframe indices (row * 6 + col) marked masked.
    pub masked: HashSet<usize>,
    /// Raw compressed subframe payloads for present subframes; missing
    /// entries default to all-zero codewords.
    pub subframes: Vec<(usize, Vec<u8>)>,
    /// Record count reported by each codebook descriptor.
    pub codebook_records: u32,
    /// Omit the compression lookup (132) and spatial data (143) location
    /// records, exercising the fixed-distance fallbacks.
    pub use_fallback_offsets: bool,
    /// Color table entries; defaults to 216 entries of (i, i, 255 - i).
    pub clut: Option<Vec<(u8, u8, u8)>>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self {
            little_endian: false,
            masked: HashSet::new(),
            subframes: Vec::new(),
            codebook_records: 4096,
            use_fallback_offsets: false,
            clut: None,
        }
    }

    pub fn all_masked() -> Self {
        let mut builder = Self::new();
        builder.masked = (0..SUBFRAME_COUNT).collect();
        builder
    }

    pub fn build(&self) -> Vec<u8> {
        let mut w = Writer::new(self.little_endian);
        let location_patch = write_header(&mut w, "0000001A.I41");
        let location_start = w.len();
        w.patch_u32(location_patch, location_start as u32);

        let mut ids = vec![131u16, 136, 137, 138, 134, 135];
        if !self.use_fallback_offsets {
            ids.insert(1, 132);
            ids.push(143);
        }
        let patches = write_location_section(&mut w, &ids);
        let patch_for = |id: u16| ids.iter().position(|&i| i == id).map(|at| patches[at]);
        let mark = |w: &mut Writer, p: Option<usize>| {
            let at = w.len();
            if let Some(p) = p {
                w.patch_u32(p, at as u32);
            }
            at
        };

        // Compression section subheader: 10 bytes so the fallback lookup
        // subsection lands right after it.
        mark(&mut w, patch_for(131));
        w.u16(1); // algorithm id
        w.u16(4); // lookup offset records
        w.u16(0); // parameter offset records
        w.pad(4);

        // Compression lookup subsection: offset table, 4 descriptors,
        // then the 4 codebook tables.
        let lookup_start = mark(&mut w, patch_for(132));
        w.u32(6); // descriptor table offset, relative to subsection
        w.u16(14); // descriptor record length
        let mut table_patches = Vec::new();
        for table in 0..4u16 {
            w.u16(table);
            w.u32(self.codebook_records);
            w.u16(4);
            w.u16(8);
            table_patches.push(w.reserve_u32());
        }
        for patch in table_patches {
            let offset = (w.len() - lookup_start) as u32;
            w.patch_u32(patch, offset);
            // Block row value for codeword c is the low byte of c.
            for code in 0..4096u32 {
                let fill = (code & 0xFF) as u8;
                w.bytes(&[fill; 4]);
            }
        }

        // Image description subheader.
        mark(&mut w, patch_for(136));
        w.u16(1); // spectral groups
        w.u16(1); // subframe tables
        w.u16(1); // spectral band tables
        w.u16(0); // spectral band lines
        w.u16(6); // horizontal subframes
        w.u16(6); // vertical subframes
        w.u32(1536);
        w.u32(1536);
        if self.masked.is_empty() {
            w.u32(MASK_ABSENT); // whole mask table absent
        } else {
            w.u32(8); // mask table offset within the mask subsection
        }
        w.u32(MASK_ABSENT); // transparency mask

        // Image display parameters subheader: 14 bytes so the fallback
        // spatial data subsection lands right after it.
        mark(&mut w, patch_for(137));
        w.pad(14);

        let write_mask = |w: &mut Writer| {
            mark(w, patch_for(138));
            w.pad(8);
            if !self.masked.is_empty() {
                for index in 0..SUBFRAME_COUNT {
                    if self.masked.contains(&index) {
                        w.u32(MASK_ABSENT);
                    } else {
                        w.u32(index as u32);
                    }
                }
            }
        };
        let write_spatial = |w: &mut Writer| {
            // Present subframes in row-major order; masked ones are
            // simply absent from disk.
            mark(w, patch_for(143));
            for index in 0..SUBFRAME_COUNT {
                if self.masked.contains(&index) {
                    continue;
                }
                match self.subframes.iter().find(|(at, _)| *at == index) {
                    Some((_, data)) => {
                        assert_eq!(data.len(), SUBFRAME_BYTES);
                        w.bytes(data);
                    }
                    None => w.pad(SUBFRAME_BYTES),
                }
            }
        };
        if self.use_fallback_offsets {
            // Spatial data must directly follow the display parameters
            // for the fixed-distance fallback to find it.
            write_spatial(&mut w);
            write_mask(&mut w);
        } else {
            write_mask(&mut w);
            write_spatial(&mut w);
        }

        // Color/grayscale section subheader.
        mark(&mut w, patch_for(134));
        w.u8(1); // offset records
        w.u8(0); // converter records
        w.text("", 12); // external color table filename

        // Colormap subsection.
        let colormap_start = mark(&mut w, patch_for(135));
        let entries = self
            .clut
            .clone()
            .unwrap_or_else(|| (0..216).map(|i| (i as u8, i as u8, (255 - i) as u8)).collect());
        w.u32(6); // offset table offset, relative to subsection
        w.u16(13); // offset record length
        w.u16(2); // table id
        w.u32(entries.len() as u32);
        w.u8(3); // element length
        w.u16(0); // histogram record length
        let entries_patch = w.reserve_u32();
        let offset = (w.len() - colormap_start) as u32;
        w.patch_u32(entries_patch, offset);
        for (r, g, b) in entries {
            w.bytes(&[r, g, b]);
        }

        w.into_bytes()
    }
}

/// A subframe payload whose first 3-byte group encodes the two given
/// codewords; the rest decode to codeword zero.
pub fn subframe_with_leading_codewords(hi: u16, lo: u16) -> Vec<u8> {
    let mut data = vec![0u8; SUBFRAME_BYTES];
    data[0] = (hi >> 4) as u8;
    data[1] = (((hi & 0x0F) << 4) | (lo >> 8)) as u8;
    data[2] = (lo & 0xFF) as u8;
    data
}
