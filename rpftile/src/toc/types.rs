//! Data model produced by the Table-of-Contents parser.

use std::path::PathBuf;

use crate::frame::{Clut, DecodedFrame, SUBFRAME_GRID};

/// RPF map product family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    /// Compressed ARC digitized raster graphics (charts).
    Cadrg,
    /// Controlled image base (imagery).
    Cib,
}

/// Location of a frame's backing file, relative to the TOC directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePath {
    pub directory: PathBuf,
    pub filename: String,
}

/// One cell of a zone's frame grid.
///
/// At most one [`DecodedFrame`] is checked out per slot at a time; the
/// pager checks frames out with `Option::replace` and releases them with
/// `Option::take`. A slot with `exists == false` is never decoded.
#[derive(Debug, Default)]
pub struct FrameSlot {
    pub exists: bool,
    pub path: Option<FramePath>,
    pub clut: Option<Clut>,
    pub decoded: Option<DecodedFrame>,
}

/// One boundary-rectangle record: a geographic box covered by a grid of
/// frames at one scale.
#[derive(Debug)]
pub struct Zone {
    pub scale: String,
    pub product: ProductType,
    pub zone_id: char,
    pub nw_lat: f64,
    pub nw_lon: f64,
    pub sw_lat: f64,
    pub sw_lon: f64,
    pub ne_lat: f64,
    pub ne_lon: f64,
    pub se_lat: f64,
    pub se_lon: f64,
    /// Degrees per pixel, vertical / horizontal.
    pub vert_resolution: f64,
    pub horiz_resolution: f64,
    pub vert_interval: f64,
    pub horiz_interval: f64,
    /// Frame grid dimensions, fixed at parse time.
    pub rows: usize,
    pub cols: usize,
    /// Whether this record is renderable map imagery (CADRG/CIB) as
    /// opposed to a legend or overview product.
    pub is_map_image: bool,
    /// Directory the TOC was parsed from; frame paths are relative to it.
    pub source_dir: PathBuf,
    frames: Vec<FrameSlot>,
}

impl Zone {
    /// Construct a zone with an empty `rows × cols` frame grid.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        scale: impl Into<String>,
        product: ProductType,
        zone_id: char,
        corners: [f64; 8],
        resolutions: [f64; 2],
        intervals: [f64; 2],
        rows: usize,
        cols: usize,
        is_map_image: bool,
        source_dir: PathBuf,
    ) -> Self {
        let mut frames = Vec::with_capacity(rows * cols);
        frames.resize_with(rows * cols, FrameSlot::default);
        Self {
            scale: scale.into(),
            product,
            zone_id,
            nw_lat: corners[0],
            nw_lon: corners[1],
            sw_lat: corners[2],
            sw_lon: corners[3],
            ne_lat: corners[4],
            ne_lon: corners[5],
            se_lat: corners[6],
            se_lon: corners[7],
            vert_resolution: resolutions[0],
            horiz_resolution: resolutions[1],
            vert_interval: intervals[0],
            horiz_interval: intervals[1],
            rows,
            cols,
            is_map_image,
            source_dir,
            frames,
        }
    }

    /// Frame slot at grid position `(row, col)`.
    pub fn slot(&self, row: usize, col: usize) -> Option<&FrameSlot> {
        if row < self.rows && col < self.cols {
            self.frames.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Mutable frame slot at grid position `(row, col)`.
    pub fn slot_mut(&mut self, row: usize, col: usize) -> Option<&mut FrameSlot> {
        if row < self.rows && col < self.cols {
            self.frames.get_mut(row * self.cols + col)
        } else {
            None
        }
    }

    /// Whether a 256×256 tile coordinate falls inside this zone's
    /// frame grid (each frame covers 6×6 tiles).
    pub fn is_valid_tile(&self, tile_row: i64, tile_col: i64) -> bool {
        tile_row >= 0
            && tile_col >= 0
            && (tile_row as usize) < self.rows * SUBFRAME_GRID
            && (tile_col as usize) < self.cols * SUBFRAME_GRID
    }

    /// Whether `(lat, lon)` falls inside this zone's bounding box.
    ///
    /// Plain `sw..ne` comparison, exactly as the original source: zones
    /// crossing the antimeridian or covering a pole are not handled and
    /// will never match.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.sw_lat && lat <= self.ne_lat && lon >= self.sw_lon && lon <= self.ne_lon
    }
}

/// A parsed `A.TOC`: the zones discovered in one source directory.
///
/// Immutable structure after parse; only the per-slot CLUT and decoded
/// frame caches change afterwards. No pixel data is loaded at parse time.
#[derive(Debug, Default)]
pub struct TocFile {
    pub zones: Vec<Zone>,
}
