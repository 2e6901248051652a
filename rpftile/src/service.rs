//! The consumer-facing map service.
//!
//! `MapService` owns the scale catalog, the active scale/zone selection,
//! and the tile pager, and exposes the surface a renderer drives: per-tick
//! `update`, pixel access, frame release, and zone/scale switching. It is
//! single-threaded by design; the renderer's update loop drives it
//! synchronously, and decoding is rate-limited to one tile per tick by
//! the pager.
//!
//! `ZoneSource` is the wiring between the pager and the decoder: it checks
//! frames out of a zone's slots (`Option::replace`), applies the slot's
//! cached color table, and releases frames on eviction (`Option::take`).

use std::fs;

use thiserror::Error;
use tracing::warn;

use crate::catalog::ScaleCatalog;
use crate::config::MapConfig;
use crate::coord::{self, TilePosition, TILE_SIZE};
use crate::frame::{Clut, ClutSize, DecodedFrame, FrameDecoder, SUBFRAME_GRID};
use crate::pager::{PagerError, TilePager, TilePixels, TileSource};
use crate::toc::{ProductType, Zone};

/// Errors from service construction and zone/scale switching.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No configured source directory produced any zones.
    #[error("no map data found in configured source directories")]
    NoData,

    /// Requested zone index does not exist at the active scale.
    #[error("no zone {index} at scale {scale}")]
    UnknownZone { index: usize, scale: String },

    /// Requested scale label matched no loaded level.
    #[error("unknown scale: {0}")]
    UnknownScale(String),

    /// Pager window configuration was invalid.
    #[error(transparent)]
    Pager(#[from] PagerError),
}

/// Adapts one [`Zone`] to the pager's [`TileSource`] seam.
pub struct ZoneSource<'a> {
    zone: &'a mut Zone,
}

impl<'a> ZoneSource<'a> {
    pub fn new(zone: &'a mut Zone) -> Self {
        Self { zone }
    }
}

impl TileSource for ZoneSource<'_> {
    fn is_valid(&self, tile_row: i64, tile_col: i64) -> bool {
        self.zone.is_valid_tile(tile_row, tile_col)
    }

    fn load(&mut self, tile_row: i64, tile_col: i64, pixels: &mut TilePixels) {
        let is_cib = self.zone.product == ProductType::Cib;
        let source_dir = self.zone.source_dir.clone();
        let frame_row = tile_row as usize / SUBFRAME_GRID;
        let frame_col = tile_col as usize / SUBFRAME_GRID;

        let slot = match self.zone.slot_mut(frame_row, frame_col) {
            Some(slot) if slot.exists => slot,
            _ => {
                // Coverage gap: a valid tile position with no frame file.
                pixels.fill(0);
                return;
            }
        };

        // One file read serves both the frame and its color table.
        let data = if slot.decoded.is_none() || slot.clut.is_none() {
            slot.path.as_ref().and_then(|path| {
                let full = source_dir.join(&path.directory).join(&path.filename);
                match fs::read(&full) {
                    Ok(bytes) => Some(bytes),
                    Err(error) => {
                        warn!(path = %full.display(), %error, "frame file unreadable");
                        None
                    }
                }
            })
        } else {
            None
        };

        let frame = slot.decoded.get_or_insert_with(|| {
            data.as_deref()
                .and_then(|bytes| match FrameDecoder::load_bytes(bytes) {
                    Ok(frame) => Some(frame),
                    Err(error) => {
                        warn!(frame_row, frame_col, %error, "frame load failed, treating as masked");
                        None
                    }
                })
                .unwrap_or_else(DecodedFrame::fully_masked)
        });
        let indices = frame.decompress(tile_row as usize, tile_col as usize);

        let clut = slot.clut.get_or_insert_with(|| {
            data.as_deref()
                .and_then(
                    |bytes| match Clut::load_bytes(bytes, is_cib, ClutSize::Colors216) {
                        Ok(clut) => Some(clut),
                        Err(error) => {
                            warn!(frame_row, frame_col, %error, "color table load failed");
                            None
                        }
                    },
                )
                .unwrap_or_else(Clut::empty)
        });

        for (i, index_row) in indices.iter().enumerate() {
            for (j, &index) in index_row.iter().enumerate() {
                let rgb = clut.get(index);
                let at = (i * TILE_SIZE + j) * 3;
                pixels[at] = rgb.r;
                pixels[at + 1] = rgb.g;
                pixels[at + 2] = rgb.b;
            }
        }
    }

    fn release(&mut self, tile_row: i64, tile_col: i64) {
        let frame_row = tile_row as usize / SUBFRAME_GRID;
        let frame_col = tile_col as usize / SUBFRAME_GRID;
        if let Some(slot) = self.zone.slot_mut(frame_row, frame_col) {
            // The CLUT stays cached for the slot's lifetime.
            slot.decoded.take();
        }
    }
}

/// Owner of the CADRG tile subsystem's outward surface.
#[derive(Debug)]
pub struct MapService {
    catalog: ScaleCatalog,
    scale_index: usize,
    zone_index: usize,
    pager: TilePager,
}

impl MapService {
    /// Build a service from configuration: parse every source directory
    /// and set up the pager.
    pub fn new(config: &MapConfig) -> Result<Self, ServiceError> {
        let catalog = ScaleCatalog::build(&config.source_dirs);
        Self::with_catalog(catalog, config)
    }

    /// Build a service over an already-constructed catalog.
    pub fn with_catalog(catalog: ScaleCatalog, config: &MapConfig) -> Result<Self, ServiceError> {
        if catalog.is_empty() {
            return Err(ServiceError::NoData);
        }
        let scale_index = config
            .scale
            .as_deref()
            .and_then(|scale| catalog.nearest_scale(scale))
            .unwrap_or(0);
        let pager = TilePager::new(config.window_size)?;
        Ok(Self {
            catalog,
            scale_index,
            zone_index: 0,
            pager,
        })
    }

    /// Label of the active scale level.
    pub fn active_scale(&self) -> &str {
        self.catalog
            .level(self.scale_index)
            .map(|level| level.scale.as_str())
            .unwrap_or("")
    }

    /// All available scale labels, coarse to fine.
    pub fn scales(&self) -> Vec<&str> {
        self.catalog
            .levels()
            .iter()
            .map(|level| level.scale.as_str())
            .collect()
    }

    /// Index of the active zone within the active scale level.
    pub fn active_zone_index(&self) -> usize {
        self.zone_index
    }

    /// The active zone, if the active level has one.
    pub fn active_zone(&self) -> Option<&Zone> {
        self.catalog
            .level(self.scale_index)?
            .toc
            .zones
            .get(self.zone_index)
    }

    /// Whether `(tile_row, tile_col)` is a valid frame position in the
    /// active zone. Callers must gate pager requests with this.
    pub fn is_valid_frame(&self, tile_row: i64, tile_col: i64) -> bool {
        self.active_zone()
            .map(|zone| zone.is_valid_tile(tile_row, tile_col))
            .unwrap_or(false)
    }

    /// Tile position of a geographic coordinate in the active zone.
    pub fn lat_lon_to_tile_row_col(&self, lat: f64, lon: f64) -> Option<TilePosition> {
        self.active_zone()
            .map(|zone| coord::lat_lon_to_tile(zone, lat, lon))
    }

    /// Pick the active zone from a reference point.
    ///
    /// Returns the selected zone index; the pager is flushed only when
    /// the zone actually changes.
    pub fn set_reference_point(&mut self, lat: f64, lon: f64) -> Option<usize> {
        let level = self.catalog.level(self.scale_index)?;
        let index = coord::find_best_zone(&level.toc, lat, lon)?;
        if index != self.zone_index {
            self.flush();
            self.zone_index = index;
        }
        Some(index)
    }

    /// Switch to a zone by index at the active scale, flushing the pager.
    pub fn set_zone(&mut self, zone_index: usize) -> Result<(), ServiceError> {
        let count = self
            .catalog
            .level(self.scale_index)
            .map(|level| level.toc.zones.len())
            .unwrap_or(0);
        if zone_index >= count {
            return Err(ServiceError::UnknownZone {
                index: zone_index,
                scale: self.active_scale().to_string(),
            });
        }
        self.flush();
        self.zone_index = zone_index;
        Ok(())
    }

    /// Switch to the level nearest the given scale label, flushing the
    /// pager.
    pub fn set_scale(&mut self, scale: &str) -> Result<(), ServiceError> {
        let index = self
            .catalog
            .nearest_scale(scale)
            .ok_or_else(|| ServiceError::UnknownScale(scale.to_string()))?;
        if index != self.scale_index {
            self.flush();
            self.scale_index = index;
            self.zone_index = 0;
        }
        Ok(())
    }

    /// Step one level finer, if available. Returns whether a switch
    /// happened.
    pub fn zoom_in(&mut self) -> bool {
        match self.catalog.zoom_in(self.scale_index) {
            Some(index) => {
                self.flush();
                self.scale_index = index;
                self.zone_index = 0;
                true
            }
            None => false,
        }
    }

    /// Step one level coarser, if available. Returns whether a switch
    /// happened.
    pub fn zoom_out(&mut self) -> bool {
        match self.catalog.zoom_out(self.scale_index) {
            Some(index) => {
                self.flush();
                self.scale_index = index;
                self.zone_index = 0;
                true
            }
            None => false,
        }
    }

    /// Track the viewpoint to a new center tile.
    ///
    /// At most one tile is decoded per call. An out-of-range center is a
    /// caller bug: hard assertion in debug builds, diagnostic and no-op
    /// in release.
    pub fn update(&mut self, center_row: i64, center_col: i64) {
        let Some(level) = self.catalog.level_mut(self.scale_index) else {
            return;
        };
        let Some(zone) = level.toc.zones.get_mut(self.zone_index) else {
            return;
        };
        if !zone.is_valid_tile(center_row, center_col) {
            debug_assert!(
                false,
                "update center ({center_row}, {center_col}) outside the active zone grid"
            );
            warn!(center_row, center_col, "rejected out-of-range update");
            return;
        }
        let mut source = ZoneSource::new(zone);
        self.pager.update(center_row, center_col, &mut source);
    }

    /// Pixels of a resident tile.
    pub fn get_pixels(&self, tile_row: i64, tile_col: i64) -> Option<&TilePixels> {
        if !self.is_valid_frame(tile_row, tile_col) {
            debug_assert!(
                false,
                "get_pixels ({tile_row}, {tile_col}) outside the active zone grid"
            );
            warn!(tile_row, tile_col, "rejected out-of-range pixel request");
            return None;
        }
        self.pager.get_pixels(tile_row, tile_col)
    }

    /// Release the decoded frame backing a tile.
    ///
    /// Called by the renderer once the tile's pixels have been uploaded;
    /// the pager's copy of the pixels stays resident.
    pub fn release_frame(&mut self, tile_row: i64, tile_col: i64) {
        let Some(level) = self.catalog.level_mut(self.scale_index) else {
            return;
        };
        let Some(zone) = level.toc.zones.get_mut(self.zone_index) else {
            return;
        };
        if !zone.is_valid_tile(tile_row, tile_col) {
            debug_assert!(
                false,
                "release_frame ({tile_row}, {tile_col}) outside the active zone grid"
            );
            warn!(tile_row, tile_col, "rejected out-of-range release");
            return;
        }
        ZoneSource::new(zone).release(tile_row, tile_col);
    }

    /// Evict every resident tile and release their backing frames.
    pub fn flush(&mut self) {
        let Some(level) = self.catalog.level_mut(self.scale_index) else {
            return;
        };
        let Some(zone) = level.toc.zones.get_mut(self.zone_index) else {
            return;
        };
        let mut source = ZoneSource::new(zone);
        self.pager.flush(&mut source);
    }

    /// Number of resident tiles (for diagnostics and tests).
    pub fn resident_tiles(&self) -> usize {
        self.pager.occupied()
    }
}
