//! Multi-directory scale catalog.
//!
//! At load time every configured source directory's TOC is parsed, and
//! zones sharing an identical scale label are merged into one synthetic
//! [`TocFile`] per scale. Zoom in/out walks the resulting levels in a
//! fixed coarse-to-fine order, falling back to the nearest available
//! level when the requested one is absent.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::toc::{TocFile, TocParser};

/// Known scale labels ordered coarse to fine. CADRG chart scales first,
/// CIB ground resolutions after.
pub const SCALE_ORDER: [&str; 13] = [
    "1:16M", "1:8M", "1:4M", "1:2M", "1:1M", "1:500K", "1:250K", "1:100K", "1:50K", "1:25K",
    "1:12.5K", "10M", "5M",
];

/// One available scale level: all zones of that scale across every
/// source directory, merged into a synthetic TOC.
#[derive(Debug)]
pub struct ScaleLevel {
    pub scale: String,
    pub toc: TocFile,
}

/// Ordered set of available scale levels.
#[derive(Debug, Default)]
pub struct ScaleCatalog {
    levels: Vec<ScaleLevel>,
}

impl ScaleCatalog {
    /// Parse every source directory and merge zones by scale label.
    ///
    /// A directory whose TOC fails to parse contributes no zones; the
    /// failure is logged and the remaining directories still load.
    pub fn build(dirs: &[PathBuf]) -> ScaleCatalog {
        let mut tocs = Vec::new();
        for dir in dirs {
            match TocParser::parse(dir) {
                Ok(toc) => tocs.push(toc),
                Err(error) => {
                    warn!(dir = %dir.display(), %error, "skipping map source directory");
                }
            }
        }
        let catalog = Self::from_toc_files(tocs);
        info!(levels = catalog.levels.len(), "scale catalog built");
        catalog
    }

    /// Merge already-parsed TOC files into scale levels.
    pub fn from_toc_files(tocs: Vec<TocFile>) -> ScaleCatalog {
        let mut levels: Vec<ScaleLevel> = Vec::new();
        for toc in tocs {
            for zone in toc.zones {
                match levels.iter_mut().find(|level| level.scale == zone.scale) {
                    Some(level) => level.toc.zones.push(zone),
                    None => levels.push(ScaleLevel {
                        scale: zone.scale.clone(),
                        toc: TocFile { zones: vec![zone] },
                    }),
                }
            }
        }
        // Known labels in SCALE_ORDER position, unknown labels after in
        // discovery order.
        levels.sort_by_key(|level| scale_rank(&level.scale));
        ScaleCatalog { levels }
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[ScaleLevel] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&ScaleLevel> {
        self.levels.get(index)
    }

    pub fn level_mut(&mut self, index: usize) -> Option<&mut ScaleLevel> {
        self.levels.get_mut(index)
    }

    /// Index of the level with this exact scale label.
    pub fn find_scale(&self, scale: &str) -> Option<usize> {
        self.levels.iter().position(|level| level.scale == scale)
    }

    /// Level to use for a requested label: exact match, or the available
    /// level nearest in the fixed scale order.
    pub fn nearest_scale(&self, scale: &str) -> Option<usize> {
        if let Some(index) = self.find_scale(scale) {
            return Some(index);
        }
        let wanted = scale_rank(scale);
        (0..self.levels.len()).min_by_key(|&index| {
            let rank = scale_rank(&self.levels[index].scale);
            rank.abs_diff(wanted)
        })
    }

    /// One level finer than `from`, if available.
    pub fn zoom_in(&self, from: usize) -> Option<usize> {
        (from + 1 < self.levels.len()).then_some(from + 1)
    }

    /// One level coarser than `from`, if available.
    pub fn zoom_out(&self, from: usize) -> Option<usize> {
        from.checked_sub(1)
    }
}

/// Position of a scale label in the fixed order; unknown labels sort last.
fn scale_rank(scale: &str) -> usize {
    SCALE_ORDER
        .iter()
        .position(|&known| known == scale)
        .unwrap_or(SCALE_ORDER.len())
}

/// Convenience wrapper: build a catalog from one directory.
pub fn load_directory(dir: &Path) -> ScaleCatalog {
    ScaleCatalog::build(&[dir.to_path_buf()])
}
