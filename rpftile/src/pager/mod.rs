//! The tile pager: a bounded, spatially coherent cache of decoded tiles.
//!
//! The pager owns an odd `(2k+1) × (2k+1)` window of tile slots indexed
//! by signed offset from a moving center. On each update it evicts tiles
//! that scrolled off-window, carries over tiles that remain in-window,
//! and decodes at most one new tile, walking the window in a square
//! spiral from the center. The one-decode-per-update limit is the
//! system's backpressure against render stutter.
//!
//! The pager never touches files itself: it is wired at construction time
//! to a [`TileSource`] that performs validity checks, decoding, and
//! release of backing frames.

mod spiral;

use thiserror::Error;
use tracing::debug;

use crate::coord::TILE_SIZE;
use spiral::spiral_offsets;

/// Bytes in one decoded RGB tile.
pub const TILE_BYTES: usize = TILE_SIZE * TILE_SIZE * 3;

/// A decoded RGB pixel buffer for one tile.
pub type TilePixels = [u8; TILE_BYTES];

/// Backing store the pager loads from and releases to.
///
/// Implemented by `ZoneSource` in production; tests substitute a mock to
/// observe eviction and load behavior.
pub trait TileSource {
    /// Whether `(tile_row, tile_col)` is a valid position in the source.
    fn is_valid(&self, tile_row: i64, tile_col: i64) -> bool;

    /// Decode the tile into `pixels`.
    ///
    /// Must not fail: unavailable data degrades to blank fill.
    fn load(&mut self, tile_row: i64, tile_col: i64, pixels: &mut TilePixels);

    /// Release backing resources for an evicted tile.
    fn release(&mut self, tile_row: i64, tile_col: i64);
}

/// One resident tile: a pixel buffer plus the coordinate it represents.
#[derive(Debug)]
pub struct TileHandle {
    pixels: Box<TilePixels>,
    tile_row: i64,
    tile_col: i64,
}

impl TileHandle {
    fn blank() -> Self {
        Self {
            pixels: Box::new([0u8; TILE_BYTES]),
            tile_row: 0,
            tile_col: 0,
        }
    }

    pub fn pixels(&self) -> &TilePixels {
        &self.pixels
    }

    pub fn position(&self) -> (i64, i64) {
        (self.tile_row, self.tile_col)
    }
}

/// Errors from pager construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PagerError {
    /// The window must be an odd, positive number of tiles across.
    #[error("window size must be odd and positive, got {0}")]
    InvalidWindowSize(usize),
}

/// Fixed-capacity cache of decoded tiles around a moving center.
///
/// Invariant at all times: `occupied() + free_count() == capacity()`.
#[derive(Debug)]
pub struct TilePager {
    radius: i64,
    size: usize,
    table: Vec<Option<TileHandle>>,
    free: Vec<TileHandle>,
    center: Option<(i64, i64)>,
}

impl TilePager {
    /// Create a pager with a `window_size × window_size` window.
    pub fn new(window_size: usize) -> Result<Self, PagerError> {
        if window_size == 0 || window_size % 2 == 0 {
            return Err(PagerError::InvalidWindowSize(window_size));
        }
        let capacity = window_size * window_size;
        let mut table = Vec::with_capacity(capacity);
        table.resize_with(capacity, || None);
        let mut free = Vec::with_capacity(capacity);
        free.resize_with(capacity, TileHandle::blank);
        Ok(Self {
            radius: (window_size as i64 - 1) / 2,
            size: window_size,
            table,
            free,
            center: None,
        })
    }

    /// Window edge length in tiles.
    pub fn window_size(&self) -> usize {
        self.size
    }

    /// Total slot count, `(2k+1)²`.
    pub fn capacity(&self) -> usize {
        self.size * self.size
    }

    /// Number of resident tiles.
    pub fn occupied(&self) -> usize {
        self.table.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of handles in the free pool.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Current window center, if any update has run.
    pub fn center(&self) -> Option<(i64, i64)> {
        self.center
    }

    fn index(&self, dr: i64, dc: i64) -> usize {
        ((dr + self.radius) as usize) * self.size + (dc + self.radius) as usize
    }

    fn in_window(&self, dr: i64, dc: i64) -> bool {
        dr.abs() <= self.radius && dc.abs() <= self.radius
    }

    /// Track the viewpoint to `(center_row, center_col)`.
    ///
    /// Evicts tiles that fall off-window, reuses tiles that remain, and
    /// decodes at most one new tile per call.
    pub fn update(&mut self, center_row: i64, center_col: i64, source: &mut dyn TileSource) {
        let new_center = (center_row, center_col);
        match self.center {
            None => self.center = Some(new_center),
            Some(old) if old == new_center => {}
            Some(_) => self.shift(new_center, source),
        }
        self.load_one(center_row, center_col, source);
    }

    /// Free pass and reuse pass: rebuild the table around a new center.
    fn shift(&mut self, new_center: (i64, i64), source: &mut dyn TileSource) {
        let capacity = self.capacity();
        let mut next: Vec<Option<TileHandle>> = Vec::with_capacity(capacity);
        next.resize_with(capacity, || None);

        let mut evicted = 0usize;
        let mut reused = 0usize;
        for slot in std::mem::take(&mut self.table) {
            if let Some(handle) = slot {
                let dr = handle.tile_row - new_center.0;
                let dc = handle.tile_col - new_center.1;
                if self.in_window(dr, dc) {
                    let index = self.index(dr, dc);
                    next[index] = Some(handle);
                    reused += 1;
                } else {
                    source.release(handle.tile_row, handle.tile_col);
                    self.free.push(handle);
                    evicted += 1;
                }
            }
        }
        self.table = next;
        self.center = Some(new_center);
        debug!(evicted, reused, center = ?new_center, "pager window shifted");
    }

    /// Load pass: decode at most one tile, nearest empty slot first.
    fn load_one(&mut self, center_row: i64, center_col: i64, source: &mut dyn TileSource) {
        for (dr, dc) in spiral_offsets(self.radius) {
            let index = self.index(dr, dc);
            if self.table[index].is_some() {
                continue;
            }
            let tile_row = center_row + dr;
            let tile_col = center_col + dc;
            if !source.is_valid(tile_row, tile_col) {
                continue;
            }
            // The capacity invariant guarantees a free handle whenever a
            // slot is empty.
            if let Some(mut handle) = self.free.pop() {
                source.load(tile_row, tile_col, &mut handle.pixels);
                handle.tile_row = tile_row;
                handle.tile_col = tile_col;
                self.table[index] = Some(handle);
            }
            return;
        }
    }

    /// Pixels of the resident tile at `(tile_row, tile_col)`, if loaded.
    pub fn get_pixels(&self, tile_row: i64, tile_col: i64) -> Option<&TilePixels> {
        let (center_row, center_col) = self.center?;
        let dr = tile_row - center_row;
        let dc = tile_col - center_col;
        if !self.in_window(dr, dc) {
            return None;
        }
        self.table[self.index(dr, dc)]
            .as_ref()
            .filter(|handle| handle.position() == (tile_row, tile_col))
            .map(|handle| handle.pixels())
    }

    /// Unconditionally evict every resident tile.
    ///
    /// Used on zone or scale change; synchronous and uninterruptible.
    pub fn flush(&mut self, source: &mut dyn TileSource) {
        for slot in self.table.iter_mut() {
            if let Some(handle) = slot.take() {
                source.release(handle.tile_row, handle.tile_col);
                self.free.push(handle);
            }
        }
        self.center = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Mock source: everything inside a bounded grid is valid; records
    /// loads and releases.
    struct MockSource {
        rows: i64,
        cols: i64,
        loads: Vec<(i64, i64)>,
        releases: Vec<(i64, i64)>,
    }

    impl MockSource {
        fn new(rows: i64, cols: i64) -> Self {
            Self {
                rows,
                cols,
                loads: Vec::new(),
                releases: Vec::new(),
            }
        }
    }

    impl TileSource for MockSource {
        fn is_valid(&self, tile_row: i64, tile_col: i64) -> bool {
            (0..self.rows).contains(&tile_row) && (0..self.cols).contains(&tile_col)
        }

        fn load(&mut self, tile_row: i64, tile_col: i64, pixels: &mut TilePixels) {
            self.loads.push((tile_row, tile_col));
            pixels[0] = tile_row as u8;
            pixels[1] = tile_col as u8;
        }

        fn release(&mut self, tile_row: i64, tile_col: i64) {
            self.releases.push((tile_row, tile_col));
        }
    }

    fn assert_invariant(pager: &TilePager) {
        assert_eq!(pager.occupied() + pager.free_count(), pager.capacity());
    }

    #[test]
    fn test_rejects_even_or_zero_window() {
        assert_eq!(
            TilePager::new(0).unwrap_err(),
            PagerError::InvalidWindowSize(0)
        );
        assert_eq!(
            TilePager::new(4).unwrap_err(),
            PagerError::InvalidWindowSize(4)
        );
        assert!(TilePager::new(5).is_ok());
    }

    #[test]
    fn test_at_most_one_load_per_update() {
        let mut pager = TilePager::new(5).unwrap();
        let mut source = MockSource::new(100, 100);
        pager.update(50, 50, &mut source);
        assert_eq!(source.loads.len(), 1);
        pager.update(50, 50, &mut source);
        assert_eq!(source.loads.len(), 2);
        assert_invariant(&pager);
    }

    #[test]
    fn test_first_load_is_center_then_spiral() {
        let mut pager = TilePager::new(3).unwrap();
        let mut source = MockSource::new(100, 100);
        pager.update(50, 50, &mut source);
        assert_eq!(source.loads, vec![(50, 50)]);
        pager.update(50, 50, &mut source);
        assert_eq!(source.loads[1], (50, 51)); // +col first
        pager.update(50, 50, &mut source);
        assert_eq!(source.loads[2], (49, 51)); // then -row
    }

    #[test]
    fn test_capacity_invariant_over_random_walks() {
        use rand::Rng;
        let mut rng = rand::rng();
        for k in 1..=4usize {
            let size = 2 * k + 1;
            let mut pager = TilePager::new(size).unwrap();
            let mut source = MockSource::new(200, 200);
            let (mut row, mut col) = (100i64, 100i64);
            for _ in 0..100 {
                row = (row + rng.random_range(-2..=2)).clamp(0, 199);
                col = (col + rng.random_range(-2..=2)).clamp(0, 199);
                pager.update(row, col, &mut source);
                assert_invariant(&pager);
            }
        }
    }

    #[test]
    fn test_no_op_move_keeps_residents() {
        let mut pager = TilePager::new(3).unwrap();
        let mut source = MockSource::new(100, 100);
        for _ in 0..9 {
            pager.update(50, 50, &mut source);
        }
        assert_eq!(pager.occupied(), 9);
        let loads_before = source.loads.len();

        pager.update(50, 50, &mut source);
        assert!(source.releases.is_empty());
        // Window is full: no load either.
        assert_eq!(source.loads.len(), loads_before);
        assert_invariant(&pager);
    }

    #[test]
    fn test_single_axis_shift_evicts_trailing_edge() {
        for k in 1..=4i64 {
            let size = (2 * k + 1) as usize;
            let mut pager = TilePager::new(size).unwrap();
            let mut source = MockSource::new(200, 200);
            // Fill the whole window.
            for _ in 0..size * size {
                pager.update(100, 100, &mut source);
            }
            assert_eq!(pager.occupied(), size * size);
            source.loads.clear();

            pager.update(100, 101, &mut source);
            // Exactly the trailing column falls off.
            assert_eq!(source.releases.len(), size);
            assert!(source
                .releases
                .iter()
                .all(|&(_, c)| c == 100 - k));
            // The rest were carried over and stay readable.
            assert_eq!(pager.occupied(), size * size - size + 1);
            assert!(pager.get_pixels(100, 101).is_some());
            assert_invariant(&pager);
        }
    }

    #[test]
    fn test_evicted_tiles_are_released_exactly_once() {
        let mut pager = TilePager::new(3).unwrap();
        let mut source = MockSource::new(200, 200);
        for _ in 0..9 {
            pager.update(100, 100, &mut source);
        }
        pager.update(110, 110, &mut source);
        // Whole window scrolled off: all 9 released, none twice.
        assert_eq!(source.releases.len(), 9);
        let unique: HashSet<_> = source.releases.iter().collect();
        assert_eq!(unique.len(), 9);
        assert_invariant(&pager);
    }

    #[test]
    fn test_skips_invalid_positions() {
        let mut pager = TilePager::new(3).unwrap();
        // Only one valid tile in the source.
        let mut source = MockSource::new(1, 1);
        pager.update(0, 0, &mut source);
        assert_eq!(source.loads, vec![(0, 0)]);
        // Every remaining window position is invalid: nothing more loads.
        pager.update(0, 0, &mut source);
        assert_eq!(source.loads.len(), 1);
        assert_invariant(&pager);
    }

    #[test]
    fn test_get_pixels_contents() {
        let mut pager = TilePager::new(3).unwrap();
        let mut source = MockSource::new(100, 100);
        pager.update(7, 9, &mut source);
        let pixels = pager.get_pixels(7, 9).unwrap();
        assert_eq!(pixels[0], 7);
        assert_eq!(pixels[1], 9);
        assert!(pager.get_pixels(7, 10).is_none());
        assert!(pager.get_pixels(99, 99).is_none());
    }

    #[test]
    fn test_flush_releases_everything() {
        let mut pager = TilePager::new(5).unwrap();
        let mut source = MockSource::new(100, 100);
        for _ in 0..12 {
            pager.update(50, 50, &mut source);
        }
        let occupied = pager.occupied();
        pager.flush(&mut source);
        assert_eq!(source.releases.len(), occupied);
        assert_eq!(pager.occupied(), 0);
        assert_eq!(pager.free_count(), pager.capacity());
        assert_eq!(pager.center(), None);
    }
}
