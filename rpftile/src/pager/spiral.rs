//! Deterministic load order for the pager window.

/// Offsets of a `(2k+1)²` window in square-spiral order from the center.
///
/// Direction sequence is +col, −row, −col, +row with run lengths
/// 1, 1, 2, 2, 3, 3, …; positions outside the window (corner overshoot of
/// the outermost ring) are skipped.
pub(crate) fn spiral_offsets(radius: i64) -> Vec<(i64, i64)> {
    let size = (2 * radius + 1) as usize;
    let total = size * size;
    let mut out = Vec::with_capacity(total);
    out.push((0i64, 0i64));

    const DIRECTIONS: [(i64, i64); 4] = [(0, 1), (-1, 0), (0, -1), (1, 0)];
    let (mut row, mut col) = (0i64, 0i64);
    let mut direction = 0;
    let mut run = 1i64;
    while out.len() < total {
        for _ in 0..2 {
            let (dr, dc) = DIRECTIONS[direction];
            for _ in 0..run {
                row += dr;
                col += dc;
                if row.abs() <= radius && col.abs() <= radius {
                    out.push((row, col));
                    if out.len() == total {
                        return out;
                    }
                }
            }
            direction = (direction + 1) % 4;
        }
        run += 1;
    }
    out
}
