use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use structures::{RasterImage, WIRE_SIDE};

use crate::errors::WireError;

pub const GRID_SIDE: u32 = WIRE_SIDE;

/// Packed size of a grid: one bit per cell.
pub const PAYLOAD_LEN: usize = (GRID_SIDE * GRID_SIDE / 8) as usize;

const BYTES_PER_ROW: usize = GRID_SIDE as usize / 8;

/// A 64x64 on/off grid in the client's packed layout.
///
/// Cell `(x, y)` is bit `7 - x % 8` (most significant first) of byte
/// `y * 8 + x / 8`, so each row is 8 consecutive bytes and rows run top to
/// bottom.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitGrid {
    bytes: [u8; PAYLOAD_LEN],
}

impl std::fmt::Debug for BitGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitGrid")
            .field("ink_cells", &self.ink_cells())
            .finish()
    }
}

impl Default for BitGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl BitGrid {
    pub fn new() -> Self {
        Self {
            bytes: [0; PAYLOAD_LEN],
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        let bytes: [u8; PAYLOAD_LEN] = bytes.try_into().map_err(|_| WireError::Length {
            expected: PAYLOAD_LEN,
            actual: bytes.len(),
        })?;

        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; PAYLOAD_LEN] {
        &self.bytes
    }

    fn locate(x: u32, y: u32) -> (usize, u8) {
        assert!(
            x < GRID_SIDE && y < GRID_SIDE,
            "cell ({x}, {y}) out of bounds"
        );
        let byte = y as usize * BYTES_PER_ROW + x as usize / 8;
        let mask = 1 << (7 - x % 8);
        (byte, mask)
    }

    /// Panics if `(x, y)` is outside the grid.
    pub fn get(&self, x: u32, y: u32) -> bool {
        let (byte, mask) = Self::locate(x, y);
        self.bytes[byte] & mask != 0
    }

    /// Panics if `(x, y)` is outside the grid.
    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        let (byte, mask) = Self::locate(x, y);
        if on {
            self.bytes[byte] |= mask;
        } else {
            self.bytes[byte] &= !mask;
        }
    }

    pub fn ink_cells(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Set cells become full ink (255), the rest background.
    pub fn to_raster(&self) -> RasterImage {
        RasterImage::from_fn(GRID_SIDE, |x, y| if self.get(x, y) { u8::MAX } else { 0 })
    }

    /// Packs a 64x64 image, setting every cell at or above `threshold`.
    pub fn from_raster(image: &RasterImage, threshold: u8) -> Result<Self, WireError> {
        if image.side() != GRID_SIDE {
            return Err(WireError::Side {
                expected: GRID_SIDE,
                actual: image.side(),
            });
        }

        let mut grid = Self::new();
        for (y, row) in image.rows().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                if value >= threshold {
                    grid.set(x as u32, y as u32, true);
                }
            }
        }

        Ok(grid)
    }

    /// Paints like the drawing client does while the pointer moves from
    /// `prev` to `point`: evenly spaced points roughly every 1.4 cells along
    /// the segment, each stamped with a `brush x brush` square whose top left
    /// corner is `brush / 2` cells up and left of the point. Cells outside
    /// the grid are ignored.
    pub fn paint_segment(&mut self, point: (i32, i32), prev: Option<(i32, i32)>, brush: u32) {
        let brush = i64::from(brush);
        if self.stamp((i64::from(point.0), i64::from(point.1)), brush) {
            return;
        }

        let Some(prev) = prev else {
            return;
        };
        let dx = f64::from(prev.0) - f64::from(point.0);
        let dy = f64::from(prev.1) - f64::from(point.1);
        let steps = ((dx * dx + dy * dy).sqrt() / 1.4).floor();

        // the client draws nothing extra for a zero-length step
        if steps < 1.0 {
            return;
        }

        // only walk the stretch of the segment whose stamps can reach the grid
        let margin = brush as f64 + 1.0;
        let (lo, hi) = (-margin, f64::from(GRID_SIDE) + margin);
        let origin = (f64::from(point.0), f64::from(point.1));
        let (Some((x_from, x_to)), Some((y_from, y_to))) = (
            reach(origin.0, dx / steps, lo, hi),
            reach(origin.1, dy / steps, lo, hi),
        ) else {
            return;
        };

        let mut t = x_from.max(y_from).max(0.0).floor();
        let last = x_to.min(y_to).min(steps).ceil();
        while t <= last {
            let x = (origin.0 + t * dx / steps).floor() as i64;
            let y = (origin.1 + t * dy / steps).floor() as i64;
            if self.stamp((x, y), brush) {
                return;
            }
            t += 1.0;
        }
    }

    /// Sets the `brush x brush` square around `(px, py)`. Returns `true` once
    /// the square covers the whole grid.
    fn stamp(&mut self, (px, py): (i64, i64), brush: i64) -> bool {
        let side = i64::from(GRID_SIDE);
        let (x0, y0) = (px - brush / 2, py - brush / 2);

        for x in x0.max(0)..(x0 + brush).min(side) {
            for y in y0.max(0)..(y0 + brush).min(side) {
                self.set(x as u32, y as u32, true);
            }
        }

        x0 <= 0 && y0 <= 0 && x0 + brush >= side && y0 + brush >= side
    }
}

/// Range of `t` for which `origin + t * rate` stays within `lo..=hi`.
fn reach(origin: f64, rate: f64, lo: f64, hi: f64) -> Option<(f64, f64)> {
    if rate == 0.0 {
        return (lo..=hi)
            .contains(&origin)
            .then_some((f64::NEG_INFINITY, f64::INFINITY));
    }

    let (a, b) = ((lo - origin) / rate, (hi - origin) / rate);
    Some((a.min(b), a.max(b)))
}

/// Decodes a base64 payload into a grid. Surrounding whitespace is ignored;
/// the decoded payload must be exactly [`PAYLOAD_LEN`] bytes.
pub fn decode_payload(payload: &str) -> Result<BitGrid, WireError> {
    let bytes = STANDARD.decode(payload.trim())?;
    debug!("decoded {} payload bytes", bytes.len());
    BitGrid::from_bytes(&bytes)
}

pub fn encode_payload(grid: &BitGrid) -> String {
    STANDARD.encode(grid.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_layout_is_msb_first_row_major() {
        let mut grid = BitGrid::new();
        grid.set(0, 0, true);
        grid.set(9, 1, true);
        grid.set(63, 63, true);

        assert_eq!(grid.as_bytes()[0], 0b1000_0000);
        assert_eq!(grid.as_bytes()[9], 0b0100_0000);
        assert_eq!(grid.as_bytes()[PAYLOAD_LEN - 1], 0b0000_0001);
        assert_eq!(grid.ink_cells(), 3);

        grid.set(9, 1, false);
        assert!(!grid.get(9, 1));
        assert_eq!(grid.ink_cells(), 2);
    }

    #[test]
    fn to_raster_uses_full_ink() {
        let mut grid = BitGrid::new();
        grid.set(5, 2, true);

        let image = grid.to_raster();
        assert_eq!(image.side(), 64);
        assert_eq!(image.pixel(5, 2), 255);
        assert_eq!(image.pixel(2, 5), 0);
        assert_eq!(image.ink_pixels(), 1);
    }

    #[test]
    fn from_raster_needs_the_wire_side() {
        let image = RasterImage::from_pixels(28, vec![0; 28 * 28]).unwrap();
        assert_eq!(
            BitGrid::from_raster(&image, 128),
            Err(WireError::Side {
                expected: 64,
                actual: 28
            })
        );
    }

    #[test]
    fn single_point_stamps_the_brush() {
        let mut grid = BitGrid::new();
        grid.paint_segment((10, 20), None, 2);

        for (x, y) in [(9, 19), (10, 19), (9, 20), (10, 20)] {
            assert!(grid.get(x, y), "({x}, {y}) not painted");
        }
        assert_eq!(grid.ink_cells(), 4);
    }

    #[test]
    fn brush_is_clipped_at_the_edge() {
        let mut grid = BitGrid::new();
        grid.paint_segment((0, 0), None, 2);
        assert_eq!(grid.ink_cells(), 1);
        assert!(grid.get(0, 0));

        grid.paint_segment((70, 70), None, 2);
        assert_eq!(grid.ink_cells(), 1);
    }

    #[test]
    fn segment_is_continuous() {
        let mut grid = BitGrid::new();
        grid.paint_segment((40, 10), Some((10, 10)), 2);

        for x in 9..=40 {
            assert!(grid.get(x, 10), "gap at x = {x}");
        }
        assert!(!grid.get(45, 10));
        assert!(!grid.get(20, 30));
    }

    #[test]
    fn zero_length_segment_paints_the_point() {
        let mut grid = BitGrid::new();
        grid.paint_segment((30, 30), Some((30, 30)), 2);
        assert_eq!(grid.ink_cells(), 4);
    }

    #[test]
    fn extreme_coordinates_paint_only_the_visible_stretch() {
        let mut grid = BitGrid::new();
        grid.paint_segment((i32::MAX, i32::MAX), Some((i32::MIN, i32::MIN)), 2);

        for k in [0, 10, 32, 50, 63] {
            assert!(grid.get(k, k), "diagonal gap at {k}");
        }
        assert!(!grid.get(50, 10));
        assert!(!grid.get(10, 50));

        let mut grid = BitGrid::new();
        grid.paint_segment((i32::MIN, 0), Some((i32::MAX, 0)), 3);
        assert!(grid.get(0, 0) && grid.get(63, 1));
        assert!(!grid.get(30, 2));
    }

    #[test]
    fn oversized_brush_fills_the_grid() {
        let mut grid = BitGrid::new();
        grid.paint_segment((5, 5), Some((i32::MIN, i32::MAX)), u32::MAX);
        assert_eq!(grid.ink_cells(), (GRID_SIDE * GRID_SIDE) as usize);
    }
}
