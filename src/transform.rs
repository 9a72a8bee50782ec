//! Isometric coordinate transforms.
//!
//! Tile space is the integer grid; screen space is the unscaled pixel plane
//! before the camera applies pan/zoom/anchoring. Both directions are pure and
//! allocation-free.

/// Pixel metrics of a single tile: diamond width/height of the top face and
/// the vertical extrusion per height unit.
#[derive(Clone, Copy, Debug)]
pub struct TileMetrics {
    pub tile_w: f32,
    pub tile_h: f32,
    pub tile_depth: f32,
}

impl TileMetrics {
    /// Zero or negative metrics would divide by zero in the inverse transform;
    /// that is a programmer error and is rejected here, not tolerated per-frame.
    pub fn new(tile_w: f32, tile_h: f32, tile_depth: f32) -> Self {
        assert!(
            tile_w > 0.0 && tile_h > 0.0 && tile_depth > 0.0,
            "tile metrics must be positive, got {}x{} depth {}",
            tile_w,
            tile_h,
            tile_depth
        );
        Self {
            tile_w,
            tile_h,
            tile_depth,
        }
    }
}

impl Default for TileMetrics {
    fn default() -> Self {
        // Classic 2:1 diamond with half-height extrusion steps.
        Self::new(64.0, 32.0, 16.0)
    }
}

/// Project a tile coordinate (with optional height) to screen space.
///
/// The returned point is the top corner of the tile's diamond, horizontally
/// centered. The height term shifts the cell upward on screen without
/// affecting planar sort order.
pub fn tile_to_screen(m: &TileMetrics, tile_x: i32, tile_y: i32, tile_z: f32) -> (f32, f32) {
    let sx = (tile_x - tile_y) as f32 * (m.tile_w / 2.0);
    let sy = (tile_x + tile_y) as f32 * (m.tile_h / 2.0) - tile_z * m.tile_depth;
    (sx, sy)
}

/// Algebraic inverse of [`tile_to_screen`] at `tile_z = 0`.
///
/// For a point on a cell raised above the ground plane this returns the tile
/// *behind* the true one; callers that care about height must re-add the
/// height offset before inverting (see `picking`, which walks diagonal
/// candidates against known cell heights).
pub fn screen_to_tile(m: &TileMetrics, screen_x: f32, screen_y: f32) -> (i32, i32) {
    let a = screen_x / (m.tile_w / 2.0);
    let b = screen_y / (m.tile_h / 2.0);
    let tile_x = ((a + b) / 2.0).floor() as i32;
    let tile_y = ((b - a) / 2.0).floor() as i32;
    (tile_x, tile_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_over_grid() {
        let m = TileMetrics::default();
        for y in 0..40 {
            for x in 0..40 {
                let (sx, sy) = tile_to_screen(&m, x, y, 0.0);
                assert_eq!(screen_to_tile(&m, sx, sy), (x, y), "at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_round_trip_odd_metrics() {
        let m = TileMetrics::new(50.0, 26.0, 13.0);
        for y in -8..8 {
            for x in -8..8 {
                let (sx, sy) = tile_to_screen(&m, x, y, 0.0);
                assert_eq!(screen_to_tile(&m, sx, sy), (x, y));
            }
        }
    }

    #[test]
    fn test_height_shifts_up_only() {
        let m = TileMetrics::default();
        let (sx0, sy0) = tile_to_screen(&m, 5, 7, 0.0);
        let (sx2, sy2) = tile_to_screen(&m, 5, 7, 2.0);
        assert_eq!(sx0, sx2);
        assert_eq!(sy0 - sy2, 2.0 * m.tile_depth);
    }

    #[test]
    fn test_height_round_trip_with_readded_offset() {
        // Caller contract: re-add the height offset before inverting.
        let m = TileMetrics::default();
        let z = 3.0;
        let (sx, sy) = tile_to_screen(&m, 9, 4, z);
        assert_eq!(screen_to_tile(&m, sx, sy + z * m.tile_depth), (9, 4));
    }

    #[test]
    #[should_panic]
    fn test_zero_metrics_rejected() {
        TileMetrics::new(0.0, 32.0, 16.0);
    }
}
