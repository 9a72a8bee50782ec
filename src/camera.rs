//! Camera state: pan offset, uniform zoom, and the canvas anchor.
//!
//! Pan is applied as additive pointer-drag deltas so successive small drags
//! compose losslessly; zoom is a direct clamped scalar set. Purely reactive
//! state, no inertia.

use crate::transform::{self, TileMetrics};

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;

/// Horizontal anchor: map origin centered in the canvas.
const ANCHOR_X: f32 = 0.5;
/// Vertical anchor at a quarter of the canvas, not half: a map centered at
/// the origin renders mostly below the top third of the viewport, leaving
/// headroom for tall extruded tiles.
const ANCHOR_Y: f32 = 0.25;

#[derive(Clone, Debug)]
pub struct Camera {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
    pub metrics: TileMetrics,
}

impl Camera {
    pub fn new(metrics: TileMetrics) -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            metrics,
        }
    }

    /// Apply a pointer-drag delta to the pan offset.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Set the zoom scale, clamped to the supported range. The invariant
    /// `scale > 0` therefore always holds.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn zoom_by(&mut self, factor: f32) {
        self.set_scale(self.scale * factor);
    }

    /// Map an unscaled screen-space point to canvas pixels.
    pub fn world_to_canvas(
        &self,
        screen_x: f32,
        screen_y: f32,
        canvas_w: f32,
        canvas_h: f32,
    ) -> (f32, f32) {
        (
            screen_x * self.scale + self.offset_x + canvas_w * ANCHOR_X,
            screen_y * self.scale + self.offset_y + canvas_h * ANCHOR_Y,
        )
    }

    /// Inverse of [`world_to_canvas`].
    pub fn canvas_to_world(
        &self,
        canvas_x: f32,
        canvas_y: f32,
        canvas_w: f32,
        canvas_h: f32,
    ) -> (f32, f32) {
        (
            (canvas_x - self.offset_x - canvas_w * ANCHOR_X) / self.scale,
            (canvas_y - self.offset_y - canvas_h * ANCHOR_Y) / self.scale,
        )
    }

    /// Full pipeline: tile coordinate (with height) to canvas pixels.
    pub fn tile_to_canvas(
        &self,
        tile_x: i32,
        tile_y: i32,
        tile_z: f32,
        canvas_w: f32,
        canvas_h: f32,
    ) -> (f32, f32) {
        let (sx, sy) = transform::tile_to_screen(&self.metrics, tile_x, tile_y, tile_z);
        self.world_to_canvas(sx, sy, canvas_w, canvas_h)
    }
}
