//! Render order and compositing.
//!
//! Every frame is a full repaint of a single raster surface: sky gradient,
//! then each visible layer back-to-front in painter's order, then the object
//! pass, then an optional debug grid. Per-cell data faults (out-of-range tile
//! ids) are skipped rather than raised so the frame loop stays live.

use crate::camera::Camera;
use crate::grid::Grid;
use crate::layers::{LayerData, LayerStack, ObjectKind, PlacedObject};
use crate::tiles::{TerrainKind, TileCatalog};
use crate::tileset::Tileset;

const SKY_TOP: [u8; 3] = [24, 30, 56];
const SKY_BOTTOM: [u8; 3] = [96, 140, 186];
const SHADOW_ALPHA: f32 = 0.35;
const GRID_COLOR: [u8; 3] = [240, 240, 200];

/// The raster surface: a `0RGB` u32 buffer sized to the canvas.
pub struct Frame {
    pub width: usize,
    pub height: usize,
    buffer: Vec<u32>,
}

impl Frame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            buffer: vec![0; width * height],
        }
    }

    /// Recreate the buffer for new canvas dimensions. Safe between any two
    /// frames; the next composite fully repaints it.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.buffer = vec![0; width * height];
        }
    }

    pub fn buffer(&self) -> &[u32] {
        &self.buffer
    }

    /// Clear to a vertical sky gradient.
    pub fn clear_sky(&mut self) {
        for y in 0..self.height {
            let t = if self.height > 1 {
                y as f32 / (self.height - 1) as f32
            } else {
                0.0
            };
            let color = pack(lerp_color(SKY_TOP, SKY_BOTTOM, t));
            let row = y * self.width;
            self.buffer[row..row + self.width].fill(color);
        }
    }

    fn blend_px(&mut self, x: i32, y: i32, color: [u8; 3], alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if alpha >= 1.0 {
            self.buffer[idx] = pack(color);
            return;
        }
        let dst = unpack(self.buffer[idx]);
        let blended = [
            lerp_u8(dst[0], color[0], alpha),
            lerp_u8(dst[1], color[1], alpha),
            lerp_u8(dst[2], color[2], alpha),
        ];
        self.buffer[idx] = pack(blended);
    }

    fn draw_line(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, color: [u8; 3], alpha: f32) {
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as i32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = (x0 + (x1 - x0) * t).round() as i32;
            let y = (y0 + (y1 - y0) * t).round() as i32;
            self.blend_px(x, y, color, alpha);
        }
    }
}

fn pack(c: [u8; 3]) -> u32 {
    ((c[0] as u32) << 16) | ((c[1] as u32) << 8) | c[2] as u32
}

fn unpack(v: u32) -> [u8; 3] {
    [(v >> 16) as u8, (v >> 8) as u8, v as u8]
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

fn lerp_color(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    [lerp_u8(a[0], b[0], t), lerp_u8(a[1], b[1], t), lerp_u8(a[2], b[2], t)]
}

/// Compositing switches driven by the UI.
#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
    pub shadows: bool,
    pub debug_grid: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            shadows: true,
            debug_grid: false,
        }
    }
}

/// Per-frame debug metrics, consumed by the out-of-scope UI.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    pub visible_tiles: usize,
    pub culled_tiles: usize,
    pub objects_drawn: usize,
}

/// Back-to-front draw order for a `width x height` grid: every cell sorted by
/// `x + y` ascending, ties broken by `x` ascending. Walking the diagonals
/// produces exactly that order without a sort. Recomputed per frame (or on
/// map resize); never stored.
pub fn render_order(width: usize, height: usize) -> Vec<(i32, i32)> {
    let mut order = Vec::with_capacity(width * height);
    if width == 0 || height == 0 {
        return order;
    }
    let (w, h) = (width as i32, height as i32);
    for s in 0..(w + h - 1) {
        let x_min = (s - h + 1).max(0);
        let x_max = s.min(w - 1);
        for x in x_min..=x_max {
            order.push((x, s - x));
        }
    }
    order
}

/// Paint all visible layers onto the frame: grid layers first (stack order),
/// then every object layer, each in painter's order under the current camera.
pub fn composite(
    frame: &mut Frame,
    layers: &LayerStack,
    heights: &Grid<f32>,
    catalog: &TileCatalog,
    tileset: &Tileset,
    camera: &Camera,
    options: &RenderOptions,
) -> FrameStats {
    let mut stats = FrameStats::default();
    let order = render_order(heights.width, heights.height);

    for layer in layers.iter().filter(|l| l.visible) {
        if let LayerData::Grid(grid) = &layer.data {
            composite_grid_layer(
                frame, grid, heights, catalog, tileset, camera, layer.opacity, &order, &mut stats,
            );
        }
    }

    for layer in layers.iter().filter(|l| l.visible) {
        if let LayerData::Objects(objects) = &layer.data {
            composite_object_layer(
                frame,
                objects,
                catalog,
                tileset,
                camera,
                layer.opacity,
                options,
                &mut stats,
            );
        }
    }

    if options.debug_grid {
        draw_debug_grid(frame, heights, camera);
    }

    stats
}

#[allow(clippy::too_many_arguments)]
fn composite_grid_layer(
    frame: &mut Frame,
    grid: &Grid<u8>,
    heights: &Grid<f32>,
    catalog: &TileCatalog,
    tileset: &Tileset,
    camera: &Camera,
    opacity: f32,
    order: &[(i32, i32)],
    stats: &mut FrameStats,
) {
    let (cw, ch) = (frame.width as f32, frame.height as f32);
    for &(x, y) in order {
        if !grid.in_bounds(x, y) {
            continue;
        }
        // Malformed cell data: skip, never raise.
        let Some(def) = catalog.get(*grid.get(x as usize, y as usize)) else {
            continue;
        };
        let z = *heights.get(x as usize, y as usize);
        let (canvas_x, canvas_y) = camera.tile_to_canvas(x, y, z, cw, ch);
        if cull(frame, tileset, camera, canvas_x, canvas_y) {
            stats.culled_tiles += 1;
            continue;
        }
        blit_cell(frame, tileset, def.id, canvas_x, canvas_y, camera.scale, opacity);
        stats.visible_tiles += 1;
    }
}

#[allow(clippy::too_many_arguments)]
fn composite_object_layer(
    frame: &mut Frame,
    objects: &[PlacedObject],
    catalog: &TileCatalog,
    tileset: &Tileset,
    camera: &Camera,
    opacity: f32,
    options: &RenderOptions,
    stats: &mut FrameStats,
) {
    // Painter's order within the layer: (x + y) ascending, ties by x.
    let mut sorted: Vec<&PlacedObject> = objects.iter().collect();
    sorted.sort_by_key(|o| (o.tile_x + o.tile_y, o.tile_x));

    let (cw, ch) = (frame.width as f32, frame.height as f32);
    for obj in sorted {
        if options.shadows && obj.tile_z > 0.0 {
            draw_shadow(frame, obj, camera);
        }
        match obj.kind {
            ObjectKind::City => {
                let city_id = catalog.id_for(TerrainKind::City);
                for dy in 0..obj.footprint_h as i32 {
                    for dx in 0..obj.footprint_w as i32 {
                        let (canvas_x, canvas_y) = camera.tile_to_canvas(
                            obj.tile_x + dx,
                            obj.tile_y + dy,
                            obj.tile_z,
                            cw,
                            ch,
                        );
                        if cull(frame, tileset, camera, canvas_x, canvas_y) {
                            continue;
                        }
                        blit_cell(frame, tileset, city_id, canvas_x, canvas_y, camera.scale, opacity);
                    }
                }
            }
            ObjectKind::Army => {
                let (canvas_x, canvas_y) =
                    camera.tile_to_canvas(obj.tile_x, obj.tile_y, obj.tile_z, cw, ch);
                if cull(frame, tileset, camera, canvas_x, canvas_y) {
                    continue;
                }
                draw_army_marker(frame, canvas_x, canvas_y, camera, opacity);
            }
        }
        stats.objects_drawn += 1;
    }
}

/// Whether a cell anchored at `(canvas_x, canvas_y)` lies entirely outside
/// the canvas, with the bounds expanded by one tile size.
fn cull(frame: &Frame, tileset: &Tileset, camera: &Camera, canvas_x: f32, canvas_y: f32) -> bool {
    let scale = camera.scale;
    let half_w = tileset.cell_w() as f32 * scale / 2.0;
    let cell_h = tileset.cell_h() as f32 * scale;
    let margin_x = camera.metrics.tile_w * scale;
    let margin_y = camera.metrics.tile_h * scale;

    canvas_x + half_w + margin_x < 0.0
        || canvas_x - half_w - margin_x > frame.width as f32
        || canvas_y + cell_h + margin_y < 0.0
        || canvas_y - margin_y > frame.height as f32
}

/// Nearest-neighbor blit of one atlas cell, horizontally centered on
/// `canvas_x` with its diamond top at `canvas_y`.
fn blit_cell(
    frame: &mut Frame,
    tileset: &Tileset,
    id: u8,
    canvas_x: f32,
    canvas_y: f32,
    scale: f32,
    opacity: f32,
) {
    if opacity <= 0.0 {
        return;
    }
    let dest_w = (tileset.cell_w() as f32 * scale).ceil() as i32;
    let dest_h = (tileset.cell_h() as f32 * scale).ceil() as i32;
    let left = (canvas_x - tileset.cell_w() as f32 * scale / 2.0).round() as i32;
    let top = canvas_y.round() as i32;

    for dy in 0..dest_h {
        let sy = (dy as f32 / scale) as u32;
        for dx in 0..dest_w {
            let sx = (dx as f32 / scale) as u32;
            let px = tileset.pixel(id, sx, sy);
            if px[3] == 0 {
                continue;
            }
            let alpha = px[3] as f32 / 255.0 * opacity;
            frame.blend_px(left + dx, top + dy, [px[0], px[1], px[2]], alpha);
        }
    }
}

/// Flat, offset, semi-transparent quad at ground level beneath an extruded
/// object.
fn draw_shadow(frame: &mut Frame, obj: &PlacedObject, camera: &Camera) {
    let (cw, ch) = (frame.width as f32, frame.height as f32);
    let scale = camera.scale;
    let half_w = camera.metrics.tile_w * scale / 2.0;
    let half_h = camera.metrics.tile_h * scale / 2.0;
    let offset = 3.0 * scale;

    for dy in 0..obj.footprint_h as i32 {
        for dx in 0..obj.footprint_w as i32 {
            let (cx, cy) =
                camera.tile_to_canvas(obj.tile_x + dx, obj.tile_y + dy, 0.0, cw, ch);
            let center_x = cx + offset;
            let center_y = cy + half_h + offset;
            let rows = (half_h * 2.0).ceil() as i32;
            for row in 0..rows {
                let t = (row as f32 + 0.5) / rows as f32;
                let span = half_w * (1.0 - (2.0 * t - 1.0).abs());
                let y = (center_y - half_h + row as f32).round() as i32;
                let x0 = (center_x - span).round() as i32;
                let x1 = (center_x + span).round() as i32;
                for x in x0..=x1 {
                    frame.blend_px(x, y, [0, 0, 0], SHADOW_ALPHA);
                }
            }
        }
    }
}

fn draw_army_marker(frame: &mut Frame, canvas_x: f32, canvas_y: f32, camera: &Camera, opacity: f32) {
    let scale = camera.scale;
    let half_h = camera.metrics.tile_h * scale / 2.0;
    let r = (camera.metrics.tile_w * scale * 0.14).max(2.0);
    let center_y = canvas_y + half_h;
    let rr = r * r;
    let (r_i, color) = (r.ceil() as i32, [200, 56, 48]);
    for dy in -r_i..=r_i {
        for dx in -r_i..=r_i {
            if (dx * dx + dy * dy) as f32 <= rr {
                frame.blend_px(
                    canvas_x as i32 + dx,
                    center_y as i32 + dy,
                    color,
                    opacity,
                );
            }
        }
    }
}

/// Diamond outlines over every planar cell, for debugging alignment.
fn draw_debug_grid(frame: &mut Frame, heights: &Grid<f32>, camera: &Camera) {
    let (cw, ch) = (frame.width as f32, frame.height as f32);
    let half_w = camera.metrics.tile_w * camera.scale / 2.0;
    let half_h = camera.metrics.tile_h * camera.scale / 2.0;
    for y in 0..heights.height as i32 {
        for x in 0..heights.width as i32 {
            let (cx, cy) = camera.tile_to_canvas(x, y, 0.0, cw, ch);
            if cx + half_w < 0.0 || cx - half_w > cw || cy + half_h * 2.0 < 0.0 || cy > ch {
                continue;
            }
            let top = (cx, cy);
            let right = (cx + half_w, cy + half_h);
            let bottom = (cx, cy + half_h * 2.0);
            let left = (cx - half_w, cy + half_h);
            frame.draw_line(top.0, top.1, right.0, right.1, GRID_COLOR, 0.6);
            frame.draw_line(right.0, right.1, bottom.0, bottom.1, GRID_COLOR, 0.6);
            frame.draw_line(bottom.0, bottom.1, left.0, left.1, GRID_COLOR, 0.6);
            frame.draw_line(left.0, left.1, top.0, top.1, GRID_COLOR, 0.6);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::Layer;
    use crate::transform::TileMetrics;

    #[test]
    fn test_render_order_monotonic() {
        let order = render_order(7, 5);
        assert_eq!(order.len(), 35);
        for pair in order.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let (da, db) = (a.0 + a.1, b.0 + b.1);
            assert!(da <= db, "{:?} before {:?}", a, b);
            if da == db {
                assert!(a.0 < b.0, "tie at depth {} not broken by x: {:?} {:?}", da, a, b);
            }
        }
    }

    #[test]
    fn test_render_order_covers_grid() {
        let order = render_order(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                assert!(order.contains(&(x, y)));
            }
        }
    }

    fn test_scene() -> (Grid<f32>, TileCatalog, Tileset, Camera) {
        let catalog = TileCatalog::new();
        let metrics = TileMetrics::default();
        let tileset = Tileset::build(&catalog, &metrics);
        let camera = Camera::new(metrics);
        let heights = Grid::new_with(4, 4, 0.0f32);
        (heights, catalog, tileset, camera)
    }

    #[test]
    fn test_hidden_layer_composites_identically_to_absence() {
        let (heights, catalog, tileset, camera) = test_scene();
        let grass = catalog.id_for(TerrainKind::Grass);
        let water = catalog.id_for(TerrainKind::Water);

        let mut with_hidden = LayerStack::new();
        with_hidden.add_layer(Layer::grid("terrain", Grid::new_with(4, 4, grass)));
        with_hidden.add_layer(Layer::grid("overlay", Grid::new_with(4, 4, water)));
        with_hidden.set_visible("overlay", false);

        let mut without = LayerStack::new();
        without.add_layer(Layer::grid("terrain", Grid::new_with(4, 4, grass)));

        let options = RenderOptions::default();
        let mut frame_a = Frame::new(320, 240);
        frame_a.clear_sky();
        composite(&mut frame_a, &with_hidden, &heights, &catalog, &tileset, &camera, &options);

        let mut frame_b = Frame::new(320, 240);
        frame_b.clear_sky();
        composite(&mut frame_b, &without, &heights, &catalog, &tileset, &camera, &options);

        assert_eq!(frame_a.buffer(), frame_b.buffer());
    }

    #[test]
    fn test_invalid_tile_id_skipped() {
        let (heights, catalog, tileset, camera) = test_scene();
        let mut stack = LayerStack::new();
        stack.add_layer(Layer::grid("terrain", Grid::new_with(4, 4, 250u8)));

        let mut frame = Frame::new(320, 240);
        frame.clear_sky();
        let stats = composite(
            &mut frame,
            &stack,
            &heights,
            &catalog,
            &tileset,
            &camera,
            &RenderOptions::default(),
        );
        assert_eq!(stats.visible_tiles, 0);
    }

    #[test]
    fn test_offscreen_cells_culled() {
        let (heights, catalog, tileset, mut camera) = test_scene();
        camera.pan(-100_000.0, 0.0);
        let grass = catalog.id_for(TerrainKind::Grass);
        let mut stack = LayerStack::new();
        stack.add_layer(Layer::grid("terrain", Grid::new_with(4, 4, grass)));

        let mut frame = Frame::new(320, 240);
        frame.clear_sky();
        let stats = composite(
            &mut frame,
            &stack,
            &heights,
            &catalog,
            &tileset,
            &camera,
            &RenderOptions::default(),
        );
        assert_eq!(stats.visible_tiles, 0);
        assert_eq!(stats.culled_tiles, 16);
    }

    #[test]
    fn test_zero_opacity_layer_changes_nothing() {
        let (heights, catalog, tileset, camera) = test_scene();
        let grass = catalog.id_for(TerrainKind::Grass);
        let mut stack = LayerStack::new();
        stack.add_layer(Layer::grid("terrain", Grid::new_with(4, 4, grass)));
        stack.set_opacity("terrain", 0.0);

        let mut frame = Frame::new(320, 240);
        frame.clear_sky();
        let before: Vec<u32> = frame.buffer().to_vec();
        composite(
            &mut frame,
            &stack,
            &heights,
            &catalog,
            &tileset,
            &camera,
            &RenderOptions::default(),
        );
        assert_eq!(frame.buffer(), &before[..]);
    }
}
