//! Procedural tileset builder.
//!
//! Synthesizes one atlas cell per [`TileDef`]: an isometric rhombus top face
//! plus two shaded side faces when the tile is height-extruded, with
//! terrain-specific overlays (ripples for water, canopy dots for forest, and
//! so on). Nothing is loaded from disk; the atlas is built once at startup
//! from the static catalog and owned by the engine instance.

use image::{Rgba, RgbaImage};
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::tiles::{TerrainKind, TileCatalog, TileDef};
use crate::transform::TileMetrics;

/// Fixed texture seed: the atlas must be identical across builds so composites
/// of the same scene are pixel-identical.
const TEXTURE_SEED: u32 = 0x150_AA7;

/// A built tile atlas: one cell per tile id, laid out in a single row.
/// Cell `id` spans `x in [id * cell_w, (id+1) * cell_w)`.
pub struct Tileset {
    cell_w: u32,
    cell_h: u32,
    tile_w: u32,
    tile_h: u32,
    tile_depth: u32,
    atlas: RgbaImage,
}

impl Tileset {
    /// Build the atlas from the catalog. Executed once; no runtime inputs
    /// beyond the static catalog and tile metrics.
    pub fn build(catalog: &TileCatalog, metrics: &TileMetrics) -> Self {
        let tile_w = metrics.tile_w.round() as u32;
        let tile_h = metrics.tile_h.round() as u32;
        let tile_depth = metrics.tile_depth.round() as u32;
        assert!(tile_w > 0 && tile_h > 0 && tile_depth > 0);

        let max_block = catalog
            .iter()
            .map(|def| block_height_px(def, tile_depth))
            .max()
            .unwrap_or(tile_depth);

        let cell_w = tile_w;
        let cell_h = tile_h + max_block;
        let mut atlas = RgbaImage::new(cell_w * catalog.len() as u32, cell_h);

        let noise = Perlin::new(TEXTURE_SEED);
        for def in catalog.iter() {
            paint_cell(&mut atlas, def, cell_w, cell_h, tile_w, tile_h, tile_depth, &noise);
        }

        Self {
            cell_w,
            cell_h,
            tile_w,
            tile_h,
            tile_depth,
            atlas,
        }
    }

    pub fn cell_w(&self) -> u32 {
        self.cell_w
    }

    pub fn cell_h(&self) -> u32 {
        self.cell_h
    }

    pub fn tile_w(&self) -> u32 {
        self.tile_w
    }

    pub fn tile_h(&self) -> u32 {
        self.tile_h
    }

    /// Vertical extent of the extruded block below a tile's top face.
    pub fn block_height(&self, def: &TileDef) -> u32 {
        block_height_px(def, self.tile_depth)
    }

    /// Sample a pixel of a tile's atlas cell. `(dx, dy)` are cell-local;
    /// out-of-cell samples come back transparent.
    pub fn pixel(&self, id: u8, dx: u32, dy: u32) -> Rgba<u8> {
        if dx >= self.cell_w || dy >= self.cell_h {
            return Rgba([0, 0, 0, 0]);
        }
        *self.atlas.get_pixel(id as u32 * self.cell_w + dx, dy)
    }

    pub fn atlas(&self) -> &RgbaImage {
        &self.atlas
    }
}

/// destHeight rule: at least one depth step even for flat tiles, so every
/// cell reads as a thin slab rather than a floating diamond.
fn block_height_px(def: &TileDef, tile_depth: u32) -> u32 {
    (def.height_class as u32 + 1).max(1) * tile_depth
}

fn base_color(kind: TerrainKind) -> [u8; 3] {
    match kind {
        TerrainKind::Water => [52, 112, 198],
        TerrainKind::Grass => [98, 172, 82],
        TerrainKind::Forest => [48, 122, 60],
        TerrainKind::Mountain => [132, 124, 112],
        TerrainKind::Desert => [214, 192, 134],
        TerrainKind::City => [170, 162, 150],
        TerrainKind::Road => [150, 140, 120],
        TerrainKind::Snow => [234, 238, 246],
    }
}

fn shade(c: [u8; 3], f: f32) -> [u8; 3] {
    [
        (c[0] as f32 * f).clamp(0.0, 255.0) as u8,
        (c[1] as f32 * f).clamp(0.0, 255.0) as u8,
        (c[2] as f32 * f).clamp(0.0, 255.0) as u8,
    ]
}

/// Half-width of the diamond at row `r` of `tile_h` rows (pixel centers).
fn diamond_half_width(r: u32, tile_w: u32, tile_h: u32) -> f32 {
    let t = (r as f32 + 0.5) / tile_h as f32;
    (tile_w as f32 / 2.0) * (1.0 - (2.0 * t - 1.0).abs())
}

#[allow(clippy::too_many_arguments)]
fn paint_cell(
    atlas: &mut RgbaImage,
    def: &TileDef,
    cell_w: u32,
    cell_h: u32,
    tile_w: u32,
    tile_h: u32,
    tile_depth: u32,
    noise: &Perlin,
) {
    let origin_x = def.id as u32 * cell_w;
    let base = base_color(def.kind);
    let left_face = shade(base, 0.72);
    let right_face = shade(base, 0.52);
    let block = block_height_px(def, tile_depth);
    let cx = tile_w as f32 / 2.0;

    // Side faces: the diamond silhouette swept downward by the block height.
    // Painting the sweep bottom-up and the top face last keeps the cell
    // self-occluding without any per-pixel face test.
    for off in (1..=block).rev() {
        for r in 0..tile_h {
            let y = r + off;
            if y >= cell_h {
                continue;
            }
            let half = diamond_half_width(r, tile_w, tile_h);
            for x in 0..tile_w {
                let dx = x as f32 + 0.5 - cx;
                if dx.abs() <= half {
                    let color = if dx < 0.0 { left_face } else { right_face };
                    atlas.put_pixel(
                        origin_x + x,
                        y,
                        Rgba([color[0], color[1], color[2], 255]),
                    );
                }
            }
        }
    }

    // Top face with per-terrain texture.
    let mut dot_rng = ChaCha8Rng::seed_from_u64(TEXTURE_SEED as u64 ^ def.id as u64);
    for r in 0..tile_h {
        let half = diamond_half_width(r, tile_w, tile_h);
        for x in 0..tile_w {
            let dx = x as f32 + 0.5 - cx;
            if dx.abs() > half {
                continue;
            }
            let color = top_face_color(def.kind, base, x, r, tile_h, noise);
            atlas.put_pixel(origin_x + x, r, Rgba([color[0], color[1], color[2], 255]));
        }
    }

    // Dot-style decorations placed inside the diamond.
    match def.kind {
        TerrainKind::Forest => {
            // Canopy dots.
            for _ in 0..10 {
                let r = dot_rng.gen_range(tile_h / 4..tile_h * 3 / 4);
                let half = diamond_half_width(r, tile_w, tile_h).max(2.0);
                let span = (half as i32 * 2 - 2).max(1);
                let x = (cx as i32 - half as i32 + 1 + dot_rng.gen_range(0..span)) as u32;
                let dark = shade(base, 0.7);
                stamp_dot(atlas, origin_x + x, r, tile_w, tile_h, dark);
            }
        }
        TerrainKind::City => {
            // Window grid on the side faces.
            let win = shade([255, 232, 160], 1.0);
            for wy in (tile_h + 2..tile_h + block).step_by(4) {
                for wx in (4..tile_w - 4).step_by(6) {
                    if wy < cell_h {
                        atlas.put_pixel(origin_x + wx, wy, Rgba([win[0], win[1], win[2], 255]));
                    }
                }
            }
        }
        _ => {}
    }
}

fn top_face_color(
    kind: TerrainKind,
    base: [u8; 3],
    x: u32,
    r: u32,
    tile_h: u32,
    noise: &Perlin,
) -> [u8; 3] {
    let n = noise.get([x as f64 * 0.23, r as f64 * 0.31]) as f32;
    match kind {
        TerrainKind::Water => {
            // Ripples: light horizontal bands.
            if n > 0.35 {
                shade(base, 1.25)
            } else {
                base
            }
        }
        TerrainKind::Grass => {
            if n > 0.5 {
                shade(base, 1.1)
            } else {
                base
            }
        }
        TerrainKind::Mountain => {
            // Rocky facets.
            if n > 0.3 {
                shade(base, 1.15)
            } else if n < -0.3 {
                shade(base, 0.85)
            } else {
                base
            }
        }
        TerrainKind::Desert => {
            // Dune banding.
            if ((x + r * 2) / 5) % 2 == 0 {
                shade(base, 1.06)
            } else {
                base
            }
        }
        TerrainKind::Road => {
            // Dashed centerline along the diamond's long axis.
            let mid = r.abs_diff(tile_h / 2);
            if mid <= 1 && (x / 4) % 2 == 0 {
                [226, 220, 200]
            } else {
                shade(base, 0.95)
            }
        }
        TerrainKind::Snow => {
            if n > 0.55 {
                [255, 255, 255]
            } else {
                base
            }
        }
        _ => base,
    }
}

fn stamp_dot(atlas: &mut RgbaImage, x: u32, y: u32, tile_w: u32, tile_h: u32, color: [u8; 3]) {
    for dy in 0..2u32 {
        for dx in 0..2u32 {
            let px = x + dx;
            let py = y + dy;
            if px < atlas.width() && py < tile_h.min(atlas.height()) && px % tile_w != 0 {
                atlas.put_pixel(px, py, Rgba([color[0], color[1], color[2], 255]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_default() -> (TileCatalog, Tileset) {
        let catalog = TileCatalog::new();
        let tileset = Tileset::build(&catalog, &TileMetrics::default());
        (catalog, tileset)
    }

    #[test]
    fn test_atlas_dimensions() {
        let (catalog, tileset) = build_default();
        assert_eq!(
            tileset.atlas().width(),
            tileset.cell_w() * catalog.len() as u32
        );
        assert_eq!(tileset.atlas().height(), tileset.cell_h());
    }

    #[test]
    fn test_block_height_rule() {
        let (catalog, tileset) = build_default();
        for def in catalog.iter() {
            let expected = (def.height_class as u32 + 1).max(1) * 16;
            assert_eq!(tileset.block_height(def), expected);
        }
    }

    #[test]
    fn test_top_corner_transparent_center_opaque() {
        let (catalog, tileset) = build_default();
        for def in catalog.iter() {
            // Cell corners lie outside the rhombus.
            assert_eq!(tileset.pixel(def.id, 0, 0)[3], 0);
            // The diamond center is always painted.
            let center = tileset.pixel(def.id, 32, 16);
            assert_eq!(center[3], 255);
        }
    }

    #[test]
    fn test_build_is_deterministic() {
        let catalog = TileCatalog::new();
        let a = Tileset::build(&catalog, &TileMetrics::default());
        let b = Tileset::build(&catalog, &TileMetrics::default());
        assert_eq!(a.atlas().as_raw(), b.atlas().as_raw());
    }

    #[test]
    fn test_out_of_cell_sample_is_transparent() {
        let (_, tileset) = build_default();
        assert_eq!(tileset.pixel(0, tileset.cell_w(), 0)[3], 0);
    }
}
