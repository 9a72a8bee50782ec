//! Engine instance: all data for one map view bundled together.
//!
//! Generation runs in strictly ordered phases — tileset, then height/terrain,
//! then layers and object placement — and each phase is synchronous. The
//! tileset is an explicit handle owned by the scene and passed to the
//! compositor; there is no shared texture cache, so multiple scenes can
//! coexist safely. Maps are regenerated per session, never persisted.

use crate::camera::Camera;
use crate::grid::Grid;
use crate::layers::{self, Layer, LayerStack, PlacedObject};
use crate::picking::{self, PickResult};
use crate::render::{self, Frame, FrameStats, RenderOptions};
use crate::seeds::MapSeeds;
use crate::terrain::{self, TerrainParams};
use crate::tiles::{TerrainKind, TileCatalog};
use crate::tileset::Tileset;
use crate::transform::TileMetrics;

pub const TERRAIN_LAYER: &str = "terrain";
pub const OBJECT_LAYER: &str = "objects";

pub struct MapScene {
    pub seeds: MapSeeds,
    pub width: usize,
    pub height: usize,
    pub catalog: TileCatalog,
    pub tileset: Tileset,
    pub heights: Grid<f32>,
    pub layers: LayerStack,
    pub camera: Camera,
}

impl MapScene {
    /// Generate a complete scene: tileset, height field, terrain grid, layer
    /// stack, and placed objects, all reproducible from the master seed.
    pub fn generate(
        width: usize,
        height: usize,
        master_seed: u64,
        objects: Vec<PlacedObject>,
        metrics: TileMetrics,
    ) -> Self {
        let seeds = MapSeeds::from_master(master_seed);
        println!("Generating {}x{} map, {}", width, height, seeds);

        // Phase 1: tileset.
        println!("Building tileset...");
        let catalog = TileCatalog::new();
        let tileset = Tileset::build(&catalog, &metrics);

        // Phase 2: height field and terrain classification.
        println!("Generating terrain...");
        let params = TerrainParams::default();
        let (heights, mut terrain) = terrain::generate(width, height, &seeds, &catalog, &params);

        // Phase 3: layers and object placement. City footprints are stamped
        // into the terrain grid once, here; the grid is frozen afterwards.
        println!("Placing {} objects...", objects.len());
        let city_id = catalog.id_for(TerrainKind::City);
        layers::stamp_footprints(&mut terrain, &objects, city_id);
        let mut placed: Vec<PlacedObject> = objects
            .into_iter()
            .filter(|o| o.in_bounds(width, height))
            .collect();
        // Seat each object on the terrain: its height comes from the cell it
        // anchors on, so extruded ground lifts the object with it.
        for obj in &mut placed {
            obj.tile_z = heights
                .get(obj.tile_x as usize, obj.tile_y as usize)
                .max(0.0);
        }

        let mut stack = LayerStack::new();
        stack.add_layer(Layer::grid(TERRAIN_LAYER, terrain));
        stack.add_layer(Layer::objects(OBJECT_LAYER, placed));

        Self {
            seeds,
            width,
            height,
            catalog,
            tileset,
            heights,
            layers: stack,
            camera: Camera::new(metrics),
        }
    }

    /// Composite one frame of the scene onto the given surface.
    pub fn render(&self, frame: &mut Frame, options: &RenderOptions) -> FrameStats {
        frame.clear_sky();
        render::composite(
            frame,
            &self.layers,
            &self.heights,
            &self.catalog,
            &self.tileset,
            &self.camera,
            options,
        )
    }

    /// Resolve a canvas-space pointer position to a tile or object.
    pub fn pick(&self, canvas_x: f32, canvas_y: f32, canvas_w: f32, canvas_h: f32) -> Option<PickResult> {
        picking::pick(
            canvas_x,
            canvas_y,
            canvas_w,
            canvas_h,
            &self.camera,
            &self.heights,
            &self.layers,
        )
    }

    /// Number of placed objects across all object layers.
    pub fn object_count(&self) -> usize {
        self.layers
            .iter()
            .filter_map(|l| match &l.data {
                crate::layers::LayerData::Objects(objs) => Some(objs.len()),
                _ => None,
            })
            .sum()
    }

    /// Walkability report for a tile; movement-range computation from these
    /// costs belongs to the caller.
    pub fn tile_info(&self, x: usize, y: usize) -> Option<TileInfo> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let layer = self.layers.get(TERRAIN_LAYER)?;
        let grid = match &layer.data {
            crate::layers::LayerData::Grid(grid) => grid,
            _ => return None,
        };
        let def = self.catalog.get(*grid.get(x, y))?;
        Some(TileInfo {
            x,
            y,
            elevation: *self.heights.get(x, y),
            kind: def.kind,
            walkable: def.walkable,
            move_cost: def.move_cost,
        })
    }
}

/// Information about a single tile.
#[derive(Clone, Copy, Debug)]
pub struct TileInfo {
    pub x: usize,
    pub y: usize,
    pub elevation: f32,
    pub kind: TerrainKind,
    pub walkable: bool,
    pub move_cost: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::ObjectKind;
    use std::collections::BTreeMap;

    fn demo_city(x: i32, y: i32) -> PlacedObject {
        PlacedObject {
            id: 1,
            kind: ObjectKind::City,
            name: "Demo".to_string(),
            tile_x: x,
            tile_y: y,
            tile_z: 0.0,
            footprint_w: 2,
            footprint_h: 2,
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_generate_same_seed_same_terrain() {
        let a = MapScene::generate(20, 15, 42, vec![], TileMetrics::default());
        let b = MapScene::generate(20, 15, 42, vec![], TileMetrics::default());
        for y in 0..15 {
            for x in 0..20 {
                assert_eq!(*a.heights.get(x, y), *b.heights.get(x, y));
                assert_eq!(
                    a.tile_info(x, y).unwrap().kind,
                    b.tile_info(x, y).unwrap().kind
                );
            }
        }
    }

    #[test]
    fn test_city_footprint_stamped() {
        let scene = MapScene::generate(20, 15, 42, vec![demo_city(8, 6)], TileMetrics::default());
        for dy in 0..2 {
            for dx in 0..2 {
                assert_eq!(
                    scene.tile_info(8 + dx, 6 + dy).unwrap().kind,
                    TerrainKind::City
                );
            }
        }
        assert_eq!(scene.object_count(), 1);
    }

    #[test]
    fn test_out_of_bounds_object_dropped() {
        let scene = MapScene::generate(10, 10, 42, vec![demo_city(9, 9)], TileMetrics::default());
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn test_tile_info_reports_walkability() {
        let scene = MapScene::generate(20, 15, 42, vec![], TileMetrics::default());
        let mut found_water = false;
        for y in 0..15 {
            for x in 0..20 {
                let info = scene.tile_info(x, y).unwrap();
                if info.kind == TerrainKind::Water {
                    assert!(!info.walkable);
                    found_water = true;
                } else if info.kind == TerrainKind::Road {
                    assert!(info.walkable);
                    assert!(info.move_cost < 1.0);
                }
            }
        }
        // Border erosion makes water effectively certain on a 20x15 map.
        assert!(found_water);
        assert!(scene.tile_info(50, 0).is_none());
    }

    #[test]
    fn test_render_smoke() {
        let scene = MapScene::generate(20, 15, 42, vec![demo_city(8, 6)], TileMetrics::default());
        let mut frame = Frame::new(640, 480);
        let stats = scene.render(&mut frame, &RenderOptions::default());
        assert!(stats.visible_tiles > 0);
        assert_eq!(stats.objects_drawn, 1);
    }
}
