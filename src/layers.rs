//! Layer model: named, independently toggleable layers of two kinds.
//!
//! Grid layers hold 2D tile-id arrays; object layers hold sparse lists of
//! placed entities (cities, armies). Visibility and opacity are the only
//! fields mutable after construction; the layer data itself is frozen once
//! generation and object placement finish.

use std::collections::BTreeMap;

use crate::grid::Grid;

/// What kind of entity occupies a map position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    City,
    Army,
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            ObjectKind::City => "City",
            ObjectKind::Army => "Army",
        }
    }
}

/// An entity placed on the map with a rectangular tile footprint.
///
/// Supplied by the surrounding application; position may later be mutated by
/// the external game logic (army movement), never by this engine.
#[derive(Clone, Debug)]
pub struct PlacedObject {
    pub id: u32,
    pub kind: ObjectKind,
    pub name: String,
    pub tile_x: i32,
    pub tile_y: i32,
    /// Height the object sits at, in height-field units.
    pub tile_z: f32,
    pub footprint_w: u32,
    pub footprint_h: u32,
    pub attributes: BTreeMap<String, String>,
}

impl PlacedObject {
    /// Whether a tile coordinate falls inside this object's footprint.
    pub fn contains(&self, tile_x: i32, tile_y: i32) -> bool {
        tile_x >= self.tile_x
            && tile_y >= self.tile_y
            && tile_x < self.tile_x + self.footprint_w as i32
            && tile_y < self.tile_y + self.footprint_h as i32
    }

    /// Whether the full footprint lies within a `width x height` grid.
    pub fn in_bounds(&self, width: usize, height: usize) -> bool {
        self.tile_x >= 0
            && self.tile_y >= 0
            && self.tile_x + self.footprint_w as i32 <= width as i32
            && self.tile_y + self.footprint_h as i32 <= height as i32
    }
}

/// Layer payload: a tile-id grid or an object list.
pub enum LayerData {
    Grid(Grid<u8>),
    Objects(Vec<PlacedObject>),
}

pub struct Layer {
    pub id: String,
    pub visible: bool,
    /// Global alpha applied during this layer's paint pass only, in [0, 1].
    pub opacity: f32,
    pub data: LayerData,
}

impl Layer {
    pub fn grid(id: &str, grid: Grid<u8>) -> Self {
        Self {
            id: id.to_string(),
            visible: true,
            opacity: 1.0,
            data: LayerData::Grid(grid),
        }
    }

    pub fn objects(id: &str, objects: Vec<PlacedObject>) -> Self {
        Self {
            id: id.to_string(),
            visible: true,
            opacity: 1.0,
            data: LayerData::Objects(objects),
        }
    }
}

/// Ordered collection of layers, painted bottom-to-top.
#[derive(Default)]
pub struct LayerStack {
    layers: Vec<Layer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Toggle a layer's visibility. Returns false for an unknown id.
    pub fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        match self.layers.iter_mut().find(|l| l.id == id) {
            Some(layer) => {
                layer.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Set a layer's opacity, clamped to [0, 1]. Returns false for an
    /// unknown id.
    pub fn set_opacity(&mut self, id: &str, opacity: f32) -> bool {
        match self.layers.iter_mut().find(|l| l.id == id) {
            Some(layer) => {
                layer.opacity = opacity.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Find the topmost object whose footprint contains a tile, searching
    /// object layers from top to bottom. Footprints are axis-aligned and, by
    /// placement policy, non-overlapping within a layer.
    pub fn object_at(&self, tile_x: i32, tile_y: i32) -> Option<&PlacedObject> {
        for layer in self.layers.iter().rev() {
            if !layer.visible {
                continue;
            }
            if let LayerData::Objects(objects) = &layer.data {
                if let Some(obj) = objects.iter().find(|o| o.contains(tile_x, tile_y)) {
                    return Some(obj);
                }
            }
        }
        None
    }
}

/// Stamp object footprints into a terrain grid with the given tile id.
///
/// Runs once at placement time. Stamping is idempotent: re-invoking with the
/// same object set writes the same cells to the same id and touches nothing
/// outside the footprints. Objects that do not fit the grid are skipped so
/// the in-bounds invariant holds for everything that lands in the map.
pub fn stamp_footprints(terrain: &mut Grid<u8>, objects: &[PlacedObject], stamp_id: u8) {
    for obj in objects {
        if !obj.in_bounds(terrain.width, terrain.height) {
            eprintln!(
                "skipping {} \"{}\": footprint {}x{} at ({}, {}) exceeds {}x{} grid",
                obj.kind.label(),
                obj.name,
                obj.footprint_w,
                obj.footprint_h,
                obj.tile_x,
                obj.tile_y,
                terrain.width,
                terrain.height
            );
            continue;
        }
        for dy in 0..obj.footprint_h {
            for dx in 0..obj.footprint_w {
                let x = (obj.tile_x + dx as i32) as usize;
                let y = (obj.tile_y + dy as i32) as usize;
                terrain.set(x, y, stamp_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(id: u32, x: i32, y: i32, w: u32, h: u32) -> PlacedObject {
        PlacedObject {
            id,
            kind: ObjectKind::City,
            name: format!("city-{}", id),
            tile_x: x,
            tile_y: y,
            tile_z: 0.0,
            footprint_w: w,
            footprint_h: h,
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_stamp_covers_footprint() {
        let mut terrain = Grid::new_with(10, 10, 1u8);
        stamp_footprints(&mut terrain, &[city(1, 3, 4, 2, 3)], 5);
        for dy in 0..3 {
            for dx in 0..2 {
                assert_eq!(*terrain.get(3 + dx, 4 + dy), 5);
            }
        }
        // A neighbor just outside the footprint is untouched.
        assert_eq!(*terrain.get(5, 4), 1);
        assert_eq!(*terrain.get(3, 7), 1);
    }

    #[test]
    fn test_stamp_is_idempotent() {
        let mut terrain = Grid::new_with(10, 10, 1u8);
        let cities = [city(1, 3, 4, 2, 2)];
        stamp_footprints(&mut terrain, &cities, 5);
        let snapshot: Vec<u8> = terrain.iter().map(|(_, _, &id)| id).collect();
        stamp_footprints(&mut terrain, &cities, 5);
        let again: Vec<u8> = terrain.iter().map(|(_, _, &id)| id).collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_out_of_bounds_footprint_skipped() {
        let mut terrain = Grid::new_with(5, 5, 1u8);
        stamp_footprints(&mut terrain, &[city(1, 4, 4, 3, 3)], 5);
        for (_, _, &id) in terrain.iter() {
            assert_eq!(id, 1);
        }
    }

    #[test]
    fn test_set_opacity_clamps() {
        let mut stack = LayerStack::new();
        stack.add_layer(Layer::grid("terrain", Grid::new_with(2, 2, 0u8)));
        assert!(stack.set_opacity("terrain", 2.5));
        assert_eq!(stack.get("terrain").unwrap().opacity, 1.0);
        assert!(stack.set_opacity("terrain", -0.5));
        assert_eq!(stack.get("terrain").unwrap().opacity, 0.0);
        assert!(!stack.set_opacity("missing", 0.5));
    }

    #[test]
    fn test_visibility_toggle_leaves_data_untouched() {
        let mut stack = LayerStack::new();
        stack.add_layer(Layer::grid("terrain", Grid::new_with(3, 3, 7u8)));
        assert!(stack.set_visible("terrain", false));
        let layer = stack.get("terrain").unwrap();
        assert!(!layer.visible);
        match &layer.data {
            LayerData::Grid(grid) => {
                for (_, _, &id) in grid.iter() {
                    assert_eq!(id, 7);
                }
            }
            LayerData::Objects(_) => panic!("expected grid layer"),
        }
    }

    #[test]
    fn test_object_at_resolves_footprint() {
        let mut stack = LayerStack::new();
        stack.add_layer(Layer::objects("cities", vec![city(9, 2, 2, 2, 2)]));
        assert_eq!(stack.object_at(3, 3).unwrap().id, 9);
        assert!(stack.object_at(4, 2).is_none());
        stack.set_visible("cities", false);
        assert!(stack.object_at(3, 3).is_none());
    }
}
