//! Pointer picking: canvas position to tile coordinate or occupying object.
//!
//! The height-aware projection has no unique inverse, so picking resolves the
//! planar tile first and then verifies a bounded set of candidates along the
//! `(+1, +1)` diagonal against known cell heights: raising a cell by `z`
//! moves its diamond up the same screen column that deeper diagonal
//! neighbors occupy.

use std::collections::BTreeMap;

use crate::camera::Camera;
use crate::grid::Grid;
use crate::layers::{LayerStack, ObjectKind};
use crate::transform;

/// What a pointer position resolved to.
#[derive(Clone, Debug, PartialEq)]
pub enum PickResult {
    /// The pointer hit an object's footprint. Carries an attributes snapshot
    /// for the selection event consumed by the surrounding UI.
    Object {
        id: u32,
        kind: ObjectKind,
        name: String,
        tile_x: i32,
        tile_y: i32,
        attributes: BTreeMap<String, String>,
    },
    /// The pointer hit a bare tile.
    Tile { tile_x: i32, tile_y: i32 },
}

/// Resolve a canvas-space pointer position against the map.
///
/// Returns `None` when the pointer is off the map entirely.
pub fn pick(
    canvas_x: f32,
    canvas_y: f32,
    canvas_w: f32,
    canvas_h: f32,
    camera: &Camera,
    heights: &Grid<f32>,
    layers: &LayerStack,
) -> Option<PickResult> {
    let (wx, wy) = camera.canvas_to_world(canvas_x, canvas_y, canvas_w, canvas_h);
    let (tile_x, tile_y) = pick_tile(wx, wy, camera, heights)?;

    if let Some(obj) = layers.object_at(tile_x, tile_y) {
        return Some(PickResult::Object {
            id: obj.id,
            kind: obj.kind,
            name: obj.name.clone(),
            tile_x: obj.tile_x,
            tile_y: obj.tile_y,
            attributes: obj.attributes.clone(),
        });
    }
    Some(PickResult::Tile { tile_x, tile_y })
}

/// Planar inverse first, then walk diagonal candidates front-to-back and
/// accept the nearest one whose height-raised top face contains the point.
fn pick_tile(
    world_x: f32,
    world_y: f32,
    camera: &Camera,
    heights: &Grid<f32>,
) -> Option<(i32, i32)> {
    let m = &camera.metrics;
    let (x0, y0) = transform::screen_to_tile(m, world_x, world_y);

    // A cell raised to max height shifts its diamond up by max_z * depth
    // pixels, which spans this many diagonal steps.
    let max_z = heights
        .iter()
        .map(|(_, _, &h)| h)
        .fold(0.0f32, f32::max)
        .max(0.0);
    let max_steps = ((max_z * m.tile_depth) / m.tile_h).ceil() as i32;

    for k in (1..=max_steps).rev() {
        let (cx, cy) = (x0 + k, y0 + k);
        if !heights.in_bounds(cx, cy) {
            continue;
        }
        let z = heights.get(cx as usize, cy as usize).max(0.0);
        if z <= 0.0 {
            continue;
        }
        // Undo the candidate's height shift and re-invert: a hit maps back
        // onto the candidate itself.
        if transform::screen_to_tile(m, world_x, world_y + z * m.tile_depth) == (cx, cy) {
            return Some((cx, cy));
        }
    }

    if heights.in_bounds(x0, y0) {
        Some((x0, y0))
    } else {
        None
    }
}
