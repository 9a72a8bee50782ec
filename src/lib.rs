//! Isometric tile map rendering and procedural terrain engine.
//!
//! Re-exports modules for use by binaries and tools.

pub mod camera;
pub mod grid;
pub mod layers;
pub mod picking;
pub mod render;
pub mod scene;
pub mod seeds;
pub mod terrain;
pub mod tiles;
pub mod tileset;
pub mod transform;
pub mod viewer;
