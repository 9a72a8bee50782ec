//! Interactive frame loop on a minifb window.
//!
//! Every tick is a full repaint: clear to the sky gradient, composite all
//! visible layers, overlay the debug grid if enabled, push the buffer. The
//! only state carried between frames is the camera and the layer stack.
//! Controls: drag to pan, scroll or +/- to zoom, 1/2 to toggle layers,
//! [ and ] for terrain opacity, G for the debug grid, S for shadows,
//! R to regenerate, Esc to exit.

use std::time::Instant;

use minifb::{Key, MouseButton, MouseMode, Window, WindowOptions};

use crate::layers::PlacedObject;
use crate::picking::PickResult;
use crate::render::{Frame, RenderOptions};
use crate::scene::{MapScene, OBJECT_LAYER, TERRAIN_LAYER};
use crate::transform::TileMetrics;

const INITIAL_WIDTH: usize = 1024;
const INITIAL_HEIGHT: usize = 720;
/// Pointer travel below this many pixels between press and release counts as
/// a click (pick), not a drag.
const CLICK_SLOP: f32 = 3.0;

pub fn run_viewer(
    mut scene: MapScene,
    seed_objects: Vec<PlacedObject>,
    metrics: TileMetrics,
) -> Result<(), minifb::Error> {
    let mut window = Window::new(
        "isomap - drag: pan, scroll/+/-: zoom, 1/2: layers, G: grid, R: regenerate, Esc: exit",
        INITIAL_WIDTH,
        INITIAL_HEIGHT,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(60);

    let mut frame = Frame::new(INITIAL_WIDTH, INITIAL_HEIGHT);
    let mut options = RenderOptions::default();

    let mut last_mouse_pos: Option<(f32, f32)> = None;
    let mut press_pos: Option<(f32, f32)> = None;
    let mut drag_travel = 0.0f32;

    let mut frames_since_report = 0u32;
    let mut last_report = Instant::now();

    println!("Viewer started. Controls:");
    println!("  drag       pan");
    println!("  scroll/+/- zoom");
    println!("  1 / 2      toggle terrain / object layer");
    println!("  [ / ]      terrain opacity down / up");
    println!("  G          debug grid");
    println!("  S          shadows");
    println!("  R          regenerate with a new seed");
    println!("  Esc        exit");

    while window.is_open() && !window.is_key_down(Key::Escape) {
        // Container resize is handled between frames; the next composite is a
        // full repaint of the new surface.
        let (win_w, win_h) = window.get_size();
        frame.resize(win_w, win_h);

        handle_keys(&mut window, &mut scene, &mut options, &seed_objects, metrics);

        // Zoom: scroll wheel plus +/- keys, as a direct clamped scalar set.
        if let Some((_, scroll_y)) = window.get_scroll_wheel() {
            if scroll_y > 0.0 {
                scene.camera.zoom_by(1.1);
            } else if scroll_y < 0.0 {
                scene.camera.zoom_by(1.0 / 1.1);
            }
        }

        // Pan via pointer-drag deltas; release without travel is a pick.
        let mouse_down = window.get_mouse_down(MouseButton::Left);
        let mouse_pos = window.get_mouse_pos(MouseMode::Clamp);
        if let Some((mx, my)) = mouse_pos {
            if mouse_down {
                if let Some((lx, ly)) = last_mouse_pos {
                    let (dx, dy) = (mx - lx, my - ly);
                    scene.camera.pan(dx, dy);
                    drag_travel += dx.abs() + dy.abs();
                } else {
                    press_pos = Some((mx, my));
                    drag_travel = 0.0;
                }
                last_mouse_pos = Some((mx, my));
            } else {
                if let Some((px, py)) = press_pos.take() {
                    if drag_travel < CLICK_SLOP {
                        report_pick(&scene, px, py, win_w as f32, win_h as f32);
                    }
                }
                last_mouse_pos = None;
            }
        }

        let stats = scene.render(&mut frame, &options);

        // Per-frame debug metrics, surfaced in the title bar once a second.
        frames_since_report += 1;
        let elapsed = last_report.elapsed().as_secs_f32();
        if elapsed >= 1.0 {
            let fps = frames_since_report as f32 / elapsed;
            frames_since_report = 0;
            last_report = Instant::now();
            window.set_title(&format!(
                "isomap | {:.0} fps | {} tiles | {} objects | cam ({:.0}, {:.0}) x{:.2}",
                fps,
                stats.visible_tiles,
                stats.objects_drawn,
                scene.camera.offset_x,
                scene.camera.offset_y,
                scene.camera.scale,
            ));
        }

        // If the surface is unavailable this tick, skip the frame and keep
        // the loop live.
        if let Err(e) = window.update_with_buffer(frame.buffer(), frame.width, frame.height) {
            eprintln!("frame skipped: {}", e);
        }
    }

    Ok(())
}

fn handle_keys(
    window: &mut Window,
    scene: &mut MapScene,
    options: &mut RenderOptions,
    seed_objects: &[PlacedObject],
    metrics: TileMetrics,
) {
    if window.is_key_pressed(Key::Equal, minifb::KeyRepeat::Yes) {
        scene.camera.zoom_by(1.1);
    }
    if window.is_key_pressed(Key::Minus, minifb::KeyRepeat::Yes) {
        scene.camera.zoom_by(1.0 / 1.1);
    }
    if window.is_key_pressed(Key::Key1, minifb::KeyRepeat::No) {
        let visible = scene
            .layers
            .get(TERRAIN_LAYER)
            .map(|l| l.visible)
            .unwrap_or(false);
        scene.layers.set_visible(TERRAIN_LAYER, !visible);
    }
    if window.is_key_pressed(Key::Key2, minifb::KeyRepeat::No) {
        let visible = scene
            .layers
            .get(OBJECT_LAYER)
            .map(|l| l.visible)
            .unwrap_or(false);
        scene.layers.set_visible(OBJECT_LAYER, !visible);
    }
    if window.is_key_pressed(Key::LeftBracket, minifb::KeyRepeat::Yes) {
        let opacity = scene
            .layers
            .get(TERRAIN_LAYER)
            .map(|l| l.opacity)
            .unwrap_or(1.0);
        scene.layers.set_opacity(TERRAIN_LAYER, opacity - 0.1);
    }
    if window.is_key_pressed(Key::RightBracket, minifb::KeyRepeat::Yes) {
        let opacity = scene
            .layers
            .get(TERRAIN_LAYER)
            .map(|l| l.opacity)
            .unwrap_or(1.0);
        scene.layers.set_opacity(TERRAIN_LAYER, opacity + 0.1);
    }
    if window.is_key_pressed(Key::G, minifb::KeyRepeat::No) {
        options.debug_grid = !options.debug_grid;
    }
    if window.is_key_pressed(Key::S, minifb::KeyRepeat::No) {
        options.shadows = !options.shadows;
    }
    if window.is_key_pressed(Key::R, minifb::KeyRepeat::No) {
        let seed = rand::random();
        println!("Regenerating with seed: {}", seed);
        let camera = scene.camera.clone();
        *scene = MapScene::generate(
            scene.width,
            scene.height,
            seed,
            seed_objects.to_vec(),
            metrics,
        );
        scene.camera = camera;
    }
}

/// Resolve a click and print the selection event the surrounding UI would
/// consume.
fn report_pick(scene: &MapScene, x: f32, y: f32, canvas_w: f32, canvas_h: f32) {
    match scene.pick(x, y, canvas_w, canvas_h) {
        Some(PickResult::Object {
            id,
            kind,
            name,
            tile_x,
            tile_y,
            attributes,
        }) => {
            println!(
                "Selected {} \"{}\" (id {}) at ({}, {})",
                kind.label(),
                name,
                id,
                tile_x,
                tile_y
            );
            for (key, value) in &attributes {
                println!("  {}: {}", key, value);
            }
        }
        Some(PickResult::Tile { tile_x, tile_y }) => {
            if let Some(info) = scene.tile_info(tile_x as usize, tile_y as usize) {
                println!(
                    "Tile ({}, {}): {} at {:.1}, {} (cost {:.1})",
                    tile_x,
                    tile_y,
                    info.kind.label(),
                    info.elevation,
                    if info.walkable { "walkable" } else { "blocked" },
                    info.move_cost
                );
            }
        }
        None => {}
    }
}
