use std::collections::BTreeMap;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

mod camera;
mod grid;
mod layers;
mod picking;
mod render;
mod scene;
mod seeds;
mod terrain;
mod tiles;
mod tileset;
mod transform;
mod viewer;

use layers::{ObjectKind, PlacedObject};
use render::{Frame, RenderOptions};
use scene::MapScene;
use transform::TileMetrics;

#[derive(Parser, Debug)]
#[command(name = "isomap")]
#[command(about = "Isometric tile map viewer with procedural terrain")]
struct Args {
    /// Width of the map in tiles
    #[arg(short = 'W', long, default_value = "48")]
    width: usize,

    /// Height of the map in tiles
    #[arg(short = 'H', long, default_value = "32")]
    height: usize,

    /// Random seed (uses a random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of demo cities to place
    #[arg(short = 'c', long, default_value = "5")]
    cities: usize,

    /// Number of demo armies to place
    #[arg(short = 'a', long, default_value = "3")]
    armies: usize,

    /// Export one composited frame to a PNG instead of opening the viewer
    #[arg(long)]
    export: Option<String>,
}

const CITY_NAMES: [&str; 8] = [
    "Karst", "Veyra", "Oldmere", "Thornwall", "Dunhollow", "Bray", "Ashford", "Netherby",
];
const KINGDOMS: [&str; 4] = ["Aldren", "Corvel", "Ishtar", "Morholt"];

fn main() {
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    let metrics = TileMetrics::default();

    // The city/army seed entities normally come from the surrounding
    // application; this binary plays that role with a demo roster.
    let objects = demo_objects(args.width, args.height, args.cities, args.armies, seed);
    let scene = MapScene::generate(args.width, args.height, seed, objects.clone(), metrics);
    println!(
        "Map ready: {} objects placed, seed {}",
        scene.object_count(),
        seed
    );

    if let Some(ref path) = args.export {
        match export_frame(&scene, path) {
            Ok(()) => println!("Exported frame to: {}", path),
            Err(e) => eprintln!("Failed to export frame: {}", e),
        }
        return;
    }

    if let Err(e) = viewer::run_viewer(scene, objects, metrics) {
        eprintln!("Viewer error: {}", e);
    }
}

/// Build the demo roster: cities with 2x2 footprints on interior tiles,
/// armies on single tiles, all derived from the map seed.
fn demo_objects(
    width: usize,
    height: usize,
    cities: usize,
    armies: usize,
    seed: u64,
) -> Vec<PlacedObject> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xC17E5);
    let mut objects = Vec::new();

    if width < 6 || height < 6 {
        return objects;
    }

    for i in 0..cities {
        let name = CITY_NAMES[i % CITY_NAMES.len()];
        let kingdom = KINGDOMS[i % KINGDOMS.len()];
        let mut attributes = BTreeMap::new();
        attributes.insert("kingdom".to_string(), kingdom.to_string());
        attributes.insert("level".to_string(), rng.gen_range(1..=10).to_string());
        attributes.insert(
            "population".to_string(),
            rng.gen_range(400..20_000).to_string(),
        );
        objects.push(PlacedObject {
            id: i as u32 + 1,
            kind: ObjectKind::City,
            name: name.to_string(),
            tile_x: rng.gen_range(2..width as i32 - 3),
            tile_y: rng.gen_range(2..height as i32 - 3),
            tile_z: 0.0,
            footprint_w: 2,
            footprint_h: 2,
            attributes,
        });
    }

    for i in 0..armies {
        let mut attributes = BTreeMap::new();
        attributes.insert("strength".to_string(), rng.gen_range(50..800).to_string());
        objects.push(PlacedObject {
            id: (cities + i) as u32 + 1,
            kind: ObjectKind::Army,
            name: format!("{} host", KINGDOMS[i % KINGDOMS.len()]),
            tile_x: rng.gen_range(1..width as i32 - 1),
            tile_y: rng.gen_range(1..height as i32 - 1),
            tile_z: 0.0,
            footprint_w: 1,
            footprint_h: 1,
            attributes,
        });
    }

    objects
}

/// Composite one frame offscreen and write it as a PNG.
fn export_frame(scene: &MapScene, path: &str) -> image::ImageResult<()> {
    let (width, height) = (1280usize, 900usize);
    let mut frame = Frame::new(width, height);
    let stats = scene.render(&mut frame, &RenderOptions::default());
    println!(
        "Composited {} tiles, {} objects ({} culled)",
        stats.visible_tiles, stats.objects_drawn, stats.culled_tiles
    );

    let mut img = image::RgbImage::new(width as u32, height as u32);
    for (i, &px) in frame.buffer().iter().enumerate() {
        let x = (i % width) as u32;
        let y = (i / width) as u32;
        img.put_pixel(x, y, image::Rgb([(px >> 16) as u8, (px >> 8) as u8, px as u8]));
    }
    img.save(path)
}
