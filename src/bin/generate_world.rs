//! World generator binary: builds a brick world and optionally dumps it.
//!
//! Usage: cargo run --release --bin generate_world -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>     JSON world config (default: built-in defaults)
//!   --seed <SEED>       Random seed override
//!   --size <BRICKS>     Horizontal region size in bricks per side
//!   --spheres <RADIUS>  Use tiled spheres instead of terrain
//!   --jobs <N>          Worker threads (default: all cores)
//!   --out <DIR>         Write manifest.json, bitmasks.bin, positions.bin
//!
//! Output structure:
//!   <DIR>/
//!     manifest.json   # Config, stats, per-brick position + metadata
//!     bitmasks.bin    # 64 bytes per brick
//!     positions.bin   # 16 bytes per brick (x, y, z, level as i32)

use std::collections::BTreeMap;
use std::path::PathBuf;

use glam::IVec3;
use serde_json::json;

use brickworld::core::Result;
use brickworld::generation::{BrickGenerator, CancelToken, SeedShape, WorldConfig};
use brickworld::voxel::{BrickSource, VoxelWorld};

fn main() -> Result<()> {
    brickworld::core::logging::init();

    let args: Vec<String> = std::env::args().collect();

    let mut config = match parse_str_arg(&args, "--config") {
        Some(path) => WorldConfig::load(&path)?,
        None => WorldConfig::default(),
    };
    if let Some(seed) = parse_u64_arg(&args, "--seed") {
        config.seed = seed;
    }
    if let Some(size) = parse_i32_arg(&args, "--size") {
        let half = size / 2;
        config.region.min = IVec3::new(-half, -half, config.region.min.z);
        config.region.max = IVec3::new(size - half, size - half, config.region.max.z);
    }
    if let Some(radius) = parse_f32_arg(&args, "--spheres") {
        config.shape = SeedShape::Spheres { radius, tile_bricks: 4 };
    }
    config.validate()?;

    if let Some(jobs) = parse_usize_arg(&args, "--jobs") {
        if let Err(err) = rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
            log::warn!("Could not configure thread pool: {}", err);
        }
    }
    let out_dir = parse_str_arg(&args, "--out").map(PathBuf::from);

    let extent = config.region.extent();
    println!("=== Brickworld Generator ===");
    println!("Seed:   {}", config.seed);
    println!("Shape:  {:?}", config.shape);
    println!("Region: {:?} .. {:?} ({} x {} x {} bricks)", config.region.min, config.region.max, extent.x, extent.y, extent.z);
    println!("Jobs:   {} threads", rayon::current_num_threads());
    if let Some(dir) = &out_dir {
        println!("Output: {}", dir.display());
    }
    println!();

    let mut world = VoxelWorld::new(BrickGenerator::from_config(&config));
    let stats = world.generate_region(&config.region, &CancelToken::new());

    let solid_voxels: u64 = world.brick_bitmasks().iter().map(|b| b.count_solid() as u64).sum();
    let mut z_layers: BTreeMap<i32, usize> = BTreeMap::new();
    for position in world.brick_positions() {
        *z_layers.entry(position.z).or_insert(0) += 1;
    }

    println!(
        "Bricks: {} with geometry out of {} ({} bound-empty, {} bound-solid, {} evaluated)",
        stats.with_geometry, stats.requested, stats.bound_empty, stats.bound_solid, stats.evaluated
    );
    println!("Voxels: {} solid", solid_voxels);
    println!("Time:   {:.2}s ({:.0} bricks/sec)", stats.elapsed.as_secs_f64(), stats.bricks_per_sec());
    for (z, count) in &z_layers {
        println!("  z={:>3}: {} bricks", z, count);
    }

    let Some(dir) = out_dir else {
        return Ok(());
    };
    std::fs::create_dir_all(&dir)?;

    let bricks: Vec<_> = world
        .brick_positions()
        .iter()
        .zip(world.brick_metadata())
        .map(|(p, m)| json!({ "position": [p.x, p.y, p.z, p.w], "metadata": m.0 }))
        .collect();
    let manifest = json!({
        "version": 1,
        "config": config,
        "stats": {
            "requested": stats.requested,
            "completed": stats.completed,
            "with_geometry": stats.with_geometry,
            "bound_empty": stats.bound_empty,
            "bound_solid": stats.bound_solid,
            "evaluated": stats.evaluated,
            "cancelled": stats.cancelled,
            "elapsed_secs": stats.elapsed.as_secs_f64(),
        },
        "brick_count": world.brick_count(),
        "solid_voxels": solid_voxels,
        "bricks": bricks,
    });
    std::fs::write(dir.join("manifest.json"), serde_json::to_string_pretty(&manifest)?)?;
    std::fs::write(dir.join("bitmasks.bin"), world.bitmask_bytes())?;
    std::fs::write(dir.join("positions.bin"), world.position_bytes())?;

    println!();
    println!("Wrote {} bricks to {}", world.brick_count(), dir.display());
    Ok(())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    parse_str_arg(args, flag).and_then(|s| s.parse().ok())
}

fn parse_u64_arg(args: &[String], flag: &str) -> Option<u64> {
    parse_str_arg(args, flag).and_then(|s| s.parse().ok())
}

fn parse_i32_arg(args: &[String], flag: &str) -> Option<i32> {
    parse_str_arg(args, flag).and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    parse_str_arg(args, flag).and_then(|s| s.parse().ok())
}
