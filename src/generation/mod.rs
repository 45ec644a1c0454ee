//! World generation pipeline: classifies and fills bricks from a density
//! field, in parallel across bricks.
//!
//! Each worker owns the output of exactly one brick at a time; bricks are
//! published only once complete, so cancellation never exposes a partially
//! generated brick.

pub mod config;
pub mod classifier;
pub mod brick_gen;

pub use config::{MaterialSettings, RegionConfig, SeedShape, WorldConfig, MAX_REGION_BRICKS};
pub use classifier::{classify_brick, RegionHint};
pub use brick_gen::{BrickGenerator, GeneratedBrick};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::voxel::hierarchy::BrickKey;

/// Shared flag checked between bricks to abandon a generation run
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters for one generation run
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GenerationStats {
    /// Bricks asked for
    pub requested: usize,
    /// Bricks completed before cancellation (or all of them)
    pub completed: usize,
    /// Completed bricks with at least one solid voxel
    pub with_geometry: usize,
    /// Bricks resolved as empty from the bound alone
    pub bound_empty: usize,
    /// Bricks resolved as solid from the bound alone
    pub bound_solid: usize,
    /// Bricks that needed per-voxel evaluation
    pub evaluated: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl GenerationStats {
    /// Bricks per second over the whole run
    pub fn bricks_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 { self.completed as f64 / secs } else { 0.0 }
    }
}

/// Generate every brick in `keys` in parallel.
///
/// Returns the bricks that contain geometry, in the order of `keys`. When
/// `cancel` fires, bricks not yet started are skipped and only completed
/// bricks are returned.
pub fn generate_bricks(
    generator: &BrickGenerator,
    keys: &[BrickKey],
    cancel: &CancelToken,
) -> (Vec<GeneratedBrick>, GenerationStats) {
    log::info!("Generating {} candidate bricks...", keys.len());

    let start = Instant::now();
    let results: Vec<Option<GeneratedBrick>> = keys
        .par_iter()
        .map(|&key| {
            if cancel.is_cancelled() {
                None
            } else {
                Some(generator.generate_bitmask(key))
            }
        })
        .collect();

    let mut stats = GenerationStats {
        requested: keys.len(),
        cancelled: cancel.is_cancelled(),
        ..Default::default()
    };
    let mut bricks = Vec::new();
    for brick in results.into_iter().flatten() {
        stats.completed += 1;
        match brick.hint {
            RegionHint::Empty => stats.bound_empty += 1,
            RegionHint::Solid => stats.bound_solid += 1,
            RegionHint::Mixed => stats.evaluated += 1,
        }
        if brick.has_geometry() {
            bricks.push(brick);
        }
    }
    stats.with_geometry = bricks.len();
    stats.elapsed = start.elapsed();

    if stats.cancelled {
        log::warn!("Generation cancelled after {}/{} bricks", stats.completed, stats.requested);
    }
    log::info!(
        "Generated {} bricks with geometry in {:.2}s ({:.0} bricks/sec, {} empty, {} solid, {} evaluated)",
        stats.with_geometry,
        stats.elapsed.as_secs_f64(),
        stats.bricks_per_sec(),
        stats.bound_empty,
        stats.bound_solid,
        stats.evaluated,
    );

    (bricks, stats)
}
