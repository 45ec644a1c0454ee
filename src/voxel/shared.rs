//! Thread-safe handle to a [`VoxelWorld`].
//!
//! Readers (renderer snapshots, physics queries) share a read guard while at
//! most one writer regenerates bricks.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use glam::Vec3;

use super::query::RayHit;
use super::world::VoxelWorld;
use super::VoxelQuery;
use crate::core::Result;
use crate::generation::{CancelToken, GenerationStats, RegionConfig};
use crate::voxel::brick::BrickMetadata;

/// Cloneable shared world
#[derive(Clone, Debug)]
pub struct SharedVoxelWorld {
    inner: Arc<RwLock<VoxelWorld>>,
}

impl SharedVoxelWorld {
    pub fn new(world: VoxelWorld) -> Self {
        Self {
            inner: Arc::new(RwLock::new(world)),
        }
    }

    /// Stable view of the brick arrays for as long as the guard lives.
    ///
    /// A panic in another holder does not invalidate the brick data, so a
    /// poisoned lock is still readable.
    pub fn read(&self) -> RwLockReadGuard<'_, VoxelWorld> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Exclusive access for generation and edits
    pub fn write(&self) -> RwLockWriteGuard<'_, VoxelWorld> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Regenerate one brick slot under the write lock
    pub fn regenerate_brick(&self, index: usize) -> Result<BrickMetadata> {
        self.write().regenerate_brick(index)
    }

    /// Generate a region in the calling thread, then publish it under a
    /// short write lock. Readers are not blocked while bricks are computed.
    pub fn generate_region(&self, region: &RegionConfig, cancel: &CancelToken) -> GenerationStats {
        let generator = self.read().generator().clone();
        let (bricks, stats) = crate::generation::generate_bricks(&generator, &region.keys(), cancel);
        let mut world = self.write();
        for brick in bricks {
            world.insert_brick(brick);
        }
        stats
    }

    pub fn bricks_changed(&self) -> bool {
        self.read().bricks_changed()
    }

    /// Read guard plus whether the bricks changed since the previous
    /// snapshot.
    ///
    /// The flag is cleared while the guard is held, so no writer can
    /// publish between reading the data and consuming the flag. An update
    /// published after this call is reported by the next snapshot.
    pub fn snapshot(&self) -> (RwLockReadGuard<'_, VoxelWorld>, bool) {
        let guard = self.read();
        let changed = guard.take_changed();
        (guard, changed)
    }
}

impl VoxelQuery for SharedVoxelWorld {
    fn is_solid(&self, p: Vec3) -> bool {
        self.read().is_solid(p)
    }

    fn ray_cast(&self, origin: Vec3, direction: Vec3, max_iter: u32, max_distance: f32) -> Option<RayHit> {
        self.read().ray_cast(origin, direction, max_iter, max_distance)
    }
}
