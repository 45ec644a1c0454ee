//! Voxel data structures and queries

pub mod hierarchy;
pub mod brick;
pub mod codec;
pub mod query;
pub mod world;
pub mod shared;

pub use brick::{BrickAttributes, BrickBitmask, BrickMetadata, BrickPosition, Face};
pub use hierarchy::{BrickKey, ChunkCoord};
pub use query::RayHit;
pub use shared::SharedVoxelWorld;
pub use world::VoxelWorld;

use glam::Vec3;

/// Renderer-facing view of the brick collection.
///
/// Bitmasks and positions are index-aligned and `Pod`, so they can be
/// uploaded as-is. The consumer polls [`BrickSource::bricks_changed`],
/// reads, then calls [`BrickSource::mark_consumed`].
pub trait BrickSource {
    fn brick_bitmasks(&self) -> &[BrickBitmask];
    fn brick_positions(&self) -> &[BrickPosition];
    fn brick_count(&self) -> usize;
    fn bricks_changed(&self) -> bool;
    fn mark_consumed(&self);

    /// Bitmask array as raw bytes (64 per brick)
    fn bitmask_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.brick_bitmasks())
    }

    /// Position array as raw bytes (16 per brick)
    fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.brick_positions())
    }
}

/// Spatial queries against stored level-0 voxels
pub trait VoxelQuery {
    /// Solidity of the voxel containing `p`; false outside stored bricks
    fn is_solid(&self, p: Vec3) -> bool;

    /// First solid voxel along the ray, or `None` on a miss
    fn ray_cast(&self, origin: Vec3, direction: Vec3, max_iter: u32, max_distance: f32) -> Option<RayHit>;
}

impl BrickSource for VoxelWorld {
    fn brick_bitmasks(&self) -> &[BrickBitmask] {
        VoxelWorld::brick_bitmasks(self)
    }

    fn brick_positions(&self) -> &[BrickPosition] {
        VoxelWorld::brick_positions(self)
    }

    fn brick_count(&self) -> usize {
        VoxelWorld::brick_count(self)
    }

    fn bricks_changed(&self) -> bool {
        VoxelWorld::bricks_changed(self)
    }

    fn mark_consumed(&self) {
        VoxelWorld::mark_consumed(self)
    }
}

impl VoxelQuery for VoxelWorld {
    fn is_solid(&self, p: Vec3) -> bool {
        VoxelWorld::is_solid(self, p)
    }

    fn ray_cast(&self, origin: Vec3, direction: Vec3, max_iter: u32, max_distance: f32) -> Option<RayHit> {
        VoxelWorld::ray_cast(self, origin, direction, max_iter, max_distance)
    }
}
