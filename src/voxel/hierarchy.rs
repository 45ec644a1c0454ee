//! Voxel hierarchy constants and coordinate conversions.
//!
//! Defines the spatial hierarchy:
//! - Chunk (8x8x8 bricks): grouping unit for generation requests
//! - Brick (8x8x8 voxels): atomic unit of storage and generation
//! - Voxel: one bitmask bit, `2^level / VOXELS_PER_UNIT` world units wide

use glam::{IVec3, UVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::math::Aabb;

/// log2 of the brick side length
pub const BRICK_SIZE_LOG2: u32 = 3;

/// Brick size in voxels (8x8x8)
pub const BRICK_SIZE: u32 = 1 << BRICK_SIZE_LOG2;

/// Number of voxels per brick (512)
pub const BRICK_VOXELS: usize = (BRICK_SIZE * BRICK_SIZE * BRICK_SIZE) as usize;

/// 32-bit words needed for one brick's bitmask (16)
pub const BITMASK_WORDS: usize = BRICK_VOXELS.div_ceil(32);

/// Level-0 voxels per world unit (0.5 unit voxels)
pub const VOXELS_PER_UNIT: f32 = 2.0;

/// Level-0 voxel size in world units
pub const VOXEL_SIZE: f32 = 1.0 / VOXELS_PER_UNIT;

/// Bricks per chunk dimension
pub const CHUNK_BRICKS: i32 = 8;

/// Number of LOD levels; level 0 is the finest. Each level doubles the
/// voxel spacing.
pub const MAX_LOD_LEVELS: u32 = 6;

/// Largest level-0 voxel coordinate magnitude addressable by queries and
/// generation. Leaves headroom below `i32::MAX` for traversal steps.
pub const MAX_VOXEL_COORD: i32 = 1 << 30;

const BRICK_MASK: i32 = BRICK_SIZE as i32 - 1;

/// Integer coordinate identifying a chunk of bricks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Coordinate of the chunk's first brick
    pub fn first_brick(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z) * CHUNK_BRICKS
    }
}

/// Identifies one brick: brick grid coordinate at a given LOD level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BrickKey {
    pub coord: IVec3,
    pub level: u32,
}

impl BrickKey {
    pub fn new(coord: IVec3, level: u32) -> Self {
        Self { coord, level }
    }

    /// Level-0 brick at `coord`
    pub fn level0(coord: IVec3) -> Self {
        Self { coord, level: 0 }
    }

    /// Brick `local` (0..CHUNK_BRICKS per axis) inside `chunk`
    pub fn from_chunk(chunk: ChunkCoord, local: IVec3, level: u32) -> Self {
        Self {
            coord: chunk.first_brick() + local,
            level,
        }
    }

    /// True when the level is one the generator supports
    pub fn is_valid_level(&self) -> bool {
        self.level < MAX_LOD_LEVELS
    }

    /// Width of one of this brick's voxels, in level-0 voxels
    pub fn voxel_span(&self) -> i32 {
        1 << self.level.min(MAX_LOD_LEVELS - 1)
    }

    /// Level-0 voxel index of the brick's minimum corner
    pub fn voxel_origin(&self) -> IVec3 {
        (self.coord * BRICK_SIZE as i32) * self.voxel_span()
    }

    /// World-space center of local voxel `local`:
    /// `((local << level) + origin + span / 2) / VOXELS_PER_UNIT`
    pub fn voxel_center(&self, local: UVec3) -> Vec3 {
        let span = self.voxel_span();
        let index = self.voxel_origin() + local.as_ivec3() * span;
        (index.as_vec3() + Vec3::splat(span as f32 * 0.5)) / VOXELS_PER_UNIT
    }

    /// World-space box covered by the brick
    pub fn world_bounds(&self) -> Aabb {
        let min = self.voxel_origin().as_vec3() / VOXELS_PER_UNIT;
        let size = (BRICK_SIZE as i32 * self.voxel_span()) as f32 / VOXELS_PER_UNIT;
        Aabb::new(min, min + Vec3::splat(size))
    }
}

/// Brick-local linear index: x fastest, then y, then z
#[inline]
pub fn voxel_index(x: u32, y: u32, z: u32) -> usize {
    debug_assert!(x < BRICK_SIZE && y < BRICK_SIZE && z < BRICK_SIZE);
    (x | (y << BRICK_SIZE_LOG2) | (z << (2 * BRICK_SIZE_LOG2))) as usize
}

/// Inverse of [`voxel_index`]
#[inline]
pub fn voxel_coords(index: usize) -> UVec3 {
    debug_assert!(index < BRICK_VOXELS);
    let i = index as u32;
    UVec3::new(i & BRICK_MASK as u32, (i >> BRICK_SIZE_LOG2) & BRICK_MASK as u32, i >> (2 * BRICK_SIZE_LOG2))
}

/// Level-0 voxel containing world point `p`.
///
/// `None` for non-finite input or a point beyond [`MAX_VOXEL_COORD`].
pub fn world_to_voxel(p: Vec3) -> Option<IVec3> {
    let v = (p * VOXELS_PER_UNIT).floor();
    if !v.is_finite() || v.abs().max_element() > MAX_VOXEL_COORD as f32 {
        return None;
    }
    Some(v.as_ivec3())
}

/// Split a level-0 voxel index into brick coordinate and brick-local voxel
pub fn voxel_to_brick(voxel: IVec3) -> (IVec3, UVec3) {
    let brick = voxel >> BRICK_SIZE_LOG2 as i32;
    let local = (voxel & IVec3::splat(BRICK_MASK)).as_uvec3();
    (brick, local)
}
