//! Per-brick voxel generation from a density field.

use std::sync::Arc;

use glam::{IVec3, UVec3, Vec3};

use super::classifier::{classify_brick, RegionHint};
use super::config::{MaterialSettings, WorldConfig};
use crate::terrain::{DensityField, DensityNrm};
use crate::voxel::brick::{BrickAttributes, BrickBitmask, BrickMetadata};
use crate::voxel::codec::pack_voxel;
use crate::voxel::hierarchy::{voxel_coords, BrickKey, ChunkCoord, BRICK_VOXELS};

/// Output of bitmask generation for one brick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeneratedBrick {
    pub key: BrickKey,
    pub bitmask: BrickBitmask,
    pub metadata: BrickMetadata,
    /// How the brick was resolved: `Mixed` bricks were evaluated per voxel
    pub hint: RegionHint,
}

impl GeneratedBrick {
    /// True if at least one voxel is solid
    pub fn has_geometry(&self) -> bool {
        self.metadata.any_solid()
    }
}

/// Integer hash for stable per-voxel dithering
fn hash_3d(x: i32, y: i32, z: i32, seed: u32) -> u32 {
    let mut h = seed;
    h ^= x as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h ^= y as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h ^= z as u32;
    h = h.wrapping_mul(0x45d9f3b);
    h ^= h >> 16;
    h
}

/// Random direction within `half_angle` of unit vector `n`, driven by `hash`
fn jitter_in_cone(n: Vec3, half_angle: f32, hash: u32) -> Vec3 {
    if half_angle <= 0.0 {
        return n;
    }
    let u1 = (hash & 0xFFFF) as f32 / 65535.0;
    let u2 = (hash >> 16) as f32 / 65535.0;
    let cos_theta = 1.0 - u1 * (1.0 - half_angle.cos());
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let phi = std::f32::consts::TAU * u2;
    let (t, b) = n.any_orthonormal_pair();
    (n * cos_theta + (t * phi.cos() + b * phi.sin()) * sin_theta)
        .try_normalize()
        .unwrap_or(n)
}

/// Evaluates a density field brick by brick.
///
/// Stateless apart from the shared field, so one generator can be used from
/// any number of worker threads at once.
#[derive(Clone)]
pub struct BrickGenerator {
    field: Arc<dyn DensityField>,
    materials: MaterialSettings,
}

impl BrickGenerator {
    pub fn new(field: Arc<dyn DensityField>, materials: MaterialSettings) -> Self {
        Self { field, materials }
    }

    /// Generator for the field and materials described by `config`
    pub fn from_config(config: &WorldConfig) -> Self {
        Self::new(config.field(), config.materials)
    }

    pub fn field(&self) -> &dyn DensityField {
        self.field.as_ref()
    }

    pub fn materials(&self) -> &MaterialSettings {
        &self.materials
    }

    /// Bound-based classification of the brick
    pub fn classify(&self, key: BrickKey) -> RegionHint {
        classify_brick(self.field.as_ref(), key)
    }

    /// Sample the field at every voxel center, in brick-local order
    pub fn evaluate_voxels(&self, key: BrickKey) -> Vec<DensityNrm> {
        (0..BRICK_VOXELS)
            .map(|i| self.field.sample(key.voxel_center(voxel_coords(i))))
            .collect()
    }

    /// Solid/empty bitmask and metadata for one brick.
    ///
    /// A voxel is solid when the density at its center is negative. Bricks
    /// whose bound is entirely on one side of zero skip voxel evaluation.
    /// Levels outside the supported range produce an empty brick.
    pub fn generate_bitmask(&self, key: BrickKey) -> GeneratedBrick {
        let hint = self.classify(key);
        let bitmask = match hint {
            RegionHint::Empty => BrickBitmask::EMPTY,
            RegionHint::Solid => BrickBitmask::FULL,
            RegionHint::Mixed => {
                let mut bitmask = BrickBitmask::EMPTY;
                for i in 0..BRICK_VOXELS {
                    let p = key.voxel_center(voxel_coords(i));
                    if self.field.density(p) < 0.0 {
                        bitmask.set(i, true);
                    }
                }
                bitmask
            }
        };
        GeneratedBrick {
            key,
            bitmask,
            metadata: BrickMetadata::from_bitmask(&bitmask),
            hint,
        }
    }

    /// Generate brick `local` of `chunk` at `level`
    pub fn generate_in_chunk(&self, chunk: ChunkCoord, local: IVec3, level: u32) -> GeneratedBrick {
        self.generate_bitmask(BrickKey::from_chunk(chunk, local, level))
    }

    /// Color and shading normal for every solid voxel of a brick.
    ///
    /// Empty voxels keep a zero word. The normal dither is seeded by the
    /// voxel's brick-local coordinates, so it does not change when the
    /// same content appears in another brick.
    pub fn generate_attributes(&self, key: BrickKey, bitmask: &BrickBitmask) -> BrickAttributes {
        let mut attributes = BrickAttributes::new();
        if bitmask.is_empty() {
            return attributes;
        }
        for i in 0..BRICK_VOXELS {
            if !bitmask.get(i) {
                continue;
            }
            let local = voxel_coords(i);
            let sample = self.field.sample(key.voxel_center(local));
            attributes.voxels[i] = self.shade(local, sample);
        }
        attributes
    }

    fn shade(&self, local: UVec3, sample: DensityNrm) -> u32 {
        let m = &self.materials;
        let color = if sample.nrm.z > m.grass_min_up && sample.val > m.grass_min_density {
            m.grass_color
        } else {
            m.dirt_color
        };
        let hash = hash_3d(local.x as i32, local.y as i32, local.z as i32, m.jitter_seed);
        pack_voxel(color, jitter_in_cone(sample.nrm, m.normal_jitter, hash))
    }
}

impl std::fmt::Debug for BrickGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrickGenerator")
            .field("materials", &self.materials)
            .finish_non_exhaustive()
    }
}
