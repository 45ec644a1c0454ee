//! Bound-based brick classification.
//!
//! A density bound over a brick's voxel centers decides, without per-voxel
//! evaluation, whether the brick is entirely empty or entirely solid.

use glam::UVec3;

use crate::math::{Aabb, MinMax};
use crate::terrain::DensityField;
use crate::voxel::hierarchy::{BrickKey, BRICK_SIZE};

/// Hint about a brick's content derived from a density bound
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionHint {
    /// Density is non-negative everywhere: no voxel is solid
    Empty,
    /// Density is negative everywhere: every voxel is solid
    Solid,
    /// Bound straddles zero, evaluate voxels individually
    Mixed,
}

impl RegionHint {
    /// Classify a density interval
    pub fn from_bound(bound: MinMax) -> Self {
        if bound.min >= 0.0 {
            RegionHint::Empty
        } else if bound.max < 0.0 {
            RegionHint::Solid
        } else {
            // NaN bounds also land here
            RegionHint::Mixed
        }
    }

    /// Returns true if voxel evaluation can be skipped
    pub fn is_terminal(&self) -> bool {
        matches!(self, RegionHint::Empty | RegionHint::Solid)
    }

    /// Returns true if voxels must be evaluated one by one
    pub fn needs_evaluation(&self) -> bool {
        matches!(self, RegionHint::Mixed)
    }
}

/// Box spanning the centers of every voxel in the brick.
///
/// Voxels are sampled at their centers, so this is the tightest region the
/// bound has to cover.
pub fn sample_bounds(key: BrickKey) -> Aabb {
    let first = key.voxel_center(UVec3::ZERO);
    let last = key.voxel_center(UVec3::splat(BRICK_SIZE - 1));
    Aabb::new(first.min(last), first.max(last))
}

/// Classify a brick against a field
pub fn classify_brick(field: &dyn DensityField, key: BrickKey) -> RegionHint {
    if !key.is_valid_level() {
        return RegionHint::Empty;
    }
    let bounds = sample_bounds(key);
    if !bounds.min.is_finite() || !bounds.max.is_finite() {
        return RegionHint::Mixed;
    }
    RegionHint::from_bound(field.bound(&bounds))
}
