//! Density sources that brick generation is written against.

use std::sync::Arc;

use glam::{Vec2, Vec3};

use super::density::DensityFunction;
use super::noise::DensityNrm;
use super::random::RandomContext;
use crate::math::{Aabb, MinMax};

/// Slack added to analytic sphere bounds to absorb f32 rounding
const SPHERE_BOUND_SLACK: f32 = 1e-4;

/// Signed density field over world space (negative = solid).
///
/// Implementations must be pure: the same point always yields the same
/// result, from any thread, in any order.
pub trait DensityField: Send + Sync {
    /// Density and unit normal at `p`
    fn sample(&self, p: Vec3) -> DensityNrm;

    /// Density only
    fn density(&self, p: Vec3) -> f32 {
        self.sample(p).val
    }

    /// Conservative density range over `aabb`. May be wider than the true
    /// range, never narrower.
    fn bound(&self, aabb: &Aabb) -> MinMax;
}

impl<T: DensityField + ?Sized> DensityField for Arc<T> {
    fn sample(&self, p: Vec3) -> DensityNrm {
        (**self).sample(p)
    }

    fn density(&self, p: Vec3) -> f32 {
        (**self).density(p)
    }

    fn bound(&self, aabb: &Aabb) -> MinMax {
        (**self).bound(aabb)
    }
}

/// Procedural terrain: [`DensityFunction`] over a seeded [`RandomContext`]
#[derive(Clone, Debug)]
pub struct TerrainField {
    ctx: Arc<RandomContext>,
    function: DensityFunction,
}

impl TerrainField {
    /// Create a terrain field, building the lattice table for `seed`
    pub fn new(seed: u64, function: DensityFunction) -> Self {
        Self::with_context(Arc::new(RandomContext::new(seed)), function)
    }

    /// Create a terrain field sharing an existing lattice table
    pub fn with_context(ctx: Arc<RandomContext>, function: DensityFunction) -> Self {
        Self { ctx, function }
    }

    pub fn context(&self) -> &RandomContext {
        &self.ctx
    }

    pub fn function(&self) -> &DensityFunction {
        &self.function
    }
}

impl DensityField for TerrainField {
    fn sample(&self, p: Vec3) -> DensityNrm {
        self.function.evaluate(&self.ctx, p)
    }

    fn bound(&self, aabb: &Aabb) -> MinMax {
        self.function.bound(&self.ctx, aabb.min, aabb.max)
    }
}

/// Spheres of one radius, centered at `origin` and repeated every `spacing`
/// units in X and Y. A zero spacing on an axis disables repetition on it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereField {
    pub origin: Vec3,
    pub radius: f32,
    pub spacing: Vec2,
}

impl SphereField {
    /// A single sphere
    pub fn single(center: Vec3, radius: f32) -> Self {
        Self {
            origin: center,
            radius,
            spacing: Vec2::ZERO,
        }
    }

    /// Spheres tiled across the XY plane
    pub fn tiled(origin: Vec3, radius: f32, spacing: Vec2) -> Self {
        Self { origin, radius, spacing }
    }

    fn is_tiled(&self) -> bool {
        self.spacing.x > 0.0 || self.spacing.y > 0.0
    }

    /// Center of the sphere nearest to `p`
    pub fn nearest_center(&self, p: Vec3) -> Vec3 {
        let snap = |v: f32, origin: f32, spacing: f32| {
            if spacing > 0.0 {
                origin + ((v - origin) / spacing).round() * spacing
            } else {
                origin
            }
        };
        Vec3::new(
            snap(p.x, self.origin.x, self.spacing.x),
            snap(p.y, self.origin.y, self.spacing.y),
            self.origin.z,
        )
    }
}

impl DensityField for SphereField {
    fn sample(&self, p: Vec3) -> DensityNrm {
        let offset = p - self.nearest_center(p);
        DensityNrm {
            val: offset.length() - self.radius,
            nrm: offset.try_normalize().unwrap_or(Vec3::Z),
        }
    }

    fn bound(&self, aabb: &Aabb) -> MinMax {
        let slack = SPHERE_BOUND_SLACK * (1.0 + self.radius.abs());
        if self.is_tiled() {
            // Distance to the nearest of many centers is 1-Lipschitz
            let at_center = self.density(aabb.center());
            return MinMax::around(at_center, aabb.half_extent().length())
                .clamped(-self.radius, f32::INFINITY)
                .widened(slack);
        }
        MinMax {
            min: aabb.distance_to_point(self.origin) - self.radius,
            max: aabb.max_distance_to_point(self.origin) - self.radius,
        }
        .widened(slack)
    }
}
