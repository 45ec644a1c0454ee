//! Fractal terrain density: vertical gradient plus rotated noise octaves

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use super::noise::{self, DensityNrm};
use super::random::RandomContext;
use crate::math::MinMax;

/// Octave counts above this are treated as this many octaves; later octaves
/// would push the lattice scale past f32 precision.
pub const MAX_OCTAVES: u32 = 16;

/// Rotation applied to the domain before every octave.
/// Orthonormal, so its inverse is its transpose.
pub const OCTAVE_ROTATION: Mat3 = Mat3::from_cols_array(&[
    0.00, -0.80, -0.60,
    0.80, 0.36, -0.48,
    0.60, -0.48, 0.64,
]);

/// Inverse of [`OCTAVE_ROTATION`]
pub const OCTAVE_ROTATION_INV: Mat3 = Mat3::from_cols_array(&[
    0.00, 0.80, 0.60,
    -0.80, 0.36, -0.48,
    -0.60, -0.48, 0.64,
]);

/// Parameters controlling the fractal noise layers
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub scale: f32,       // Lattice cells per world unit for the first octave
    pub amplitude: f32,   // Density amplitude of the first octave
    pub persistence: f32, // Amplitude multiplier per octave (0.5 typical)
    pub lacunarity: f32,  // Frequency multiplier per octave (2.0 typical)
    pub octaves: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 1.0 / 32.0,
            amplitude: 12.0,
            persistence: 0.5,
            lacunarity: 2.0,
            octaves: 4,
        }
    }
}

/// Linear vertical term defining the ground plane `z = offset`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientSettings {
    pub offset: f32,
    pub slope: f32,
}

impl Default for GradientSettings {
    fn default() -> Self {
        Self {
            offset: 24.0,
            slope: 1.0,
        }
    }
}

/// Signed terrain density: negative is solid, non-negative is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityFunction {
    pub noise: NoiseSettings,
    pub gradient: GradientSettings,
}

impl DensityFunction {
    pub fn new(noise: NoiseSettings, gradient: GradientSettings) -> Self {
        Self { noise, gradient }
    }

    fn octave_count(&self) -> u32 {
        self.noise.octaves.min(MAX_OCTAVES)
    }

    /// Evaluate density and surface normal at `p`.
    ///
    /// The returned normal is the normalized gradient, or +Z when the
    /// gradient vanishes.
    pub fn evaluate(&self, ctx: &RandomContext, p: Vec3) -> DensityNrm {
        let g = self.gradient;
        let mut val = (p.z - g.offset) * g.slope;
        let mut grad = Vec3::new(0.0, 0.0, g.slope);

        let mut q = p;
        let mut to_world = Mat3::IDENTITY;
        let mut scale = self.noise.scale;
        let mut amplitude = self.noise.amplitude;

        for _ in 0..self.octave_count() {
            q = OCTAVE_ROTATION * q;
            to_world = to_world * OCTAVE_ROTATION_INV;

            let octave = noise::sample(ctx, q, scale, amplitude);
            val += octave.val;
            grad += to_world * octave.nrm;

            scale *= self.noise.lacunarity;
            amplitude *= self.noise.persistence;
        }

        let nrm = grad.try_normalize().unwrap_or(Vec3::Z);
        DensityNrm { val, nrm }
    }

    /// Conservative density range over the box `[box_min, box_max]`.
    ///
    /// Mirrors [`evaluate`](Self::evaluate): the vertical term is bounded
    /// exactly from the box's z extent, then each octave adds the noise
    /// bound around the rotated box center. The rotated half-extent is
    /// `|R| * h`, which encloses the rotated box.
    pub fn bound(&self, ctx: &RandomContext, box_min: Vec3, box_max: Vec3) -> MinMax {
        let g = self.gradient;
        let mut range = MinMax::new(
            (box_min.z - g.offset) * g.slope,
            (box_max.z - g.offset) * g.slope,
        );

        let half = ((box_max - box_min) * 0.5).abs();
        let mut center = (box_min + box_max) * 0.5;
        let mut rotation = Mat3::IDENTITY;
        let mut scale = self.noise.scale;
        let mut amplitude = self.noise.amplitude;

        for _ in 0..self.octave_count() {
            center = OCTAVE_ROTATION * center;
            rotation = OCTAVE_ROTATION * rotation;
            let rotated_half = rotation.abs() * half;

            range = range + noise::bound(ctx, center, rotated_half, scale, amplitude);

            scale *= self.noise.lacunarity;
            amplitude *= self.noise.persistence;
        }

        range
    }
}
