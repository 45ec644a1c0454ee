//! Tricubic value noise with analytic gradient and Lipschitz region bound

use glam::Vec3;

use super::random::RandomContext;
use crate::math::MinMax;

/// Upper bound on |d(noise)/dx| per axis for unit scale and amplitude:
/// the [0,1] lattice value is rescaled by 2 and the smoothstep derivative
/// peaks at 1.5.
pub const NOISE_LIPSCHITZ: f32 = 2.0 * 1.5;

/// Relative slack added to region bounds to absorb f32 rounding
const BOUND_SLACK: f32 = 1e-4;

/// Density value paired with its gradient
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DensityNrm {
    pub val: f32,
    pub nrm: Vec3,
}

impl DensityNrm {
    pub fn new(val: f32, nrm: Vec3) -> Self {
        Self { val, nrm }
    }
}

/// Sample the noise at `p`.
///
/// The point is scaled into lattice space, the 8 surrounding lattice values
/// are blended with `3t^2 - 2t^3`, and the result is rescaled from `[0,1]`
/// to `[-amplitude, amplitude]`. The returned gradient is with respect to
/// `p` (chain-ruled through `scale`).
pub fn sample(ctx: &RandomContext, p: Vec3, scale: f32, amplitude: f32) -> DensityNrm {
    let q = p * scale;
    let cell = q.floor();
    let f = q - cell;

    let ix = cell.x as i32;
    let iy = cell.y as i32;
    let iz = cell.z as i32;
    let jx = ix.wrapping_add(1);
    let jy = iy.wrapping_add(1);
    let jz = iz.wrapping_add(1);

    let a = ctx.lattice(ix, iy, iz);
    let b = ctx.lattice(jx, iy, iz);
    let c = ctx.lattice(ix, jy, iz);
    let d = ctx.lattice(jx, jy, iz);
    let e = ctx.lattice(ix, iy, jz);
    let g = ctx.lattice(jx, iy, jz);
    let h = ctx.lattice(ix, jy, jz);
    let k = ctx.lattice(jx, jy, jz);

    let u = f * f * (Vec3::splat(3.0) - 2.0 * f);
    let du = 6.0 * f * (Vec3::ONE - f);

    let k0 = a;
    let k1 = b - a;
    let k2 = c - a;
    let k3 = e - a;
    let k4 = a - b - c + d;
    let k5 = a - c - e + h;
    let k6 = a - b - e + g;
    let k7 = -a + b + c - d + e - g - h + k;

    let v = k0
        + k1 * u.x
        + k2 * u.y
        + k3 * u.z
        + k4 * u.x * u.y
        + k5 * u.y * u.z
        + k6 * u.z * u.x
        + k7 * u.x * u.y * u.z;

    let dv = du * Vec3::new(
        k1 + k4 * u.y + k6 * u.z + k7 * u.y * u.z,
        k2 + k5 * u.z + k4 * u.x + k7 * u.z * u.x,
        k3 + k6 * u.x + k5 * u.y + k7 * u.x * u.y,
    );

    DensityNrm {
        val: (2.0 * v - 1.0) * amplitude,
        nrm: dv * (2.0 * scale * amplitude),
    }
}

/// Conservative range of [`sample`] over the box `center ± half_extent`.
///
/// Each partial derivative is bounded by `NOISE_LIPSCHITZ * scale * amplitude`,
/// so the value can drift from the center sample by at most that times the
/// L1 length of the half-extent. The result is also clamped to the
/// `[-amplitude, amplitude]` range the noise can reach at all.
pub fn bound(
    ctx: &RandomContext,
    center: Vec3,
    half_extent: Vec3,
    scale: f32,
    amplitude: f32,
) -> MinMax {
    let amp = amplitude.abs();
    let at_center = sample(ctx, center, scale, amplitude).val;
    let reach = NOISE_LIPSCHITZ * scale.abs() * amp * half_extent.abs().element_sum();
    MinMax::around(at_center, reach)
        .clamped(-amp, amp)
        .widened(amp * BOUND_SLACK)
}
