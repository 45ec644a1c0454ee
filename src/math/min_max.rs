//! Scalar interval used to bound a field over a region

use std::ops::Add;

/// Closed interval `[min, max]`
///
/// Bounds produced by density fields are conservative: they may be wider
/// than the true range over a region but never narrower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinMax {
    pub min: f32,
    pub max: f32,
}

impl MinMax {
    /// Degenerate interval containing only zero
    pub const ZERO: MinMax = MinMax { min: 0.0, max: 0.0 };

    /// Create interval, swapping the ends if given out of order
    pub fn new(a: f32, b: f32) -> Self {
        Self { min: a.min(b), max: a.max(b) }
    }

    /// Interval `[center - radius, center + radius]`
    pub fn around(center: f32, radius: f32) -> Self {
        let radius = radius.abs();
        Self { min: center - radius, max: center + radius }
    }

    /// Check if value lies inside the interval
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp both ends into `[lo, hi]`
    pub fn clamped(self, lo: f32, hi: f32) -> Self {
        Self {
            min: self.min.max(lo).min(hi),
            max: self.max.max(lo).min(hi),
        }
    }

    /// Widen both ends by `amount`
    pub fn widened(self, amount: f32) -> Self {
        Self { min: self.min - amount, max: self.max + amount }
    }

    /// Width of the interval
    pub fn width(&self) -> f32 {
        self.max - self.min
    }
}

impl Add for MinMax {
    type Output = MinMax;

    fn add(self, rhs: MinMax) -> MinMax {
        MinMax {
            min: self.min + rhs.min,
            max: self.max + rhs.max,
        }
    }
}
