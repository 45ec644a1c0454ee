//! Procedural density field: seeded value noise, fractal terrain density
//! and conservative region bounds.

pub mod random;
pub mod noise;
pub mod density;
pub mod field;

pub use random::RandomContext;
pub use noise::DensityNrm;
pub use density::{DensityFunction, GradientSettings, NoiseSettings};
pub use field::{DensityField, SphereField, TerrainField};
