//! Brickworld - sparse brick-bitmask voxel world
//!
//! Procedurally generates voxel terrain from an analytic density field,
//! stores it as 8x8x8 bitmask bricks and answers point and ray queries
//! against the stored bricks.

pub mod core;
pub mod math;
pub mod terrain;
pub mod voxel;
pub mod generation;
