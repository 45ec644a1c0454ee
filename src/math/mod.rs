//! Mathematical utilities and data structures

pub mod aabb;
pub mod ray;
pub mod min_max;

pub use aabb::Aabb;
pub use ray::Ray;
pub use min_max::MinMax;
