//! Geometry used by pick projection

pub mod aabb;
pub mod ray;

pub use aabb::Aabb;
pub use ray::{Axis, FaceHit, Ray};
