//! Axis-aligned bounding box

use crate::core::types::{IVec3, Vec3};

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Box covering the unit lattice cells `min..max` (max exclusive)
    pub fn from_cells(min: IVec3, max: IVec3) -> Self {
        Self {
            min: min.as_vec3(),
            max: max.as_vec3(),
        }
    }
}
