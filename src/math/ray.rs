//! Ray type and operations

use crate::core::types::{IVec3, Vec3};
use super::aabb::Aabb;

/// Coordinate axis selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along this axis
    pub fn unit(self) -> IVec3 {
        match self {
            Axis::X => IVec3::X,
            Axis::Y => IVec3::Y,
            Axis::Z => IVec3::Z,
        }
    }

    /// Axis of a face normal (the non-zero component)
    pub fn of_normal(normal: IVec3) -> Axis {
        if normal.x != 0 {
            Axis::X
        } else if normal.z != 0 {
            Axis::Z
        } else {
            Axis::Y
        }
    }
}

/// Entry point of a ray into a box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceHit {
    /// Ray parameter at the entry point
    pub t: f32,
    /// Outward normal of the face the ray entered through
    pub normal: IVec3,
}

/// A ray defined by origin and direction
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Precomputed 1/direction for fast AABB intersection
    pub inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray (direction should be normalized)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            inv_direction: Vec3::new(
                1.0 / direction.x,
                1.0 / direction.y,
                1.0 / direction.z,
            ),
        }
    }

    /// Get point along ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Slab intersection that also reports which face was entered.
    ///
    /// Rays starting inside the box report no hit: there is no entry face.
    /// A zero direction component never crosses that slab, so the origin
    /// must already lie within it (boundary included).
    pub fn enter_aabb(&self, aabb: &Aabb) -> Option<FaceHit> {
        let mut axis = None;
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for candidate in [Axis::X, Axis::Y, Axis::Z] {
            let i = candidate.index();
            let (o, min, max) = (self.origin[i], aabb.min[i], aabb.max[i]);
            if self.direction[i] == 0.0 {
                if o < min || o > max {
                    return None;
                }
                continue;
            }

            let t1 = (min - o) * self.inv_direction[i];
            let t2 = (max - o) * self.inv_direction[i];
            let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
            if lo > t_near {
                t_near = lo;
                axis = Some(candidate);
            }
            t_far = t_far.min(hi);
        }

        let axis = axis?;
        if t_near.is_nan() || t_near > t_far || t_near < 0.0 {
            return None;
        }

        let sign = if self.direction[axis.index()] > 0.0 { -1 } else { 1 };
        Some(FaceHit {
            t: t_near,
            normal: axis.unit() * sign,
        })
    }

    /// Intersect with the plane `axis = value`.
    /// Returns the ray parameter, or None if parallel or behind the origin.
    pub fn intersect_axis_plane(&self, axis: Axis, value: f32) -> Option<f32> {
        let i = axis.index();
        let d = self.direction[i];
        if d.abs() < f32::EPSILON {
            return None;
        }
        let t = (value - self.origin[i]) / d;
        (t >= 0.0).then_some(t)
    }
}
