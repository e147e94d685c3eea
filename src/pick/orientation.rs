//! Face normal to drag-volume orientation

use crate::core::types::{IVec3, Quat, Vec3};

/// How a drag volume sits relative to the picked face
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceOrientation {
    /// Outward unit normal of the face
    pub normal: IVec3,
    /// Rotation taking +Y onto the normal
    pub rotation: Quat,
    /// Added to the far corner of the drag box. +1 on the in-plane axes,
    /// the normal's sign on the normal axis.
    pub unit: IVec3,
}

impl FaceOrientation {
    fn for_normal(normal: IVec3) -> Self {
        let unit = IVec3::ONE + normal - normal.abs();
        Self {
            normal,
            rotation: Quat::from_rotation_arc(Vec3::Y, normal.as_vec3()),
            unit,
        }
    }
}

const NORMALS: [IVec3; 6] = [
    IVec3::X,
    IVec3::NEG_X,
    IVec3::Y,
    IVec3::NEG_Y,
    IVec3::Z,
    IVec3::NEG_Z,
];

/// The six face orientations: +x, -x, +y, -y, +z, -z
pub fn face_orientations() -> [FaceOrientation; 6] {
    NORMALS.map(FaceOrientation::for_normal)
}

/// Orientation for an axis-aligned unit normal; None for anything else
pub fn orientation_for(normal: IVec3) -> Option<FaceOrientation> {
    NORMALS
        .contains(&normal)
        .then(|| FaceOrientation::for_normal(normal))
}
