//! Drag selections anchored on a picked face

use crate::config::EditorConfig;
use crate::core::types::IVec3;
use crate::edit::Action;
use crate::math::{Axis, Ray};
use crate::terrain::{Tile, TileGrid, TileRect};
use super::orientation::{FaceOrientation, orientation_for};
use super::projector::{PickHit, PickProjector};

/// Lattice box covered by a drag. `min` inclusive, `max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragRect {
    pub min: IVec3,
    pub max: IVec3,
}

impl DragRect {
    /// Tiles covered in the x/z plane
    pub fn tiles(&self) -> TileRect {
        TileRect::new(self.min.x, self.min.z, self.max.x - 1, self.max.z - 1)
    }

    pub fn size(&self) -> IVec3 {
        self.max - self.min
    }

    /// Height a "flatten" over this box writes
    pub fn flat_height(&self, policy: FlatHeightPolicy) -> i32 {
        self.max.y + policy.offset
    }
}

/// Where a flatten lands relative to the drag box's top
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlatHeightPolicy {
    pub offset: i32,
}

impl FlatHeightPolicy {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            offset: config.flat_height_offset,
        }
    }
}

impl Default for FlatHeightPolicy {
    fn default() -> Self {
        Self { offset: -1 }
    }
}

/// Drag in progress: the first pick and the face it landed on
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DragSelection {
    pub start: IVec3,
    pub normal: IVec3,
    orientation: FaceOrientation,
}

impl DragSelection {
    /// Start a drag; None if `normal` is not an axis-aligned unit vector
    pub fn new(start: IVec3, normal: IVec3) -> Option<Self> {
        let orientation = orientation_for(normal)?;
        Some(Self { start, normal, orientation })
    }

    pub fn from_hit(hit: &PickHit) -> Option<Self> {
        Self::new(hit.position, hit.normal)
    }

    pub fn orientation(&self) -> &FaceOrientation {
        &self.orientation
    }

    /// The plane the drag continues on: through `start`, across the normal
    pub fn plane(&self) -> (Axis, i32) {
        let axis = Axis::of_normal(self.normal);
        (axis, self.start[axis.index()])
    }

    /// Box between the start and `current`.
    ///
    /// `min = min(start, current)`, `max = max(start, current) + unit`, with
    /// each axis reordered so `min <= max`.
    pub fn update(&self, current: IVec3) -> DragRect {
        let a = self.start.min(current);
        let b = self.start.max(current) + self.orientation.unit;
        DragRect {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Follow the pointer ray on the drag plane
    pub fn update_from_ray(&self, ray: &Ray) -> Option<DragRect> {
        let (axis, value) = self.plane();
        let current = PickProjector::project_on_plane(ray, axis, value as f32)?;
        Some(self.update(current))
    }
}

/// Set-pixel actions that level every tile under `rect` to its flat height
/// with tile type `kind`. Tiles that already match are skipped.
pub fn flatten_actions(rect: &DragRect, kind: u32, policy: FlatHeightPolicy, grid: &TileGrid) -> Vec<Action> {
    let target = Tile::new(kind, rect.flat_height(policy));
    rect.tiles()
        .cells()
        .filter(|&(x, z)| grid.peek(x, z) != target)
        .map(|(x, z)| Action::set_pixel(x, z, target))
        .collect()
}
