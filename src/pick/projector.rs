//! Ray projection onto pickable surfaces

use crate::core::types::{IVec3, Vec3};
use crate::math::{Aabb, Axis, Ray};
use crate::terrain::{ChunkCoord, TileGrid};

/// What a pick surface belongs to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceTag {
    /// Column of terrain tile (x, z), world coordinates
    Terrain { x: i32, z: i32 },
    /// Object by id
    Object { id: String },
    /// The `y = 0` fallback plane
    Ground,
}

/// Box that a ray can land on
#[derive(Clone, Debug, PartialEq)]
pub struct PickSurface {
    pub bounds: Aabb,
    pub tag: SurfaceTag,
}

impl PickSurface {
    pub fn new(bounds: Aabb, tag: SurfaceTag) -> Self {
        Self { bounds, tag }
    }
}

/// Result of a projection, snapped to the integer lattice
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickHit {
    pub position: IVec3,
    /// Outward normal of the face that was hit
    pub normal: IVec3,
    pub tag: SurfaceTag,
}

/// Nearest lattice point: `floor(c + 0.5)` per axis
pub fn snap(p: Vec3) -> IVec3 {
    (p + Vec3::splat(0.5)).floor().as_ivec3()
}

/// Tile columns of one chunk as pick surfaces.
///
/// Each non-zero height becomes a box spanning y from 0 to the height;
/// `origin` shifts stage-local tiles into world space.
pub fn chunk_surfaces(grid: &TileGrid, coord: ChunkCoord, origin: IVec3) -> Vec<PickSurface> {
    let Some(chunk) = grid.chunk(coord) else {
        return Vec::new();
    };
    chunk
        .iter()
        .filter(|(_, _, tile)| tile.height != 0)
        .map(|(tx, tz, tile)| {
            let x = tx + origin.x;
            let z = tz + origin.z;
            let (y0, y1) = if tile.height > 0 { (0, tile.height) } else { (tile.height, 0) };
            PickSurface::new(
                Aabb::from_cells(
                    IVec3::new(x, origin.y + y0, z),
                    IVec3::new(x + 1, origin.y + y1, z + 1),
                ),
                SurfaceTag::Terrain { x, z },
            )
        })
        .collect()
}

/// Set of pickable surfaces
#[derive(Clone, Debug, Default)]
pub struct PickProjector {
    surfaces: Vec<PickSurface>,
}

impl PickProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, surface: PickSurface) {
        self.surfaces.push(surface);
    }

    pub fn extend(&mut self, surfaces: impl IntoIterator<Item = PickSurface>) {
        self.surfaces.extend(surfaces);
    }

    /// Add the terrain columns of every materialized chunk of `grid`
    pub fn add_terrain(&mut self, grid: &TileGrid, origin: IVec3) {
        let coords: Vec<ChunkCoord> = grid.chunk_coords().copied().collect();
        for coord in coords {
            self.surfaces.extend(chunk_surfaces(grid, coord, origin));
        }
    }

    /// Drop surfaces matching `predicate`
    pub fn remove_where(&mut self, predicate: impl Fn(&PickSurface) -> bool) {
        self.surfaces.retain(|s| !predicate(s));
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Project onto the nearest surface accepted by `predicate`.
    ///
    /// Falls back to the ground plane with an upward normal when nothing is
    /// hit; None only if the ray never reaches the ground either.
    pub fn project_on_surface(&self, ray: &Ray, predicate: impl Fn(&PickSurface) -> bool) -> Option<PickHit> {
        let nearest = self
            .surfaces
            .iter()
            .filter(|s| predicate(s))
            .filter_map(|s| ray.enter_aabb(&s.bounds).map(|hit| (hit, s)))
            .min_by(|(a, _), (b, _)| a.t.total_cmp(&b.t));

        if let Some((hit, surface)) = nearest {
            return Some(PickHit {
                position: snap(ray.at(hit.t)),
                normal: hit.normal,
                tag: surface.tag.clone(),
            });
        }

        let t = ray.intersect_axis_plane(Axis::Y, 0.0)?;
        Some(PickHit {
            position: snap(ray.at(t)),
            normal: IVec3::Y,
            tag: SurfaceTag::Ground,
        })
    }

    /// Project onto the plane `axis = value`, snapped to the lattice
    pub fn project_on_plane(ray: &Ray, axis: Axis, value: f32) -> Option<IVec3> {
        let t = ray.intersect_axis_plane(axis, value)?;
        let mut position = snap(ray.at(t));
        // Exact on the constrained axis
        position[axis.index()] = value.round() as i32;
        Some(position)
    }
}
