//! Tile value and tile-space rectangles

/// One cell of the terrain grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tile {
    /// Surface type id (`type` in map documents)
    pub kind: u32,
    pub height: i32,
}

impl Tile {
    /// Tile reported for any cell that was never written
    pub const DEFAULT: Tile = Tile { kind: 0, height: 0 };

    pub fn new(kind: u32, height: i32) -> Self {
        Self { kind, height }
    }
}

/// Inclusive rectangle in tile coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileRect {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl TileRect {
    pub fn new(min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Self {
        Self { min_x, min_z, max_x, max_z }
    }

    pub fn contains(&self, x: i32, z: i32) -> bool {
        x >= self.min_x && x <= self.max_x && z >= self.min_z && z <= self.max_z
    }

    /// Iterate every (x, z) in row-major order
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.min_z..=self.max_z)
            .flat_map(move |z| (self.min_x..=self.max_x).map(move |x| (x, z)))
    }
}
