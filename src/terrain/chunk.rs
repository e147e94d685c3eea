//! Fixed-size square blocks of tiles

use std::collections::BTreeMap;

use crate::core::{Error, Result};
use super::tile::{Tile, TileRect};

/// Persisted chunk set: chunk key -> flat `[type, height, ...]` array
pub type ChunksData = BTreeMap<String, Vec<i64>>;

/// Integer coordinate identifying a chunk in the tile grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Create a new chunk coordinate
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk owning tile (x, z). Floors toward negative infinity so tile -1
    /// lands in chunk -1.
    pub fn from_tile(x: i32, z: i32, chunk_size: u32) -> Self {
        let size = chunk_size as i32;
        Self {
            x: x.div_euclid(size),
            z: z.div_euclid(size),
        }
    }

    /// Tile coordinate of the chunk's minimum corner
    pub fn origin(&self, chunk_size: u32) -> (i32, i32) {
        let size = chunk_size as i32;
        (self.x * size, self.z * size)
    }

    /// Tile-space bounds of this chunk
    pub fn rect(&self, chunk_size: u32) -> TileRect {
        let (x0, z0) = self.origin(chunk_size);
        let last = chunk_size as i32 - 1;
        TileRect::new(x0, z0, x0 + last, z0 + last)
    }

    /// Key used in persisted documents
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.z)
    }

    pub fn parse_key(key: &str) -> Result<Self> {
        let (x, z) = key
            .split_once(',')
            .ok_or_else(|| Error::Document(format!("bad chunk key '{}'", key)))?;
        let parse = |s: &str| {
            s.trim()
                .parse::<i32>()
                .map_err(|_| Error::Document(format!("bad chunk key '{}'", key)))
        };
        Ok(Self::new(parse(x)?, parse(z)?))
    }
}

/// A square block of `size * size` tiles
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    pub coord: ChunkCoord,
    size: u32,
    /// Row-major: index = local_z * size + local_x
    tiles: Vec<Tile>,
}

impl Chunk {
    /// Largest supported side length
    pub const MAX_SIZE: u32 = 4096;

    /// Number of tiles in a chunk of side `size`
    pub fn area(size: u32) -> Option<usize> {
        let side = usize::try_from(size).ok()?;
        side.checked_mul(side)
    }

    /// Create a zero-filled chunk.
    ///
    /// `size` is clamped to `1..=MAX_SIZE`.
    pub fn new(coord: ChunkCoord, size: u32) -> Self {
        let size = size.clamp(1, Self::MAX_SIZE);
        let len = Self::area(size).unwrap_or(1);
        Self {
            coord,
            size,
            tiles: vec![Tile::DEFAULT; len],
        }
    }

    /// Rebuild a chunk from its persisted flat array
    pub fn from_flat(coord: ChunkCoord, size: u32, flat: &[i64]) -> Result<Self> {
        let area = Self::area(size)
            .filter(|_| (1..=Self::MAX_SIZE).contains(&size))
            .ok_or_else(|| Error::Document(format!("chunk {}: unsupported size {}", coord.key(), size)))?;
        let expected = area * 2;
        if flat.len() != expected {
            return Err(Error::Document(format!(
                "chunk {} has {} values, expected {}",
                coord.key(),
                flat.len(),
                expected
            )));
        }

        let mut tiles = Vec::with_capacity(area);
        for pair in flat.chunks_exact(2) {
            let kind = u32::try_from(pair[0]).map_err(|_| {
                Error::Document(format!("chunk {}: tile type {} out of range", coord.key(), pair[0]))
            })?;
            let height = i32::try_from(pair[1]).map_err(|_| {
                Error::Document(format!("chunk {}: height {} out of range", coord.key(), pair[1]))
            })?;
            tiles.push(Tile { kind, height });
        }

        Ok(Self { coord, size, tiles })
    }

    /// Flatten to `[type, height, type, height, ...]`
    pub fn to_flat(&self) -> Vec<i64> {
        let mut flat = Vec::with_capacity(self.tiles.len() * 2);
        for tile in &self.tiles {
            flat.push(tile.kind as i64);
            flat.push(tile.height as i64);
        }
        flat
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    fn index(&self, x: i32, z: i32) -> usize {
        let (x0, z0) = self.coord.origin(self.size);
        let lx = (x - x0) as usize;
        let lz = (z - z0) as usize;
        debug_assert!(lx < self.size as usize && lz < self.size as usize);
        lz * self.size as usize + lx
    }

    /// Read a tile by world tile coordinate (must lie in this chunk)
    pub fn get(&self, x: i32, z: i32) -> Tile {
        self.tiles[self.index(x, z)]
    }

    /// Write a tile, returning the previous value
    pub fn set(&mut self, x: i32, z: i32, tile: Tile) -> Tile {
        let i = self.index(x, z);
        std::mem::replace(&mut self.tiles[i], tile)
    }

    /// Iterate (x, z, tile) over the whole chunk
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, Tile)> + '_ {
        let (x0, z0) = self.coord.origin(self.size);
        let size = self.size as usize;
        self.tiles.iter().enumerate().map(move |(i, tile)| {
            (x0 + (i % size) as i32, z0 + (i / size) as i32, *tile)
        })
    }
}
