//! Sparse tile grid with lazy chunk materialization

use std::collections::HashMap;

use crate::core::{Observers, Result, Subscription};
use super::chunk::{Chunk, ChunkCoord, ChunksData};
use super::tile::{Tile, TileRect};

/// Payload of the `tile-updated` event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileUpdate {
    pub x: i32,
    pub z: i32,
    pub previous: Tile,
    pub tile: Tile,
    pub chunk: ChunkCoord,
}

/// Payload of the `height-updated` event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeightUpdate {
    pub chunk: ChunkCoord,
    /// Bounds of the affected chunk
    pub rect: TileRect,
}

/// Result of a single pixel write
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelChange {
    pub previous: Tile,
    pub chunk: ChunkCoord,
    pub height_changed: bool,
}

/// Sparse chunked 2D field of tiles.
///
/// Reads never fail: cells in chunks that were never materialized read as
/// [`Tile::DEFAULT`].
pub struct TileGrid {
    chunk_size: u32,
    chunks: HashMap<ChunkCoord, Chunk>,
    tile_updated: Observers<TileUpdate>,
    height_updated: Observers<HeightUpdate>,
    chunk_loaded: Observers<ChunkCoord>,
}

impl TileGrid {
    /// Create an empty grid. `chunk_size` is fixed for the grid's lifetime
    /// and clamped to `1..=Chunk::MAX_SIZE`.
    pub fn new(chunk_size: u32) -> Self {
        debug_assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            chunk_size: chunk_size.clamp(1, Chunk::MAX_SIZE),
            chunks: HashMap::new(),
            tile_updated: Observers::new(),
            height_updated: Observers::new(),
            chunk_loaded: Observers::new(),
        }
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Chunk owning tile (x, z)
    pub fn chunk_of(&self, x: i32, z: i32) -> ChunkCoord {
        ChunkCoord::from_tile(x, z, self.chunk_size)
    }

    /// Read a tile, materializing its chunk if needed
    pub fn get_pixel(&mut self, x: i32, z: i32) -> Tile {
        let coord = self.chunk_of(x, z);
        self.ensure_chunk(coord).get(x, z)
    }

    /// Read a tile without materializing anything
    pub fn peek(&self, x: i32, z: i32) -> Tile {
        self.chunks
            .get(&self.chunk_of(x, z))
            .map(|chunk| chunk.get(x, z))
            .unwrap_or(Tile::DEFAULT)
    }

    /// Write a tile.
    ///
    /// Emits `height-updated` first when the height differs from the previous
    /// value, then always `tile-updated`.
    pub fn set_pixel(&mut self, x: i32, z: i32, tile: Tile) -> PixelChange {
        let coord = self.chunk_of(x, z);
        let previous = self.ensure_chunk(coord).set(x, z, tile);
        let height_changed = previous.height != tile.height;

        if height_changed {
            let rect = coord.rect(self.chunk_size);
            self.height_updated.emit(&HeightUpdate { chunk: coord, rect });
        }
        self.tile_updated.emit(&TileUpdate {
            x,
            z,
            previous,
            tile,
            chunk: coord,
        });

        PixelChange {
            previous,
            chunk: coord,
            height_changed,
        }
    }

    fn ensure_chunk(&mut self, coord: ChunkCoord) -> &mut Chunk {
        let size = self.chunk_size;
        let loaded = &mut self.chunk_loaded;
        self.chunks.entry(coord).or_insert_with(|| {
            loaded.emit(&coord);
            Chunk::new(coord, size)
        })
    }

    /// Get a materialized chunk
    pub fn chunk(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    pub fn is_materialized(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// Number of materialized chunks
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Iterate over all materialized chunk coordinates
    pub fn chunk_coords(&self) -> impl Iterator<Item = &ChunkCoord> {
        self.chunks.keys()
    }

    /// Serialize every materialized chunk
    pub fn to_chunks_data(&self) -> ChunksData {
        self.chunks
            .values()
            .map(|chunk| (chunk.coord.key(), chunk.to_flat()))
            .collect()
    }

    /// Bulk-load persisted chunks.
    ///
    /// The whole set is validated before anything is inserted. `chunk-loaded`
    /// fires once for each chunk that was not materialized before. Returns the
    /// number of chunks loaded.
    pub fn load_chunks_data(&mut self, data: &ChunksData) -> Result<usize> {
        let mut parsed = Vec::with_capacity(data.len());
        for (key, flat) in data {
            let coord = ChunkCoord::parse_key(key)?;
            parsed.push(Chunk::from_flat(coord, self.chunk_size, flat)?);
        }

        let count = parsed.len();
        for chunk in parsed {
            let coord = chunk.coord;
            let fresh = self.chunks.insert(coord, chunk).is_none();
            if fresh {
                self.chunk_loaded.emit(&coord);
            }
        }
        Ok(count)
    }

    /// Drop all chunks and subscribers
    pub fn release(&mut self) {
        self.chunks.clear();
        self.tile_updated.clear();
        self.height_updated.clear();
        self.chunk_loaded.clear();
    }

    pub fn on_tile_updated(&mut self, f: impl FnMut(&TileUpdate) + Send + 'static) -> Subscription {
        self.tile_updated.subscribe(f)
    }

    pub fn on_height_updated(&mut self, f: impl FnMut(&HeightUpdate) + Send + 'static) -> Subscription {
        self.height_updated.subscribe(f)
    }

    pub fn on_chunk_loaded(&mut self, f: impl FnMut(&ChunkCoord) + Send + 'static) -> Subscription {
        self.chunk_loaded.subscribe(f)
    }

    /// Remove a subscription made through any of the `on_*` methods
    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        self.tile_updated.unsubscribe(handle)
            || self.height_updated.unsubscribe(handle)
            || self.chunk_loaded.unsubscribe(handle)
    }
}

impl std::fmt::Debug for TileGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileGrid")
            .field("chunk_size", &self.chunk_size)
            .field("chunks", &self.chunks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnMut(&T) + Send + 'static) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |v: &T| sink.lock().unwrap().push(v.clone()))
    }

    #[test]
    fn test_unread_is_default() {
        let mut grid = TileGrid::new(16);
        assert_eq!(grid.get_pixel(123, -456), Tile::DEFAULT);
        assert_eq!(grid.peek(-9999, 9999), Tile::DEFAULT);
    }

    #[test]
    fn test_oversized_chunk_size_is_clamped() {
        let grid = TileGrid::new(70_000);
        assert_eq!(grid.chunk_size(), Chunk::MAX_SIZE);
        assert_eq!(grid.chunk_of(4095, 4096), ChunkCoord::new(0, 1));
    }

    #[test]
    fn test_set_then_get() {
        let mut grid = TileGrid::new(16);
        for &(x, z) in &[(0i32, 0i32), (-1, -1), (15, 16), (-17, 40)] {
            let tile = Tile::new((x * 3 + z).unsigned_abs(), x - z);
            grid.set_pixel(x, z, tile);
            assert_eq!(grid.get_pixel(x, z), tile);
        }
    }

    #[test]
    fn test_get_returns_copy() {
        let mut grid = TileGrid::new(4);
        let mut tile = grid.get_pixel(1, 1);
        tile.height = 9;
        assert_eq!(grid.get_pixel(1, 1).height, 0);
    }

    #[test]
    fn test_negative_coordinate_chunk() {
        let mut grid = TileGrid::new(16);
        let change = grid.set_pixel(-1, 0, Tile::new(1, 1));
        assert_eq!(change.chunk, ChunkCoord::new(-1, 0));
        assert!(grid.is_materialized(ChunkCoord::new(-1, 0)));
        assert!(!grid.is_materialized(ChunkCoord::new(0, 0)));
    }

    #[test]
    fn test_read_materializes_chunk() {
        let mut grid = TileGrid::new(8);
        assert_eq!(grid.chunk_count(), 0);
        grid.peek(3, 3);
        assert_eq!(grid.chunk_count(), 0);
        grid.get_pixel(3, 3);
        assert_eq!(grid.chunk_count(), 1);
        assert_eq!(grid.chunk(ChunkCoord::new(0, 0)).unwrap().tile_count(), 64);
    }

    #[test]
    fn test_chunk_loaded_fires_once() {
        let mut grid = TileGrid::new(4);
        let (log, sink) = recorder::<ChunkCoord>();
        grid.on_chunk_loaded(sink);

        grid.get_pixel(0, 0);
        grid.get_pixel(1, 2);
        grid.set_pixel(3, 3, Tile::new(1, 1));
        grid.set_pixel(4, 0, Tile::new(1, 1));

        assert_eq!(*log.lock().unwrap(), vec![ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)]);
    }

    #[test]
    fn test_height_event_only_on_height_change() {
        let mut grid = TileGrid::new(4);
        let (heights, height_sink) = recorder::<HeightUpdate>();
        let (tiles, tile_sink) = recorder::<TileUpdate>();
        grid.on_height_updated(height_sink);
        grid.on_tile_updated(tile_sink);

        grid.set_pixel(5, 1, Tile::new(2, 0)); // Type only
        grid.set_pixel(5, 1, Tile::new(2, 3)); // Height change

        let heights = heights.lock().unwrap();
        assert_eq!(heights.len(), 1);
        assert_eq!(heights[0].chunk, ChunkCoord::new(1, 0));
        assert_eq!(heights[0].rect, TileRect::new(4, 0, 7, 3));

        let tiles = tiles.lock().unwrap();
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[1].previous, Tile::new(2, 0));
        assert_eq!(tiles[1].tile, Tile::new(2, 3));
    }

    #[test]
    fn test_height_event_precedes_tile_event() {
        let mut grid = TileGrid::new(4);
        let order = Arc::new(Mutex::new(Vec::new()));
        let a = Arc::clone(&order);
        grid.on_tile_updated(move |_| a.lock().unwrap().push("tile"));
        let b = Arc::clone(&order);
        grid.on_height_updated(move |_| b.lock().unwrap().push("height"));

        grid.set_pixel(0, 0, Tile::new(0, 1));
        assert_eq!(*order.lock().unwrap(), vec!["height", "tile"]);
    }

    #[test]
    fn test_unsubscribe() {
        let mut grid = TileGrid::new(4);
        let (log, sink) = recorder::<TileUpdate>();
        let handle = grid.on_tile_updated(sink);
        grid.set_pixel(0, 0, Tile::new(1, 0));
        assert!(grid.unsubscribe(handle));
        grid.set_pixel(0, 0, Tile::new(2, 0));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_chunks_data_round_trip() {
        let mut grid = TileGrid::new(4);
        grid.set_pixel(-3, 2, Tile::new(4, 7));
        grid.set_pixel(9, 9, Tile::new(1, -1));
        let data = grid.to_chunks_data();
        assert_eq!(data.len(), 2);
        assert_eq!(data["-1,0"].len(), 32);

        let mut restored = TileGrid::new(4);
        let (loaded, sink) = recorder::<ChunkCoord>();
        restored.on_chunk_loaded(sink);
        assert_eq!(restored.load_chunks_data(&data).unwrap(), 2);
        assert_eq!(loaded.lock().unwrap().len(), 2);
        assert_eq!(restored.peek(-3, 2), Tile::new(4, 7));
        assert_eq!(restored.peek(9, 9), Tile::new(1, -1));
    }

    #[test]
    fn test_load_rejects_wrong_size_without_partial_insert() {
        let mut grid = TileGrid::new(4);
        let mut data = ChunksData::new();
        data.insert("0,0".to_string(), vec![0; 32]);
        data.insert("1,0".to_string(), vec![0; 8]);
        assert!(grid.load_chunks_data(&data).is_err());
        assert_eq!(grid.chunk_count(), 0);
    }

    #[test]
    fn test_reload_existing_chunk_does_not_refire() {
        let mut grid = TileGrid::new(2);
        grid.get_pixel(0, 0);
        let (loaded, sink) = recorder::<ChunkCoord>();
        grid.on_chunk_loaded(sink);

        let mut data = ChunksData::new();
        data.insert("0,0".to_string(), vec![1, 1, 1, 1, 1, 1, 1, 1]);
        grid.load_chunks_data(&data).unwrap();

        assert!(loaded.lock().unwrap().is_empty());
        assert_eq!(grid.peek(1, 1), Tile::new(1, 1));
    }

    #[test]
    fn test_release() {
        let mut grid = TileGrid::new(4);
        grid.set_pixel(0, 0, Tile::new(1, 1));
        grid.release();
        assert_eq!(grid.chunk_count(), 0);
        assert_eq!(grid.peek(0, 0), Tile::DEFAULT);
    }
}
