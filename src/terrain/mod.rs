//! Sparse chunked height/type grid and its save debouncing

pub mod tile;
pub mod chunk;
pub mod grid;
pub mod debounce;

pub use tile::{Tile, TileRect};
pub use chunk::{Chunk, ChunkCoord, ChunksData};
pub use grid::{HeightUpdate, PixelChange, TileGrid, TileUpdate};
pub use debounce::{Clock, Debouncer, ManualClock, SystemClock};
