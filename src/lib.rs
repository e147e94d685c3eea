//! Tilestage - chunked tile-map editing core
//!
//! Sparse chunked terrain, batched undo/redo, a bounded stage cache with
//! single-flight loading, and ray picking onto the tile lattice.

pub mod core;
pub mod math;
pub mod terrain;
pub mod edit;
pub mod config;
pub mod stage;
pub mod pick;
pub mod mode;
