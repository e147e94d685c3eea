//! Ray picking onto the tile lattice and drag selections

pub mod projector;
pub mod orientation;
pub mod drag;

pub use projector::{PickHit, PickProjector, PickSurface, SurfaceTag, chunk_surfaces, snap};
pub use orientation::{FaceOrientation, face_orientations, orientation_for};
pub use drag::{DragRect, DragSelection, FlatHeightPolicy, flatten_actions};
