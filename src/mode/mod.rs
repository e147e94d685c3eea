//! Editor modes as an explicit state stack

pub mod stack;
pub mod modes;

pub use stack::{Mode, ModeStack};
pub use modes::{EditMode, PlayMode, Session};
