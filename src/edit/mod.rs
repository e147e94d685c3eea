//! Batch-oriented undo/redo over reversible edit actions.
//!
//! Actions are applied as soon as they are pushed so the caller sees a live
//! preview; committing freezes everything pushed since the last commit into
//! one undoable step.

pub mod action;
pub mod history;

pub use action::{Action, EditTarget};
pub use history::{Batch, EditHistory, HistoryChange};
