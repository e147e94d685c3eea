//! Core types and utilities shared by every editor subsystem

pub mod types;
pub mod error;
pub mod events;
pub mod logging;

pub use types::*;
pub use error::Error;
pub use events::{Observers, Subscription};
