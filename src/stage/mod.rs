//! Stages: loaded map documents and the pager that owns them

pub mod document;
pub mod classes;
pub mod objects;
pub mod store;
pub mod source;
pub mod stage;
pub mod pager;

pub use document::{MapDocument, ObjectRecord};
pub use classes::{BehaviorFactory, ClassDef, ClassRegistry, Inert, Instance, ObjectBehavior};
pub use objects::{ArgsPatch, ObjectChange, ObjectRegistry, ObjectState, patch_from_args};
pub use store::{JsonFileStore, MapStore};
pub use source::{DiskSource, StageSource};
pub use stage::{Stage, StageKey};
pub use pager::{StagePager, StoreFactory};
