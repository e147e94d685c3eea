//! Object class table.
//!
//! Classes are registered up front and checked once with
//! [`ClassRegistry::validate`]; lookups at edit time only miss for ids the
//! table has never heard of (e.g. documents written by a newer editor).

use std::collections::HashMap;

use serde_json::{Map, Value, json};

use crate::core::{Error, Result};
use super::objects::ObjectState;

/// Play-lifecycle hooks of a live object.
///
/// Every hook defaults to doing nothing.
pub trait ObjectBehavior: Send {
    /// Play mode started (or the object was created while playing)
    fn start(&mut self, _state: &ObjectState) {}
    /// Play mode stopped, or the object is being removed/disposed
    fn stop(&mut self) {}
    /// Arguments changed through an edit
    fn args_changed(&mut self, _state: &ObjectState) {}
}

/// Constructor for a class's behavior
pub type BehaviorFactory = fn() -> Box<dyn ObjectBehavior>;

/// Behavior with no hooks
#[derive(Debug, Default)]
pub struct Inert;

impl ObjectBehavior for Inert {}

fn inert() -> Box<dyn ObjectBehavior> {
    Box::new(Inert)
}

/// Registered object class
#[derive(Clone)]
pub struct ClassDef {
    pub id: u32,
    pub name: String,
    /// Default arguments; also the set of known argument keys
    pub defaults: Map<String, Value>,
    /// Keep the object's y on the terrain height of the tile it stands on
    pub snap_to_terrain: bool,
    pub factory: BehaviorFactory,
}

impl ClassDef {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            defaults: Map::new(),
            snap_to_terrain: false,
            factory: inert,
        }
    }

    pub fn with_default(mut self, key: &str, value: Value) -> Self {
        self.defaults.insert(key.to_string(), value);
        self
    }

    pub fn snapping(mut self) -> Self {
        self.snap_to_terrain = true;
        self
    }

    pub fn with_factory(mut self, factory: BehaviorFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Defaults overlaid with `args`. Keys outside the defaults are kept.
    pub fn merge_args(&self, args: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.defaults.clone();
        for (key, value) in args {
            if !self.defaults.contains_key(key) {
                log::debug!("class '{}' has no default for arg '{}'", self.name, key);
            }
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl std::fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("defaults", &self.defaults)
            .field("snap_to_terrain", &self.snap_to_terrain)
            .finish()
    }
}

/// A freshly constructed object's class-derived parts
pub struct Instance {
    /// Class defaults overlaid with the caller's arguments
    pub args: Map<String, Value>,
    pub behavior: Box<dyn ObjectBehavior>,
    pub snap_to_terrain: bool,
}

/// Table mapping class ids to definitions
#[derive(Debug, Default, Clone)]
pub struct ClassRegistry {
    classes: HashMap<u32, ClassDef>,
}

impl ClassRegistry {
    pub const MARKER: u32 = 1;
    pub const SPAWN_POINT: u32 = 2;
    pub const LIGHT: u32 = 3;

    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the classes every map can rely on
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        let defs = [
            ClassDef::new(Self::MARKER, "marker").with_default("label", json!("")),
            ClassDef::new(Self::SPAWN_POINT, "spawn_point")
                .with_default("team", json!(0))
                .snapping(),
            ClassDef::new(Self::LIGHT, "light")
                .with_default("radius", json!(4.0))
                .with_default("intensity", json!(1.0)),
        ];
        for def in defs {
            // Builtin ids are distinct constants
            let _ = registry.register(def);
        }
        registry
    }

    /// Add a class. Duplicate ids are rejected.
    pub fn register(&mut self, def: ClassDef) -> Result<()> {
        if let Some(existing) = self.classes.get(&def.id) {
            return Err(Error::Registry(format!(
                "class id {} registered twice ('{}' and '{}')",
                def.id, existing.name, def.name
            )));
        }
        self.classes.insert(def.id, def);
        Ok(())
    }

    /// Startup consistency check over the whole table
    pub fn validate(&self) -> Result<()> {
        let mut names: HashMap<&str, u32> = HashMap::new();
        for def in self.classes.values() {
            if def.name.trim().is_empty() {
                return Err(Error::Registry(format!("class id {} has an empty name", def.id)));
            }
            if let Some(other) = names.insert(def.name.as_str(), def.id) {
                return Err(Error::Registry(format!(
                    "class name '{}' used by ids {} and {}",
                    def.name, other, def.id
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: u32) -> Result<&ClassDef> {
        self.classes.get(&id).ok_or(Error::UnknownClass(id))
    }

    /// Build the parts of a new object of class `id`
    pub fn instantiate(&self, id: u32, args: &Map<String, Value>) -> Result<Instance> {
        let def = self.get(id)?;
        Ok(Instance {
            args: def.merge_args(args),
            behavior: (def.factory)(),
            snap_to_terrain: def.snap_to_terrain,
        })
    }

    pub fn contains(&self, id: u32) -> bool {
        self.classes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
