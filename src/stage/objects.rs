//! Object registry of a stage

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use crate::core::types::{IVec3, Vec3};
use crate::core::{Observers, Subscription};
use super::classes::{ClassRegistry, ObjectBehavior};

/// Partial argument update. `None` removes the key.
pub type ArgsPatch = BTreeMap<String, Option<Value>>;

/// Patch setting every key of `args`
pub fn patch_from_args(args: &Map<String, Value>) -> ArgsPatch {
    args.iter()
        .map(|(k, v)| (k.clone(), Some(v.clone())))
        .collect()
}

/// Plain data of an object
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectState {
    pub class_id: u32,
    pub position: Vec3,
    pub args: Map<String, Value>,
}

/// Emitted after every registry mutation
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectChange {
    Created { id: String },
    Removed { id: String },
    Moved { id: String, from: Vec3, to: Vec3 },
    Updated { id: String },
}

struct GameObject {
    state: ObjectState,
    behavior: Box<dyn ObjectBehavior>,
    snap_to_terrain: bool,
    playing: bool,
}

impl GameObject {
    fn start(&mut self) {
        if !self.playing {
            self.behavior.start(&self.state);
            self.playing = true;
        }
    }

    fn stop(&mut self) {
        if self.playing {
            self.behavior.stop();
            self.playing = false;
        }
    }
}

/// Objects of one stage keyed by id
pub struct ObjectRegistry {
    objects: HashMap<String, GameObject>,
    playing: bool,
    changed: Observers<ObjectChange>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            playing: false,
            changed: Observers::new(),
        }
    }

    /// Create an object. Unknown class ids and taken ids are logged and
    /// ignored; returns whether the object was created.
    pub fn create(
        &mut self,
        id: &str,
        class_id: u32,
        position: Vec3,
        args: &Map<String, Value>,
        classes: &ClassRegistry,
    ) -> bool {
        if self.objects.contains_key(id) {
            log::warn!("Not creating object '{}': id already in use", id);
            return false;
        }
        let instance = match classes.instantiate(class_id, args) {
            Ok(instance) => instance,
            Err(e) => {
                log::warn!("Not creating object '{}': {}", id, e);
                return false;
            }
        };

        let mut object = GameObject {
            state: ObjectState {
                class_id,
                position,
                args: instance.args,
            },
            behavior: instance.behavior,
            snap_to_terrain: instance.snap_to_terrain,
            playing: false,
        };
        if self.playing {
            object.start();
        }
        self.objects.insert(id.to_string(), object);
        self.changed.emit(&ObjectChange::Created { id: id.to_string() });
        true
    }

    /// Remove an object, stopping it first. Returns its final state.
    pub fn remove(&mut self, id: &str) -> Option<ObjectState> {
        let mut object = self.objects.remove(id)?;
        object.stop();
        self.changed.emit(&ObjectChange::Removed { id: id.to_string() });
        Some(object.state)
    }

    /// Move an object, returning its previous position
    pub fn move_to(&mut self, id: &str, position: Vec3) -> Option<Vec3> {
        let object = self.objects.get_mut(id)?;
        let from = std::mem::replace(&mut object.state.position, position);
        self.changed.emit(&ObjectChange::Moved {
            id: id.to_string(),
            from,
            to: position,
        });
        Some(from)
    }

    /// Apply a partial argument update, returning the patch that undoes it
    pub fn update(&mut self, id: &str, patch: &ArgsPatch) -> Option<ArgsPatch> {
        let object = self.objects.get_mut(id)?;
        let mut previous = ArgsPatch::new();
        for (key, value) in patch {
            let old = match value {
                Some(v) => object.state.args.insert(key.clone(), v.clone()),
                None => object.state.args.remove(key),
            };
            previous.insert(key.clone(), old);
        }
        object.behavior.args_changed(&object.state);
        self.changed.emit(&ObjectChange::Updated { id: id.to_string() });
        Some(previous)
    }

    /// Put terrain-snapping objects standing on local tile (x, z) at `height`.
    /// Positions are world space; `origin` is the stage offset.
    pub fn resnap_tile(&mut self, origin: IVec3, x: i32, z: i32, height: i32) -> usize {
        let origin = origin.as_vec3();
        let mut moved = Vec::new();
        for (id, object) in self.objects.iter_mut() {
            if !object.snap_to_terrain {
                continue;
            }
            let local = object.state.position - origin;
            if local.x.floor() as i32 != x || local.z.floor() as i32 != z {
                continue;
            }
            let y = origin.y + height as f32;
            if object.state.position.y != y {
                let from = object.state.position;
                object.state.position.y = y;
                moved.push(ObjectChange::Moved {
                    id: id.clone(),
                    from,
                    to: object.state.position,
                });
            }
        }
        for change in &moved {
            self.changed.emit(change);
        }
        moved.len()
    }

    pub fn get(&self, id: &str) -> Option<&ObjectState> {
        self.objects.get(id).map(|o| &o.state)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Object ids in sorted order
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.objects.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ObjectState)> {
        self.objects.iter().map(|(id, o)| (id.as_str(), &o.state))
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Run every object's start hook
    pub fn start_all(&mut self) {
        self.playing = true;
        for object in self.objects.values_mut() {
            object.start();
        }
    }

    /// Run every object's stop hook
    pub fn stop_all(&mut self) {
        self.playing = false;
        for object in self.objects.values_mut() {
            object.stop();
        }
    }

    /// Stop everything, then drop all objects and subscribers
    pub fn release(&mut self) {
        self.stop_all();
        self.objects.clear();
        self.changed.clear();
    }

    pub fn on_object_changed(&mut self, f: impl FnMut(&ObjectChange) + Send + 'static) -> Subscription {
        self.changed.subscribe(f)
    }

    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        self.changed.unsubscribe(handle)
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ObjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectRegistry")
            .field("objects", &self.objects.len())
            .field("playing", &self.playing)
            .finish()
    }
}
