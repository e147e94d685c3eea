//! Reversible edit actions

use serde_json::{Map, Value};

use crate::core::types::Vec3;
use crate::stage::objects::{ArgsPatch, ObjectState, patch_from_args};
use crate::terrain::Tile;

/// Live state that actions edit.
///
/// Every mutator reports the state it replaced so the action can build its
/// own inverse; `None` means the target was missing and nothing changed.
pub trait EditTarget {
    /// Write a tile, returning the previous tile
    fn set_pixel(&mut self, x: i32, z: i32, tile: Tile) -> Tile;
    /// Returns false when the class is unknown or the id is taken
    fn create_object(&mut self, id: &str, class_id: u32, position: Vec3, args: &Map<String, Value>) -> bool;
    fn remove_object(&mut self, id: &str) -> Option<ObjectState>;
    fn move_object(&mut self, id: &str, position: Vec3) -> Option<Vec3>;
    fn update_object(&mut self, id: &str, patch: &ArgsPatch) -> Option<ArgsPatch>;
}

/// A single reversible edit.
///
/// The "before" half of each variant is recorded when the action is applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SetPixel {
        x: i32,
        z: i32,
        tile: Tile,
        previous: Option<Tile>,
    },
    CreateObject {
        id: String,
        class_id: u32,
        position: Vec3,
        args: Map<String, Value>,
        created: bool,
    },
    RemoveObject {
        id: String,
        removed: Option<ObjectState>,
    },
    MoveObject {
        id: String,
        position: Vec3,
        previous: Option<Vec3>,
    },
    UpdateObject {
        id: String,
        patch: ArgsPatch,
        previous: Option<ArgsPatch>,
    },
}

impl Action {
    pub fn set_pixel(x: i32, z: i32, tile: Tile) -> Self {
        Action::SetPixel { x, z, tile, previous: None }
    }

    pub fn create_object(id: impl Into<String>, class_id: u32, position: Vec3, args: Map<String, Value>) -> Self {
        Action::CreateObject {
            id: id.into(),
            class_id,
            position,
            args,
            created: false,
        }
    }

    pub fn remove_object(id: impl Into<String>) -> Self {
        Action::RemoveObject { id: id.into(), removed: None }
    }

    pub fn move_object(id: impl Into<String>, position: Vec3) -> Self {
        Action::MoveObject { id: id.into(), position, previous: None }
    }

    /// Set the given argument keys, leaving the others untouched
    pub fn update_object(id: impl Into<String>, args: &Map<String, Value>) -> Self {
        Self::patch_object(id, patch_from_args(args))
    }

    pub fn patch_object(id: impl Into<String>, patch: ArgsPatch) -> Self {
        Action::UpdateObject { id: id.into(), patch, previous: None }
    }

    /// Apply against `target`, recording the before state.
    /// Returns false if the action changed nothing.
    pub fn apply<T: EditTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        match self {
            Action::SetPixel { x, z, tile, previous } => {
                *previous = Some(target.set_pixel(*x, *z, *tile));
                true
            }
            Action::CreateObject { id, class_id, position, args, created } => {
                *created = target.create_object(id, *class_id, *position, args);
                *created
            }
            Action::RemoveObject { id, removed } => {
                *removed = target.remove_object(id);
                if removed.is_none() {
                    log::warn!("Remove of missing object '{}' ignored", id);
                }
                removed.is_some()
            }
            Action::MoveObject { id, position, previous } => {
                *previous = target.move_object(id, *position);
                if previous.is_none() {
                    log::warn!("Move of missing object '{}' ignored", id);
                }
                previous.is_some()
            }
            Action::UpdateObject { id, patch, previous } => {
                *previous = target.update_object(id, patch);
                if previous.is_none() {
                    log::warn!("Update of missing object '{}' ignored", id);
                }
                previous.is_some()
            }
        }
    }

    /// Action that reverts this one. None if it was never applied
    /// successfully, since then there is nothing to revert.
    pub fn inverse(&self) -> Option<Action> {
        match self {
            Action::SetPixel { x, z, tile, previous } => previous.map(|prev| Action::SetPixel {
                x: *x,
                z: *z,
                tile: prev,
                previous: Some(*tile),
            }),
            Action::CreateObject { id, created, .. } => created.then(|| Action::remove_object(id.clone())),
            Action::RemoveObject { id, removed } => removed.as_ref().map(|state| {
                Action::create_object(id.clone(), state.class_id, state.position, state.args.clone())
            }),
            Action::MoveObject { id, position, previous } => previous.map(|prev| Action::MoveObject {
                id: id.clone(),
                position: prev,
                previous: Some(*position),
            }),
            Action::UpdateObject { id, patch, previous } => previous.as_ref().map(|prev| Action::UpdateObject {
                id: id.clone(),
                patch: prev.clone(),
                previous: Some(patch.clone()),
            }),
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Action::SetPixel { .. } => "set-pixel",
            Action::CreateObject { .. } => "create-object",
            Action::RemoveObject { .. } => "remove-object",
            Action::MoveObject { .. } => "move-object",
            Action::UpdateObject { .. } => "update-object",
        }
    }
}


#[cfg(test)]
mod tests {
    use super::sandbox::Sandbox;
    use super::*;
    use crate::stage::classes::ClassRegistry;
    use serde_json::json;

    #[test]
    fn test_set_pixel_inverse() {
        let mut sb = Sandbox::new();
        sb.grid.set_pixel(1, 1, Tile::new(1, 1));

        let mut action = Action::set_pixel(1, 1, Tile::new(5, 5));
        assert!(action.inverse().is_none()); // Not applied yet
        assert!(action.apply(&mut sb));

        let mut inverse = action.inverse().unwrap();
        inverse.apply(&mut sb);
        assert_eq!(sb.grid.peek(1, 1), Tile::new(1, 1));
    }

    #[test]
    fn test_create_remove_inverse() {
        let mut sb = Sandbox::new();
        let mut create = Action::create_object("m", ClassRegistry::MARKER, Vec3::ONE, Map::new());
        assert!(create.apply(&mut sb));
        assert!(sb.objects.contains("m"));

        create.inverse().unwrap().apply(&mut sb);
        assert!(!sb.objects.contains("m"));
    }

    #[test]
    fn test_remove_inverse_restores_state() {
        let mut sb = Sandbox::new();
        let mut args = Map::new();
        args.insert("radius".to_string(), json!(7.0));
        sb.objects.create("l", ClassRegistry::LIGHT, Vec3::X, &args, &sb.classes);

        let mut remove = Action::remove_object("l");
        assert!(remove.apply(&mut sb));
        remove.inverse().unwrap().apply(&mut sb);

        let state = sb.objects.get("l").unwrap();
        assert_eq!(state.position, Vec3::X);
        assert_eq!(state.args["radius"], json!(7.0));
    }

    #[test]
    fn test_unknown_class_has_no_inverse() {
        let mut sb = Sandbox::new();
        let mut create = Action::create_object("?", 999, Vec3::ZERO, Map::new());
        assert!(!create.apply(&mut sb));
        assert!(create.inverse().is_none());
    }

    #[test]
    fn test_missing_target_is_noop() {
        let mut sb = Sandbox::new();
        let mut mv = Action::move_object("ghost", Vec3::ONE);
        assert!(!mv.apply(&mut sb));
        assert!(mv.inverse().is_none());

        let mut update = Action::update_object("ghost", &Map::new());
        assert!(!update.apply(&mut sb));
    }

    #[test]
    fn test_update_inverse() {
        let mut sb = Sandbox::new();
        sb.objects.create("l", ClassRegistry::LIGHT, Vec3::ZERO, &Map::new(), &sb.classes);

        let mut args = Map::new();
        args.insert("intensity".to_string(), json!(3.0));
        args.insert("flicker".to_string(), json!(true));
        let mut update = Action::update_object("l", &args);
        update.apply(&mut sb);
        update.inverse().unwrap().apply(&mut sb);

        let state = sb.objects.get("l").unwrap();
        assert_eq!(state.args["intensity"], json!(1.0));
        assert!(!state.args.contains_key("flicker"));
    }
}
