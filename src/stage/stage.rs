//! One loaded map: its tile grid plus its objects

use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use crate::config::EditorConfig;
use crate::core::types::{IVec3, Result, Vec3};
use crate::core::Subscription;
use crate::edit::EditTarget;
use crate::terrain::{Clock, Debouncer, Tile, TileGrid};
use super::classes::ClassRegistry;
use super::document::{MapDocument, ObjectRecord};
use super::objects::{ArgsPatch, ObjectRegistry, ObjectState};
use super::store::MapStore;

/// Identity of a loaded stage: document url plus world offset
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StageKey {
    pub url: String,
    pub origin: IVec3,
}

impl StageKey {
    pub fn new(url: impl Into<String>, origin: IVec3) -> Self {
        Self { url: url.into(), origin }
    }
}

/// A loaded map document.
///
/// Grid coordinates are stage-local; object positions are world space
/// (document position + origin).
pub struct Stage {
    key: StageKey,
    grid: TileGrid,
    objects: ObjectRegistry,
    classes: Arc<ClassRegistry>,
    save_timer: Arc<Mutex<Debouncer>>,
    store: Option<Box<dyn MapStore>>,
    save_hooks: Vec<Subscription>,
    disposed: bool,
}

impl Stage {
    /// Create an empty stage
    pub fn new(
        key: StageKey,
        classes: Arc<ClassRegistry>,
        clock: Arc<dyn Clock>,
        config: &EditorConfig,
    ) -> Self {
        Self {
            key,
            grid: TileGrid::new(config.chunk_size),
            objects: ObjectRegistry::new(),
            classes,
            save_timer: Arc::new(Mutex::new(Debouncer::new(clock, config.save_debounce()))),
            store: None,
            save_hooks: Vec::new(),
            disposed: false,
        }
    }

    /// Create a stage and fill it from `doc`
    pub fn from_document(
        key: StageKey,
        doc: &MapDocument,
        classes: Arc<ClassRegistry>,
        clock: Arc<dyn Clock>,
        config: &EditorConfig,
    ) -> Result<Self> {
        let mut stage = Self::new(key, classes, clock, config);
        stage.load_document(doc)?;
        Ok(stage)
    }

    /// Load chunks and objects. Objects of unknown classes are skipped.
    pub fn load_document(&mut self, doc: &MapDocument) -> Result<()> {
        self.grid.load_chunks_data(&doc.chunks_data)?;

        let offset = self.key.origin.as_vec3();
        let mut skipped = 0;
        for (id, record) in &doc.objects_data {
            let created = self.objects.create(
                id,
                record.class_id,
                record.position() + offset,
                &record.args,
                &self.classes,
            );
            if !created {
                skipped += 1;
            }
        }

        log::info!(
            "Stage '{}' loaded: {} chunks, {} objects ({} skipped)",
            self.key.url,
            self.grid.chunk_count(),
            self.objects.len(),
            skipped
        );
        Ok(())
    }

    /// Snapshot in document form, object positions relative to the origin
    pub fn to_document(&self) -> MapDocument {
        let offset = self.key.origin.as_vec3();
        let objects_data = self
            .objects
            .iter()
            .map(|(id, state)| {
                let local = state.position - offset;
                (
                    id.to_string(),
                    ObjectRecord {
                        class_id: state.class_id,
                        args: state.args.clone(),
                        x: local.x,
                        y: local.y,
                        z: local.z,
                    },
                )
            })
            .collect();

        MapDocument {
            chunks_data: self.grid.to_chunks_data(),
            objects_data,
        }
    }

    pub fn key(&self) -> &StageKey {
        &self.key
    }

    pub fn url(&self) -> &str {
        &self.key.url
    }

    pub fn origin(&self) -> IVec3 {
        self.key.origin
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Mutable grid access for subscribing to its events
    pub fn grid_mut(&mut self) -> &mut TileGrid {
        &mut self.grid
    }

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    /// Mutable registry access for subscribing to its events
    pub fn objects_mut(&mut self) -> &mut ObjectRegistry {
        &mut self.objects
    }

    /// Read a tile, materializing its chunk
    pub fn get_pixel(&mut self, x: i32, z: i32) -> Tile {
        self.grid.get_pixel(x, z)
    }

    /// Attach the debounced save hook.
    ///
    /// Every tile or object change from then on restarts the quiet window;
    /// [`Stage::poll_save`] writes once the window has elapsed.
    pub fn attach_store(&mut self, store: Box<dyn MapStore>) {
        self.detach_hooks();

        let timer = Arc::clone(&self.save_timer);
        self.save_hooks.push(self.grid.on_tile_updated(move |_| {
            timer.lock().unwrap_or_else(|e| e.into_inner()).schedule();
        }));
        let timer = Arc::clone(&self.save_timer);
        self.save_hooks.push(self.objects.on_object_changed(move |_| {
            timer.lock().unwrap_or_else(|e| e.into_inner()).schedule();
        }));

        self.store = Some(store);
    }

    fn detach_hooks(&mut self) {
        for handle in self.save_hooks.drain(..) {
            if !self.grid.unsubscribe(handle) {
                self.objects.unsubscribe(handle);
            }
        }
    }

    /// Whether a save is waiting for its quiet window
    pub fn save_pending(&self) -> bool {
        self.timer().is_pending()
    }

    /// Write if the quiet window has elapsed. Returns whether a save happened.
    ///
    /// A failed write is rescheduled for another quiet window.
    pub fn poll_save(&mut self) -> Result<bool> {
        let due = self.timer().poll();
        self.save_if(due)
    }

    /// Write immediately if a save is pending
    pub fn flush_save(&mut self) -> Result<bool> {
        let due = self.timer().flush();
        self.save_if(due)
    }

    fn save_if(&mut self, due: bool) -> Result<bool> {
        if !due {
            return Ok(false);
        }
        if let Err(e) = self.save_now() {
            self.timer().schedule();
            return Err(e);
        }
        Ok(true)
    }

    fn save_now(&mut self) -> Result<()> {
        let doc = self.to_document();
        if let Some(store) = self.store.as_mut() {
            store.save(&self.key.url, &doc)?;
        }
        Ok(())
    }

    fn timer(&self) -> std::sync::MutexGuard<'_, Debouncer> {
        self.save_timer.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start every object's play hooks
    pub fn start_play(&mut self) {
        self.objects.start_all();
    }

    /// Stop every object's play hooks
    pub fn stop_play(&mut self) {
        self.objects.stop_all();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Flush a pending save, stop all objects, then release grid and registry.
    /// Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        if let Err(e) = self.flush_save() {
            log::warn!("Final save of '{}' failed: {}", self.key.url, e);
            self.timer().cancel();
        }
        self.detach_hooks();
        self.objects.release();
        self.grid.release();
        self.store = None;
        self.disposed = true;
        log::info!("Stage '{}' disposed", self.key.url);
    }
}

impl EditTarget for Stage {
    fn set_pixel(&mut self, x: i32, z: i32, tile: Tile) -> Tile {
        let change = self.grid.set_pixel(x, z, tile);
        if change.height_changed {
            self.objects.resnap_tile(self.key.origin, x, z, tile.height);
        }
        change.previous
    }

    fn create_object(&mut self, id: &str, class_id: u32, position: Vec3, args: &Map<String, Value>) -> bool {
        self.objects.create(id, class_id, position, args, &self.classes)
    }

    fn remove_object(&mut self, id: &str) -> Option<ObjectState> {
        self.objects.remove(id)
    }

    fn move_object(&mut self, id: &str, position: Vec3) -> Option<Vec3> {
        self.objects.move_to(id, position)
    }

    fn update_object(&mut self, id: &str, patch: &ArgsPatch) -> Option<ArgsPatch> {
        self.objects.update(id, patch)
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("key", &self.key)
            .field("grid", &self.grid)
            .field("objects", &self.objects)
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::edit::{Action, EditHistory};
    use crate::terrain::ManualClock;
    use std::time::Duration;

    /// Counts saves and keeps the last document
    #[derive(Clone, Default)]
    struct MemoryStore {
        saves: Arc<Mutex<Vec<MapDocument>>>,
    }

    impl MapStore for MemoryStore {
        fn save(&mut self, _url: &str, doc: &MapDocument) -> Result<()> {
            self.saves.lock().unwrap().push(doc.clone());
            Ok(())
        }
    }

    struct FailingStore;

    impl MapStore for FailingStore {
        fn save(&mut self, url: &str, _doc: &MapDocument) -> Result<()> {
            Err(Error::Document(format!("cannot save {}", url)))
        }
    }

    /// Fails the first `failures` writes, then records like `MemoryStore`
    struct FlakyStore {
        failures: usize,
        inner: MemoryStore,
    }

    impl MapStore for FlakyStore {
        fn save(&mut self, url: &str, doc: &MapDocument) -> Result<()> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(Error::Document(format!("disk full writing {}", url)));
            }
            self.inner.save(url, doc)
        }
    }

    fn stage_at(origin: IVec3) -> (Arc<ManualClock>, Stage) {
        let clock = Arc::new(ManualClock::new());
        let stage = Stage::new(
            StageKey::new("maps/test.json", origin),
            Arc::new(ClassRegistry::builtin()),
            clock.clone(),
            &EditorConfig { chunk_size: 4, ..Default::default() },
        );
        (clock, stage)
    }

    fn sample_doc() -> MapDocument {
        MapDocument::from_json_str(
            r#"{
                "chunksData": { "0,0": [0,0, 1,3, 0,0, 0,0, 0,0, 0,0, 0,0, 0,0,
                                        0,0, 0,0, 0,0, 0,0, 0,0, 0,0, 0,0, 0,0] },
                "objectsData": {
                    "spawn": { "clsId": 2, "args": {}, "x": 1.5, "y": 3, "z": 0.5 },
                    "future": { "clsId": 77, "args": {}, "x": 0, "y": 0, "z": 0 }
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_load_offsets_objects() {
        let (_clock, mut stage) = stage_at(IVec3::new(32, 0, -16));
        stage.load_document(&sample_doc()).unwrap();

        assert_eq!(stage.grid().peek(1, 0), Tile::new(1, 3));
        assert_eq!(stage.objects().len(), 1); // Unknown class skipped
        assert_eq!(
            stage.objects().get("spawn").unwrap().position,
            Vec3::new(33.5, 3.0, -15.5)
        );

        let doc = stage.to_document();
        assert_eq!(doc.objects_data["spawn"].position(), Vec3::new(1.5, 3.0, 0.5));
        assert_eq!(doc.chunks_data, sample_doc().chunks_data);
    }

    #[test]
    fn test_height_edit_resnaps_objects() {
        let (_clock, mut stage) = stage_at(IVec3::new(32, 0, -16));
        stage.load_document(&sample_doc()).unwrap();

        let mut history = EditHistory::new();
        history.commit_with(&mut stage, Action::set_pixel(1, 0, Tile::new(1, 8)));
        assert_eq!(stage.objects().get("spawn").unwrap().position.y, 8.0);

        history.undo(&mut stage);
        assert_eq!(stage.objects().get("spawn").unwrap().position.y, 3.0);
    }

    #[test]
    fn test_debounced_save_coalesces() {
        let (clock, mut stage) = stage_at(IVec3::ZERO);
        let store = MemoryStore::default();
        stage.attach_store(Box::new(store.clone()));

        for i in 0..10 {
            EditTarget::set_pixel(&mut stage, i, 0, Tile::new(1, i));
            clock.advance(Duration::from_millis(40));
            assert!(!stage.poll_save().unwrap());
        }
        clock.advance(Duration::from_millis(459));
        assert!(!stage.poll_save().unwrap());
        clock.advance(Duration::from_millis(1));
        assert!(stage.poll_save().unwrap());
        assert!(!stage.poll_save().unwrap());

        let saves = store.saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].chunks_data.len(), 3);
    }

    #[test]
    fn test_object_edit_schedules_save() {
        let (_clock, mut stage) = stage_at(IVec3::ZERO);
        stage.attach_store(Box::new(MemoryStore::default()));
        assert!(!stage.save_pending());
        stage.create_object("m", ClassRegistry::MARKER, Vec3::ZERO, &Map::new());
        assert!(stage.save_pending());
    }

    #[test]
    fn test_no_store_no_schedule() {
        let (_clock, mut stage) = stage_at(IVec3::ZERO);
        EditTarget::set_pixel(&mut stage, 0, 0, Tile::new(1, 1));
        assert!(!stage.save_pending());
    }

    #[test]
    fn test_dispose_flushes_and_releases() {
        let (_clock, mut stage) = stage_at(IVec3::ZERO);
        stage.load_document(&sample_doc()).unwrap();
        let store = MemoryStore::default();
        stage.attach_store(Box::new(store.clone()));
        EditTarget::set_pixel(&mut stage, 2, 2, Tile::new(5, 5));

        stage.start_play();
        stage.dispose();
        stage.dispose(); // Idempotent

        assert!(stage.is_disposed());
        assert_eq!(store.saves.lock().unwrap().len(), 1);
        assert_eq!(stage.grid().chunk_count(), 0);
        assert!(stage.objects().is_empty());
    }

    #[test]
    fn test_failed_save_is_reported() {
        let (clock, mut stage) = stage_at(IVec3::ZERO);
        stage.attach_store(Box::new(FailingStore));
        EditTarget::set_pixel(&mut stage, 0, 0, Tile::new(1, 1));
        clock.advance(Duration::from_secs(1));
        assert!(stage.poll_save().is_err());
    }

    #[test]
    fn test_failed_save_is_retried() {
        let (clock, mut stage) = stage_at(IVec3::ZERO);
        let saved = MemoryStore::default();
        stage.attach_store(Box::new(FlakyStore { failures: 1, inner: saved.clone() }));
        EditTarget::set_pixel(&mut stage, 0, 0, Tile::new(1, 1));

        clock.advance(Duration::from_secs(1));
        assert!(stage.poll_save().is_err());
        assert!(stage.save_pending());

        clock.advance(Duration::from_secs(1));
        assert!(stage.poll_save().unwrap());
        assert!(!stage.save_pending());

        let saves = saved.saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].chunks_data.len(), 1);
    }

    #[test]
    fn test_failed_flush_keeps_edits_pending() {
        let (_clock, mut stage) = stage_at(IVec3::ZERO);
        let saved = MemoryStore::default();
        stage.attach_store(Box::new(FlakyStore { failures: 1, inner: saved.clone() }));
        EditTarget::set_pixel(&mut stage, 0, 0, Tile::new(1, 1));

        assert!(stage.flush_save().is_err());
        stage.dispose();
        assert_eq!(saved.saves.lock().unwrap().len(), 1);
    }
}
