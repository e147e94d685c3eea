//! Bounded cache of loaded stages
//!
//! Stages are kept in load order. Loading past capacity evicts and disposes
//! the oldest one. Loads run through a single-flight queue so a key that is
//! requested twice is only fetched once.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{EditorConfig, EditorState};
use crate::core::types::{IVec3, Result};
use crate::core::Error;
use crate::terrain::{Clock, SystemClock};
use super::classes::ClassRegistry;
use super::source::StageSource;
use super::stage::{Stage, StageKey};
use super::store::{JsonFileStore, MapStore};

/// Builds the save target of a freshly loaded stage
pub type StoreFactory = Box<dyn Fn(&StageKey) -> Box<dyn MapStore> + Send + Sync>;

struct PagerInner {
    /// Oldest first
    active: VecDeque<Stage>,
    in_flight: HashSet<StageKey>,
    state: EditorState,
    disposed: bool,
}

/// Pages stage documents in and out
pub struct StagePager<S: StageSource> {
    source: S,
    classes: Arc<ClassRegistry>,
    clock: Arc<dyn Clock>,
    config: EditorConfig,
    store_factory: Option<StoreFactory>,
    /// Fair FIFO queue; held for the whole of one load
    queue: tokio::sync::Mutex<()>,
    inner: Mutex<PagerInner>,
}

impl<S: StageSource> StagePager<S> {
    /// Create a pager
    ///
    /// # Arguments
    /// * `source` - Where documents are fetched from
    /// * `classes` - Class table shared by every stage
    /// * `config` - Capacity, chunk size and save window
    /// * `state` - Session state restored by the host
    pub fn new(source: S, classes: Arc<ClassRegistry>, config: EditorConfig, state: EditorState) -> Self {
        Self {
            source,
            classes,
            clock: Arc::new(SystemClock),
            config,
            store_factory: None,
            queue: tokio::sync::Mutex::new(()),
            inner: Mutex::new(PagerInner {
                active: VecDeque::new(),
                in_flight: HashSet::new(),
                state,
                disposed: false,
            }),
        }
    }

    /// Use `clock` for every stage's save debounce
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach a store built by `factory` to every loaded stage
    pub fn with_store_factory(mut self, factory: StoreFactory) -> Self {
        self.store_factory = Some(factory);
        self
    }

    /// Save every stage as JSON under the configured storage directory
    pub fn with_json_store(self) -> Self {
        let dir = self.config.storage_dir.clone();
        self.with_store_factory(Box::new(move |_| Box::new(JsonFileStore::new(&dir))))
    }

    fn lock(&self) -> MutexGuard<'_, PagerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the stage for `(url, origin)` active and return its url.
    ///
    /// Returns at once if it is already active. Otherwise waits its turn in
    /// the load queue, fetches, and appends; an identical request that
    /// completed while waiting is reused instead of fetched again. A failed
    /// fetch leaves the active stages untouched.
    pub async fn load_from_url(&self, url: &str, origin: IVec3) -> Result<String> {
        let key = StageKey::new(url, origin);
        if self.check_active(&key)? {
            return Ok(key.url);
        }

        let _turn = self.queue.lock().await;
        if self.check_active(&key)? {
            log::debug!("Load of '{}' deduplicated", key.url);
            return Ok(key.url);
        }

        self.lock().in_flight.insert(key.clone());
        log::info!("Fetching stage '{}' at {:?}", key.url, key.origin);
        let fetched = self.source.fetch(&key.url).await;
        self.lock().in_flight.remove(&key);

        let doc = match fetched {
            Ok(doc) => doc,
            Err(e) => {
                log::error!("Loading stage '{}' failed: {}", key.url, e);
                return Err(e);
            }
        };

        if self.is_disposed() {
            log::debug!("Dropping late fetch of '{}': pager disposed", key.url);
            return Err(Error::PagerDisposed);
        }

        let mut stage = Stage::from_document(
            key.clone(),
            &doc,
            Arc::clone(&self.classes),
            Arc::clone(&self.clock),
            &self.config,
        )?;
        if let Some(factory) = &self.store_factory {
            stage.attach_store(factory(&key));
        }

        self.admit(stage)?;
        Ok(key.url)
    }

    /// Make `stage` active and evict the oldest stages over capacity.
    ///
    /// The disposed check shares the lock with the insert, so a concurrent
    /// `dispose` either sees the stage or rejects it.
    fn admit(&self, stage: Stage) -> Result<()> {
        let admitted = {
            let mut inner = self.lock();
            if inner.disposed {
                Err(stage)
            } else {
                inner.state.last_loaded = Some(stage.url().to_string());
                inner.active.push_back(stage);

                let mut evicted = Vec::new();
                while inner.active.len() > self.config.pager_capacity {
                    if let Some(oldest) = inner.active.pop_front() {
                        inner.state.oldest_url = Some(oldest.url().to_string());
                        evicted.push(oldest);
                    }
                }
                Ok(evicted)
            }
        };

        let evicted = match admitted {
            Ok(evicted) => evicted,
            Err(mut rejected) => {
                log::debug!("Dropping stage '{}': pager disposed", rejected.url());
                rejected.dispose();
                return Err(Error::PagerDisposed);
            }
        };

        for mut stage in evicted {
            log::info!("Evicting stage '{}'", stage.url());
            stage.dispose();
        }
        Ok(())
    }

    /// Whether `key` is active. Fails once the pager is disposed.
    fn check_active(&self, key: &StageKey) -> Result<bool> {
        let inner = self.lock();
        if inner.disposed {
            return Err(Error::PagerDisposed);
        }
        Ok(inner.active.iter().any(|s| s.key() == key))
    }

    /// Keys of the active stages, oldest first
    pub fn active_keys(&self) -> Vec<StageKey> {
        self.lock().active.iter().map(|s| s.key().clone()).collect()
    }

    pub fn active_count(&self) -> usize {
        self.lock().active.len()
    }

    pub fn capacity(&self) -> usize {
        self.config.pager_capacity
    }

    pub fn is_active(&self, url: &str, origin: IVec3) -> bool {
        let key = StageKey::new(url, origin);
        self.lock().active.iter().any(|s| *s.key() == key)
    }

    /// Whether a fetch for `(url, origin)` is under way
    pub fn is_loading(&self, url: &str, origin: IVec3) -> bool {
        self.lock().in_flight.contains(&StageKey::new(url, origin))
    }

    /// Run `f` on the active stage for `key`
    pub fn with_stage<R>(&self, key: &StageKey, f: impl FnOnce(&mut Stage) -> R) -> Option<R> {
        let mut inner = self.lock();
        inner.active.iter_mut().find(|s| s.key() == key).map(f)
    }

    /// Run `f` on every active stage, oldest first
    pub fn for_each_stage_mut(&self, mut f: impl FnMut(&mut Stage)) {
        let mut inner = self.lock();
        for stage in inner.active.iter_mut() {
            f(stage);
        }
    }

    /// Drive every stage's debounced save. Returns how many stages saved.
    pub fn poll_saves(&self) -> usize {
        let mut saved = 0;
        self.for_each_stage_mut(|stage| match stage.poll_save() {
            Ok(true) => saved += 1,
            Ok(false) => {}
            Err(e) => log::warn!("Saving '{}' failed: {}", stage.url(), e),
        });
        saved
    }

    /// Snapshot of the session state
    pub fn state(&self) -> EditorState {
        self.lock().state.clone()
    }

    /// Url of the most recently evicted stage
    pub fn oldest_url(&self) -> Option<String> {
        self.lock().state.oldest_url.clone()
    }

    /// Dispose every active stage and refuse further loads
    pub fn dispose(&self) {
        let stages: Vec<Stage> = {
            let mut inner = self.lock();
            if inner.disposed {
                return;
            }
            inner.disposed = true;
            inner.active.drain(..).collect()
        };

        log::info!("Disposing stage pager ({} stages)", stages.len());
        for mut stage in stages {
            stage.dispose();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }
}

impl<S: StageSource> Drop for StagePager<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}
