//! Editing and play modes over a pager-backed session

use crate::core::types::IVec3;
use crate::edit::{Action, EditHistory};
use crate::stage::{Stage, StageKey, StagePager, StageSource};
use super::stack::Mode;

/// What the modes operate on: the loaded stages, the edit history, and the
/// stage edits are routed to.
pub struct Session<S: StageSource> {
    pub pager: StagePager<S>,
    pub history: EditHistory,
    focus: Option<StageKey>,
}

impl<S: StageSource> Session<S> {
    pub fn new(pager: StagePager<S>) -> Self {
        Self {
            pager,
            history: EditHistory::new(),
            focus: None,
        }
    }

    /// Route edits to `(url, origin)`.
    ///
    /// History is kept per stage, so switching stages commits and forgets
    /// the previous stage's history.
    pub fn focus(&mut self, url: &str, origin: IVec3) {
        let key = StageKey::new(url, origin);
        if self.focus.as_ref() == Some(&key) {
            return;
        }
        self.history.commit();
        self.history.clear();
        self.focus = Some(key);
    }

    pub fn focused(&self) -> Option<&StageKey> {
        self.focus.as_ref()
    }

    /// Run `f` with the focused stage and the history
    fn with_focus<R>(&mut self, f: impl FnOnce(&mut Stage, &mut EditHistory) -> R) -> Option<R> {
        let key = self.focus.as_ref()?;
        let history = &mut self.history;
        let result = self.pager.with_stage(key, |stage| f(stage, history));
        if result.is_none() {
            log::warn!("Focused stage '{}' is not loaded", key.url);
        }
        result
    }

    /// Apply an action to the focused stage as part of the pending batch
    pub fn push(&mut self, action: Action) -> bool {
        self.with_focus(|stage, history| history.push(stage, action))
            .unwrap_or(false)
    }

    pub fn commit(&mut self) -> bool {
        self.history.commit()
    }

    pub fn undo(&mut self) -> bool {
        self.with_focus(|stage, history| history.undo(stage))
            .unwrap_or(false)
    }

    pub fn redo(&mut self) -> bool {
        self.with_focus(|stage, history| history.redo(stage))
            .unwrap_or(false)
    }
}

/// Interactive editing
#[derive(Debug, Default)]
pub struct EditMode;

impl<S: StageSource> Mode<Session<S>> for EditMode {
    fn name(&self) -> &'static str {
        "edit"
    }

    fn exit(&mut self, session: &mut Session<S>) {
        session.history.commit();
    }

    fn suspend(&mut self, session: &mut Session<S>) {
        session.history.commit();
    }
}

/// Objects run their play hooks
#[derive(Debug, Default)]
pub struct PlayMode;

impl PlayMode {
    fn start<S: StageSource>(session: &mut Session<S>) {
        session.pager.for_each_stage_mut(|stage| stage.start_play());
    }

    fn stop<S: StageSource>(session: &mut Session<S>) {
        session.pager.for_each_stage_mut(|stage| stage.stop_play());
    }
}

impl<S: StageSource> Mode<Session<S>> for PlayMode {
    fn name(&self) -> &'static str {
        "play"
    }

    fn enter(&mut self, session: &mut Session<S>) {
        Self::start(session);
    }

    fn exit(&mut self, session: &mut Session<S>) {
        Self::stop(session);
    }

    fn suspend(&mut self, session: &mut Session<S>) {
        Self::stop(session);
    }

    fn resume(&mut self, session: &mut Session<S>) {
        Self::start(session);
    }
}
