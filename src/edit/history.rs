//! Linear undo/redo log of committed action batches

use crate::core::{Observers, Subscription};
use super::action::{Action, EditTarget};

/// Actions committed together as one undo step
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    actions: Vec<Action>,
}

impl Batch {
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Payload of the history `change` event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryChange {
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Undo/redo stacks plus the batch currently being built.
///
/// Everything in the pending batch has already been applied to the target.
pub struct EditHistory {
    pending: Batch,
    undo_stack: Vec<Batch>,
    redo_stack: Vec<Batch>,
    changed: Observers<HistoryChange>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self {
            pending: Batch::default(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            changed: Observers::new(),
        }
    }

    /// Apply `action` now and add it to the pending batch.
    ///
    /// Actions that change nothing (unknown class, missing object) are
    /// dropped. New history discards anything left to redo.
    pub fn push<T: EditTarget + ?Sized>(&mut self, target: &mut T, mut action: Action) -> bool {
        if !action.apply(target) {
            log::debug!("Dropping no-op {} action", action.label());
            return false;
        }
        self.pending.actions.push(action);

        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
            self.notify();
        }
        true
    }

    /// Freeze the pending batch as one undo step. No-op when nothing is pending.
    pub fn commit(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let batch = std::mem::take(&mut self.pending);
        log::debug!("Committed batch of {} actions", batch.len());
        self.undo_stack.push(batch);
        self.redo_stack.clear();
        self.notify();
        true
    }

    /// Push one more action, then commit
    pub fn commit_with<T: EditTarget + ?Sized>(&mut self, target: &mut T, action: Action) -> bool {
        self.push(target, action);
        self.commit()
    }

    /// Revert the most recent batch, last action first.
    ///
    /// A pending batch is committed first so it is what gets undone.
    pub fn undo<T: EditTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        self.commit();
        let Some(batch) = self.undo_stack.pop() else {
            return false;
        };

        for action in batch.actions.iter().rev() {
            match action.inverse() {
                Some(mut inverse) => {
                    if !inverse.apply(target) {
                        log::warn!("Undo of {} found diverged state", action.label());
                    }
                }
                None => log::warn!("Undo of {} has no recorded before-state", action.label()),
            }
        }

        self.redo_stack.push(batch);
        self.notify();
        true
    }

    /// Re-apply the most recently undone batch in original order
    pub fn redo<T: EditTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        let Some(mut batch) = self.redo_stack.pop() else {
            return false;
        };

        for action in batch.actions.iter_mut() {
            if !action.apply(target) {
                log::warn!("Redo of {} found diverged state", action.label());
            }
        }

        self.undo_stack.push(batch);
        self.notify();
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Actions pushed since the last commit
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget all history. Does not touch the target.
    pub fn clear(&mut self) {
        self.pending = Batch::default();
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.notify();
    }

    pub fn on_change(&mut self, f: impl FnMut(&HistoryChange) + Send + 'static) -> Subscription {
        self.changed.subscribe(f)
    }

    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        self.changed.unsubscribe(handle)
    }

    fn notify(&mut self) {
        let change = HistoryChange {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        };
        self.changed.emit(&change);
    }
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EditHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditHistory")
            .field("pending", &self.pending.len())
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;
    use crate::edit::action::sandbox::Sandbox;
    use crate::stage::classes::ClassRegistry;
    use crate::terrain::Tile;
    use serde_json::Map;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_batch_undo_restores_all_cells() {
        let mut sb = Sandbox::new();
        let mut history = EditHistory::new();
        for x in 0..5 {
            history.push(&mut sb, Action::set_pixel(x, 0, Tile::new(1, x + 1)));
        }
        assert!(history.commit());
        assert_eq!(history.undo_len(), 1);

        assert!(history.undo(&mut sb));
        for x in 0..5 {
            assert_eq!(sb.grid.peek(x, 0), Tile::DEFAULT);
        }
    }

    #[test]
    fn test_reverse_order_over_same_cell() {
        let mut sb = Sandbox::new();
        let mut history = EditHistory::new();
        history.push(&mut sb, Action::set_pixel(2, 2, Tile::new(1, 1)));
        history.push(&mut sb, Action::set_pixel(2, 2, Tile::new(2, 2)));
        history.push(&mut sb, Action::set_pixel(2, 2, Tile::new(3, 3)));
        history.commit();

        history.undo(&mut sb);
        assert_eq!(sb.grid.peek(2, 2), Tile::DEFAULT);

        history.redo(&mut sb);
        assert_eq!(sb.grid.peek(2, 2), Tile::new(3, 3));
    }

    #[test]
    fn test_redo_reverses_undo() {
        let mut sb = Sandbox::new();
        let mut history = EditHistory::new();
        history.push(&mut sb, Action::create_object("a", ClassRegistry::MARKER, Vec3::ZERO, Map::new()));
        history.push(&mut sb, Action::move_object("a", Vec3::new(3.0, 0.0, 1.0)));
        history.commit();

        history.undo(&mut sb);
        assert!(!sb.objects.contains("a"));
        assert!(history.can_redo());

        history.redo(&mut sb);
        assert_eq!(sb.objects.get("a").unwrap().position, Vec3::new(3.0, 0.0, 1.0));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_after_undo_clears_redo() {
        let mut sb = Sandbox::new();
        let mut history = EditHistory::new();
        history.commit_with(&mut sb, Action::set_pixel(0, 0, Tile::new(1, 0)));
        history.undo(&mut sb);
        assert!(history.can_redo());

        history.push(&mut sb, Action::set_pixel(1, 0, Tile::new(1, 0)));
        assert!(!history.can_redo());
        assert!(!history.redo(&mut sb));
    }

    #[test]
    fn test_empty_commit_is_noop() {
        let mut history = EditHistory::new();
        assert!(!history.commit());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_noop_actions_are_dropped() {
        let mut sb = Sandbox::new();
        let mut history = EditHistory::new();
        assert!(!history.push(&mut sb, Action::create_object("x", 999, Vec3::ZERO, Map::new())));
        assert!(!history.push(&mut sb, Action::remove_object("nobody")));
        assert_eq!(history.pending_len(), 0);
        assert!(!history.commit());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_empty_is_noop() {
        let mut sb = Sandbox::new();
        let mut history = EditHistory::new();
        assert!(!history.undo(&mut sb));
        assert!(!history.redo(&mut sb));
    }

    #[test]
    fn test_undo_commits_pending_first() {
        let mut sb = Sandbox::new();
        let mut history = EditHistory::new();
        history.commit_with(&mut sb, Action::set_pixel(0, 0, Tile::new(1, 1)));
        history.push(&mut sb, Action::set_pixel(1, 0, Tile::new(2, 2)));

        history.undo(&mut sb);
        assert_eq!(sb.grid.peek(1, 0), Tile::DEFAULT);
        assert_eq!(sb.grid.peek(0, 0), Tile::new(1, 1));
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_undo_against_diverged_state_does_not_panic() {
        let mut sb = Sandbox::new();
        let mut history = EditHistory::new();
        history.commit_with(
            &mut sb,
            Action::create_object("a", ClassRegistry::MARKER, Vec3::ZERO, Map::new()),
        );
        sb.objects.remove("a"); // Removed behind the history's back

        assert!(history.undo(&mut sb));
        assert!(history.redo(&mut sb));
        assert!(sb.objects.contains("a"));
    }

    #[test]
    fn test_change_events() {
        let mut sb = Sandbox::new();
        let mut history = EditHistory::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        history.on_change(move |c| sink.lock().unwrap().push(*c));

        history.commit_with(&mut sb, Action::set_pixel(0, 0, Tile::new(1, 0)));
        history.undo(&mut sb);
        history.redo(&mut sb);

        let log = log.lock().unwrap();
        assert_eq!(
            *log,
            vec![
                HistoryChange { can_undo: true, can_redo: false },
                HistoryChange { can_undo: false, can_redo: true },
                HistoryChange { can_undo: true, can_redo: false },
            ]
        );
    }
}
