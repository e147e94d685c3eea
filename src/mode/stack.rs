//! Stack of active editor modes

/// One editor mode.
///
/// Only the top of the stack is running. A mode below it is suspended until
/// everything above has been popped. Every hook defaults to doing nothing.
pub trait Mode<C> {
    fn name(&self) -> &'static str;
    /// Became the top of the stack for the first time
    fn enter(&mut self, _ctx: &mut C) {}
    /// Left the stack
    fn exit(&mut self, _ctx: &mut C) {}
    /// Another mode was pushed on top
    fn suspend(&mut self, _ctx: &mut C) {}
    /// The mode on top was popped
    fn resume(&mut self, _ctx: &mut C) {}
}

/// Modes in push order (last = current)
pub struct ModeStack<C> {
    modes: Vec<Box<dyn Mode<C>>>,
}

impl<C> ModeStack<C> {
    pub fn new() -> Self {
        Self { modes: Vec::new() }
    }

    /// Suspend the current mode and enter `mode`
    pub fn push(&mut self, mut mode: Box<dyn Mode<C>>, ctx: &mut C) {
        if let Some(top) = self.modes.last_mut() {
            top.suspend(ctx);
        }
        log::debug!("Entering mode '{}'", mode.name());
        mode.enter(ctx);
        self.modes.push(mode);
    }

    /// Exit the current mode and resume the one below
    pub fn pop(&mut self, ctx: &mut C) -> Option<Box<dyn Mode<C>>> {
        let mut mode = self.modes.pop()?;
        log::debug!("Leaving mode '{}'", mode.name());
        mode.exit(ctx);
        if let Some(top) = self.modes.last_mut() {
            top.resume(ctx);
        }
        Some(mode)
    }

    /// Exit the current mode and enter `mode` in its place. The mode below
    /// is neither resumed nor suspended.
    pub fn replace(&mut self, mut mode: Box<dyn Mode<C>>, ctx: &mut C) -> Option<Box<dyn Mode<C>>> {
        let previous = self.modes.pop().map(|mut old| {
            log::debug!("Leaving mode '{}'", old.name());
            old.exit(ctx);
            old
        });
        log::debug!("Entering mode '{}'", mode.name());
        mode.enter(ctx);
        self.modes.push(mode);
        previous
    }

    /// Exit every mode, top first
    pub fn clear(&mut self, ctx: &mut C) {
        while let Some(mut mode) = self.modes.pop() {
            mode.exit(ctx);
        }
    }

    pub fn current_name(&self) -> Option<&'static str> {
        self.modes.last().map(|m| m.name())
    }

    /// Names bottom to top
    pub fn names(&self) -> Vec<&'static str> {
        self.modes.iter().map(|m| m.name()).collect()
    }

    pub fn depth(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl<C> Default for ModeStack<C> {
    fn default() -> Self {
        Self::new()
    }
}
