//! Typed observer lists.
//!
//! Each component owns one `Observers<E>` per event kind instead of a
//! string-keyed emitter, so subscribers get the concrete payload type and a
//! handle they can later hand back to unsubscribe.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide so a handle never matches a subscriber on another list
static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Handle returned by [`Observers::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

type Callback<E> = Box<dyn FnMut(&E) + Send>;

/// Ordered list of callbacks for one event type.
pub struct Observers<E> {
    callbacks: Vec<(Subscription, Callback<E>)>,
}

impl<E> Observers<E> {
    /// Create an empty observer list
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Register a callback. Callbacks run in registration order.
    pub fn subscribe(&mut self, callback: impl FnMut(&E) + Send + 'static) -> Subscription {
        let handle = Subscription(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed));
        self.callbacks.push((handle, Box::new(callback)));
        handle
    }

    /// Remove a callback. Returns false if the handle was unknown.
    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(h, _)| *h != handle);
        self.callbacks.len() != before
    }

    /// Deliver an event to every subscriber
    pub fn emit(&mut self, event: &E) {
        for (_, callback) in self.callbacks.iter_mut() {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Drop every subscriber.
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.callbacks.len())
            .finish()
    }
}
