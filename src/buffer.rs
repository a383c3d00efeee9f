use crate::action::Bypass;
use std::collections::VecDeque;
use std::fmt;

/// Holds actions back until a bypass action arrives, then releases them.
///
/// While active, every action is queued except one whose
/// [`Bypass::bypasses_buffer`] is true. That action is released first,
/// followed by the queue in arrival order, and the buffer deactivates for
/// good: from then on every action is released immediately.
///
/// # Examples
///
/// ```
/// use persiststate::{Action, ActionBuffer};
///
/// let mut buffer = ActionBuffer::new();
/// let mut seen = Vec::new();
///
/// buffer.dispatch(Action::<&str, u8>::App("a"), |a| seen.push(a));
/// buffer.dispatch(Action::App("b"), |a| seen.push(a));
/// assert!(seen.is_empty());
///
/// buffer.dispatch(Action::rehydrate(None), |a| seen.push(a));
/// assert_eq!(
///     seen,
///     vec![Action::rehydrate(None), Action::App("a"), Action::App("b")]
/// );
/// assert!(!buffer.is_active());
/// ```
pub struct ActionBuffer<T> {
    queue: VecDeque<T>,
    active: bool,
}

impl<T> fmt::Debug for ActionBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionBuffer")
            .field("active", &self.active)
            .field("pending", &self.queue.len())
            .finish()
    }
}

impl<T> Default for ActionBuffer<T> {
    fn default() -> Self {
        ActionBuffer {
            queue: VecDeque::new(),
            active: true,
        }
    }
}

impl<T: Bypass> ActionBuffer<T> {
    /// Create an active, empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept an action and return the actions that may now be forwarded,
    /// in the order they must be forwarded.
    ///
    /// The result is empty when the action was queued. Callers that hold
    /// other borrows while forwarding should prefer this over
    /// [`dispatch`](Self::dispatch), since nothing is forwarded while the
    /// buffer itself is borrowed.
    pub fn admit(&mut self, action: T) -> Vec<T> {
        if !self.active {
            return vec![action];
        }

        if !action.bypasses_buffer() {
            self.queue.push_back(action);
            log::trace!("persiststate: buffered action ({} pending)", self.queue.len());
            return Vec::new();
        }

        self.active = false;
        let mut released = Vec::with_capacity(self.queue.len() + 1);
        released.push(action);
        released.extend(self.queue.drain(..));
        log::debug!(
            "persiststate: buffer released {} queued action(s)",
            released.len() - 1
        );
        released
    }

    /// Accept an action and pass every releasable action to `forward`.
    pub fn dispatch(&mut self, action: T, mut forward: impl FnMut(T)) {
        for action in self.admit(action) {
            forward(action);
        }
    }
}

impl<T> ActionBuffer<T> {
    /// Whether actions are still being held back.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of actions waiting for release.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}
