/// Type tag of the rehydration action.
///
/// Application actions never carry this tag; it is reserved for the single
/// [`Rehydrate`] action a [`PersistedStore`](crate::PersistedStore) dispatches
/// once persisted state has been read back.
pub const INIT: &str = "@@persiststate/INIT";

/// Marker flags attached to an action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Meta {
    /// When set, the action skips the [`ActionBuffer`](crate::ActionBuffer)
    /// queue and releases everything buffered behind it.
    pub buffer_buster: bool,
}

/// The initialization action carrying previously persisted state.
///
/// `payload` is `None` when nothing was stored under the key, or when the
/// read failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Rehydrate<S> {
    pub payload: Option<S>,
    pub meta: Meta,
}

impl<S> Rehydrate<S> {
    /// Create a rehydration action with the buffer-buster marker set.
    pub fn new(payload: Option<S>) -> Self {
        Rehydrate {
            payload,
            meta: Meta {
                buffer_buster: true,
            },
        }
    }
}

/// Every action a persisted store's reducer can receive.
///
/// `A` is the application's own action type, `S` its state type (the
/// rehydration payload).
///
/// # Examples
///
/// ```
/// use persiststate::{Action, ActionKind, INIT};
///
/// let action: Action<&str, u64> = Action::rehydrate(Some(3));
/// assert_eq!(action.kind(), ActionKind::Rehydrate);
/// assert_eq!(action.kind().tag(), INIT);
///
/// let action: Action<&str, u64> = Action::App("increment");
/// assert_eq!(action.app(), Some(&"increment"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Action<A, S> {
    Rehydrate(Rehydrate<S>),
    App(A),
}

/// Closed set of action kinds this crate distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Rehydrate,
    App,
}

impl ActionKind {
    /// The type tag for this kind. Application actions share the tag `"app"`.
    pub fn tag(self) -> &'static str {
        match self {
            ActionKind::Rehydrate => INIT,
            ActionKind::App => "app",
        }
    }
}

impl<A, S> Action<A, S> {
    /// Shorthand for `Action::Rehydrate(Rehydrate::new(payload))`.
    pub fn rehydrate(payload: Option<S>) -> Self {
        Action::Rehydrate(Rehydrate::new(payload))
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Rehydrate(_) => ActionKind::Rehydrate,
            Action::App(_) => ActionKind::App,
        }
    }

    pub fn is_rehydrate(&self) -> bool {
        matches!(self, Action::Rehydrate(_))
    }

    /// The application action, if this is one.
    pub fn app(&self) -> Option<&A> {
        match self {
            Action::App(action) => Some(action),
            Action::Rehydrate(_) => None,
        }
    }
}

impl<A, S> From<A> for Action<A, S> {
    fn from(action: A) -> Self {
        Action::App(action)
    }
}

/// Actions that can jump the [`ActionBuffer`](crate::ActionBuffer) queue.
pub trait Bypass {
    fn bypasses_buffer(&self) -> bool;
}

impl<A, S> Bypass for Action<A, S> {
    fn bypasses_buffer(&self) -> bool {
        match self {
            Action::Rehydrate(init) => init.meta.buffer_buster,
            Action::App(_) => false,
        }
    }
}
