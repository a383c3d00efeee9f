use crate::action::Action;
use crate::reducer::{BoxReducer, Reducer};

/// A state container: holds the current state and applies actions to it.
///
/// [`PersistState::enhance`](crate::PersistState::enhance) accepts any
/// container, so an application can bring its own store as long as actions
/// reach the reducer it was constructed with.
pub trait StateContainer<S, A> {
    fn dispatch(&mut self, action: Action<A, S>);

    fn state(&self) -> &S;
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(pub(crate) u64);

/// The plain state container: a reducer, its current state, and listeners
/// notified after every action.
///
/// # Examples
///
/// ```
/// use persiststate::{Action, StateContainer, create_store};
///
/// fn counter(state: u64, action: &Action<u64, u64>) -> u64 {
///     match action {
///         Action::App(n) => state + n,
///         Action::Rehydrate(_) => state,
///     }
/// }
///
/// let mut store = create_store(counter, 0);
/// store.dispatch(Action::App(5));
/// assert_eq!(*store.state(), 5);
/// ```
pub struct Store<S, A> {
    reducer: BoxReducer<S, A>,
    state: S,
    listeners: Vec<(Subscription, Box<dyn FnMut(&S)>)>,
    next_id: u64,
}

impl<S: std::fmt::Debug, A> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<S, A> Store<S, A> {
    pub fn new(reducer: BoxReducer<S, A>, initial_state: S) -> Self {
        Store {
            reducer,
            state: initial_state,
            listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Register a listener called with the new state after every action.
    pub fn subscribe(&mut self, listener: impl FnMut(&S) + 'static) -> Subscription {
        let id = Subscription(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription);
        self.listeners.len() != before
    }

    /// Returns whether the store's reducer handles rehydration itself.
    pub fn handles_rehydrate(&self) -> bool {
        self.reducer.handles_rehydrate()
    }
}

impl<S: Clone, A> StateContainer<S, A> for Store<S, A> {
    /// Reduces a clone of the current state.
    fn dispatch(&mut self, action: Action<A, S>) {
        self.state = self.reducer.reduce(self.state.clone(), &action);
        for (_, listener) in &mut self.listeners {
            listener(&self.state);
        }
    }

    fn state(&self) -> &S {
        &self.state
    }
}

/// Build a [`Store`] from any reducer.
pub fn create_store<S, A>(
    reducer: impl Reducer<S, A> + 'static,
    initial_state: S,
) -> Store<S, A> {
    Store::new(Box::new(reducer), initial_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn push(mut state: Vec<u32>, action: &Action<u32, Vec<u32>>) -> Vec<u32> {
        if let Action::App(n) = action {
            state.push(*n);
        }
        state
    }

    #[test]
    fn listeners_see_new_state() {
        let mut store = create_store(push, Vec::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |state: &Vec<u32>| sink.borrow_mut().push(state.len()));

        store.dispatch(Action::App(1));
        store.dispatch(Action::App(2));
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = create_store(push, Vec::new());
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let sub = store.subscribe(move |_: &Vec<u32>| *sink.borrow_mut() += 1);

        store.dispatch(Action::App(1));
        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.dispatch(Action::App(2));
        assert_eq!(*count.borrow(), 1);
        assert_eq!(*store.state(), vec![1, 2]);
    }

    #[derive(Clone, Debug, PartialEq)]
    struct Cursor {
        line: u32,
    }

    fn down(state: Cursor, _action: &Action<(), Cursor>) -> Cursor {
        Cursor {
            line: state.line + 1,
        }
    }

    #[test]
    fn state_without_default() {
        let mut store = create_store(down, Cursor { line: 7 });
        store.dispatch(Action::App(()));
        assert_eq!(*store.state(), Cursor { line: 8 });
    }

    #[test]
    fn plain_reducer_is_not_self_rehydrating() {
        let store = create_store(push, Vec::new());
        assert!(!store.handles_rehydrate());
    }
}
