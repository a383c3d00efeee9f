use crate::action::Action;
use crate::buffer::ActionBuffer;
use crate::file::FileStore;
use crate::merge::{Merge, ShallowMerge};
use crate::middleware::PersistMiddleware;
use crate::reducer::{BoxReducer, MergePersisted, Reducer};
use crate::storage::{GetCallback, JsonAdapter, Storage};
use crate::store::{StateContainer, Store, Subscription};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;
use std::rc::{Rc, Weak};

/// Storage key used when none is configured.
pub const DEFAULT_KEY: &str = "redux-localstorage";

/// The storage argument of [`persist_state`].
///
/// A string in storage position is taken as the key, with the default
/// storage.
#[derive(Default)]
pub enum StorageArg {
    /// [`default_storage`] under the configured key.
    #[default]
    Default,
    /// [`default_storage`] under this key.
    Key(String),
    Adapter(Rc<dyn Storage>),
}

impl From<&str> for StorageArg {
    fn from(key: &str) -> Self {
        StorageArg::Key(key.to_string())
    }
}

impl From<String> for StorageArg {
    fn from(key: String) -> Self {
        StorageArg::Key(key)
    }
}

impl<T: Storage + 'static> From<T> for StorageArg {
    fn from(storage: T) -> Self {
        StorageArg::Adapter(Rc::new(storage))
    }
}

/// The default back-end: JSON files in [`FileStore::from_env`].
pub fn default_storage() -> Rc<dyn Storage> {
    default_storage_in(FileStore::from_env().dir())
}

/// The default back-end rooted at `dir` instead of the environment's
/// directory.
pub fn default_storage_in(dir: impl AsRef<Path>) -> Rc<dyn Storage> {
    Rc::new(JsonAdapter::new(FileStore::new(dir)))
}

type MergeFn<S> = Box<dyn Fn(S, S) -> S>;

/// Store enhancer that persists state after every action and rehydrates it
/// when the store is created.
///
/// Configure with the builder methods, then either call
/// [`create`](Self::create) for the built-in [`Store`] or
/// [`enhance`](Self::enhance) to wrap another store constructor.
///
/// # Examples
///
/// ```
/// use persiststate::{Action, MemoryStore, PersistState, adapter};
/// use serde_json::{Value, json};
///
/// fn settings(mut state: Value, action: &Action<(String, Value), Value>) -> Value {
///     if let Action::App((name, value)) = action {
///         state[name.as_str()] = value.clone();
///     }
///     state
/// }
///
/// let items = MemoryStore::new();
///
/// let store = PersistState::new()
///     .storage(adapter(items.clone()))
///     .key("settings")
///     .create(settings, json!({"theme": "light", "lang": "en"}));
/// store.dispatch(("theme".to_string(), json!("dark")));
///
/// // A second store over the same items picks the change up.
/// let store = PersistState::new()
///     .storage(adapter(items))
///     .key("settings")
///     .create(settings, json!({"theme": "light", "lang": "en", "beta": false}));
/// assert_eq!(store.state(), json!({"theme": "dark", "lang": "en", "beta": false}));
/// ```
pub struct PersistState<S> {
    storage: Rc<dyn Storage>,
    key: String,
    merge: Option<MergeFn<S>>,
}

impl<S> std::fmt::Debug for PersistState<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistState")
            .field("key", &self.key)
            .field("custom_merge", &self.merge.is_some())
            .finish_non_exhaustive()
    }
}

impl<S> Default for PersistState<S> {
    fn default() -> Self {
        PersistState {
            storage: default_storage(),
            key: DEFAULT_KEY.to_string(),
            merge: None,
        }
    }
}

/// Build a [`PersistState`] from a storage argument and an optional key.
///
/// * no storage: [`default_storage`], key or [`DEFAULT_KEY`]
/// * a string: that string is the key, with [`default_storage`]
/// * an adapter: that adapter, key or [`DEFAULT_KEY`]
pub fn persist_state<S>(storage: impl Into<StorageArg>, key: Option<&str>) -> PersistState<S> {
    let mut key = key.unwrap_or(DEFAULT_KEY).to_string();
    let storage = match storage.into() {
        StorageArg::Default => default_storage(),
        StorageArg::Key(k) => {
            key = k;
            default_storage()
        }
        StorageArg::Adapter(storage) => storage,
    };

    PersistState {
        storage,
        key,
        merge: None,
    }
}

impl<S> PersistState<S> {
    /// Default storage under [`DEFAULT_KEY`].
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage(mut self, storage: impl Storage + 'static) -> Self {
        self.storage = Rc::new(storage);
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Merge used when the reducer is wrapped automatically. Defaults to
    /// [`ShallowMerge`].
    pub fn merge(mut self, merge: impl Merge<S> + 'static) -> Self {
        self.merge = Some(Box::new(move |initial: S, persisted: S| {
            merge.merge(initial, persisted)
        }));
        self
    }

    /// Returns the configured storage key.
    pub fn storage_key(&self) -> &str {
        &self.key
    }
}

impl<S> PersistState<S>
where
    S: Serialize + DeserializeOwned + Clone + 'static,
{
    /// Enhance a store constructor.
    ///
    /// The returned constructor wraps the reducer for rehydration unless it
    /// [handles rehydration itself](Reducer::handles_rehydrate), builds the
    /// container with `create_store`, and starts reading persisted state.
    /// Actions dispatched before that read completes are held back and
    /// replayed after the rehydration action.
    pub fn enhance<A, R, C, F>(
        self,
        create_store: F,
    ) -> impl FnOnce(R, S) -> PersistedStore<S, A, C>
    where
        A: 'static,
        R: Reducer<S, A> + 'static,
        C: StateContainer<S, A> + 'static,
        F: FnOnce(BoxReducer<S, A>, S) -> C,
    {
        move |reducer: R, initial_state: S| {
            let reducer: BoxReducer<S, A> = if reducer.handles_rehydrate() {
                Box::new(reducer)
            } else {
                let merge: MergeFn<S> = match self.merge {
                    Some(merge) => merge,
                    None => Box::new(|initial: S, persisted: S| {
                        ShallowMerge.merge(initial, persisted)
                    }),
                };
                Box::new(MergePersisted::new(reducer, merge))
            };

            let container = create_store(reducer, initial_state);
            let middleware = PersistMiddleware::new(self.storage, self.key);
            let store = PersistedStore::new(container, middleware);
            store.load();
            store
        }
    }

    /// Enhance the built-in [`Store`] and create it.
    pub fn create<A, R>(self, reducer: R, initial_state: S) -> PersistedStore<S, A>
    where
        A: 'static,
        R: Reducer<S, A> + 'static,
    {
        self.enhance(Store::new)(reducer, initial_state)
    }
}

type Listener<S> = Rc<RefCell<Box<dyn FnMut(&S)>>>;

struct Shared<S, A, C> {
    container: RefCell<C>,
    buffer: RefCell<ActionBuffer<Action<A, S>>>,
    middleware: PersistMiddleware,
    inbox: RefCell<VecDeque<Action<A, S>>>,
    draining: Cell<bool>,
    rehydrated: Cell<bool>,
    listeners: RefCell<Vec<(Subscription, Listener<S>)>>,
    next_listener: Cell<u64>,
}

/// A store created through [`PersistState`].
///
/// Cloning yields another handle to the same store. The store moves from
/// uninitialized (actions are buffered, nothing is written) to live exactly
/// once, when the persisted state has been read and the rehydration action
/// applied.
///
/// Dispatching from inside a listener is allowed: the action runs after the
/// current one finishes.
pub struct PersistedStore<S, A, C = Store<S, A>> {
    shared: Rc<Shared<S, A, C>>,
}

impl<S, A, C> Clone for PersistedStore<S, A, C> {
    fn clone(&self) -> Self {
        PersistedStore {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S, A, C> std::fmt::Debug for PersistedStore<S, A, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStore")
            .field("key", &self.shared.middleware.key())
            .field("rehydrated", &self.shared.rehydrated.get())
            .field("pending", &self.shared.buffer.borrow().pending())
            .finish_non_exhaustive()
    }
}

impl<S, A, C> PersistedStore<S, A, C>
where
    S: Serialize + DeserializeOwned + 'static,
    A: 'static,
    C: StateContainer<S, A> + 'static,
{
    fn new(container: C, middleware: PersistMiddleware) -> Self {
        PersistedStore {
            shared: Rc::new(Shared {
                container: RefCell::new(container),
                buffer: RefCell::new(ActionBuffer::new()),
                middleware,
                inbox: RefCell::new(VecDeque::new()),
                draining: Cell::new(false),
                rehydrated: Cell::new(false),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    /// Read persisted state and dispatch the rehydration action when it
    /// arrives.
    fn load(&self) {
        let weak: Weak<Shared<S, A, C>> = Rc::downgrade(&self.shared);
        let key = self.shared.middleware.key().to_string();

        let done: GetCallback = Box::new(move |result| {
            // A stored `null` means nothing was persisted.
            let payload = match result {
                Ok(None) | Ok(Some(serde_json::Value::Null)) => None,
                Ok(Some(value)) => match serde_json::from_value::<S>(value) {
                    Ok(state) => Some(state),
                    Err(e) => {
                        log::error!(
                            "persiststate: value under key '{key}' does not fit the state type: {e}"
                        );
                        None
                    }
                },
                Err(e) => {
                    log::error!(
                        "persiststate: failed to retrieve persisted state under key '{key}': {e}"
                    );
                    None
                }
            };

            match weak.upgrade() {
                Some(shared) => {
                    let found = if payload.is_some() {
                        "persisted state found"
                    } else {
                        "nothing persisted"
                    };
                    log::debug!("persiststate: rehydrating key '{key}' ({found})");
                    PersistedStore { shared }.send(Action::rehydrate(payload));
                }
                None => {
                    log::debug!("persiststate: store for key '{key}' dropped before rehydration")
                }
            }
        });

        self.shared.middleware.storage().get(self.shared.middleware.key(), done);
    }

    /// Dispatch an application action.
    ///
    /// Before rehydration the action is buffered; afterwards it is applied
    /// and the new state is written to storage.
    pub fn dispatch(&self, action: A) {
        self.send(Action::App(action));
    }

    fn send(&self, action: Action<A, S>) {
        self.shared.inbox.borrow_mut().push_back(action);
        self.drain();
    }

    /// Apply queued actions unless a dispatch is already running or the
    /// container is borrowed by `with_state`/`with_container`. In both cases
    /// whoever holds the store drains the queue when it is done.
    fn drain(&self) {
        if self.shared.draining.get() || self.shared.container.try_borrow_mut().is_err() {
            return;
        }
        self.shared.draining.set(true);

        loop {
            let next = self.shared.inbox.borrow_mut().pop_front();
            let Some(action) = next else {
                break;
            };
            let released = self.shared.buffer.borrow_mut().admit(action);
            for action in released {
                self.forward(action);
            }
        }

        self.shared.draining.set(false);
    }

    fn forward(&self, action: Action<A, S>) {
        let is_init = action.is_rehydrate();
        log::trace!("persiststate: applying {} action", action.kind().tag());
        self.shared
            .middleware
            .handle(&mut *self.shared.container.borrow_mut(), action);
        if is_init {
            self.shared.rehydrated.set(true);
        }
        self.notify();
    }

    fn notify(&self) {
        let listeners: Vec<Listener<S>> = self
            .shared
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        if listeners.is_empty() {
            return;
        }

        let container = self.shared.container.borrow();
        for listener in listeners {
            let mut listener = listener.borrow_mut();
            (*listener)(container.state());
        }
    }

    /// Register a listener called with the new state after every applied
    /// action, including the rehydration action.
    pub fn subscribe(&self, listener: impl FnMut(&S) + 'static) -> Subscription {
        let id = Subscription(self.shared.next_listener.get());
        self.shared.next_listener.set(id.0 + 1);
        let listener: Box<dyn FnMut(&S)> = Box::new(listener);
        self.shared
            .listeners
            .borrow_mut()
            .push((id, Rc::new(RefCell::new(listener))));
        id
    }

    /// Remove a listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.shared.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != before
    }

    /// Run `f` against the current state.
    ///
    /// Actions dispatched from inside `f` are applied once `f` returns.
    pub fn with_state<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let result = f(self.shared.container.borrow().state());
        self.drain();
        result
    }

    /// A copy of the current state.
    pub fn state(&self) -> S
    where
        S: Clone,
    {
        self.with_state(S::clone)
    }

    /// Run `f` against the underlying container, for anything the
    /// persisted store does not wrap.
    ///
    /// Actions dispatched from inside `f` are applied once `f` returns.
    pub fn with_container<T>(&self, f: impl FnOnce(&C) -> T) -> T {
        let result = f(&self.shared.container.borrow());
        self.drain();
        result
    }

    /// Whether persisted state has been applied and the store is live.
    pub fn is_rehydrated(&self) -> bool {
        self.shared.rehydrated.get()
    }

    /// Number of actions waiting for rehydration.
    pub fn pending(&self) -> usize {
        self.shared.buffer.borrow().pending()
    }

    /// Returns the storage key.
    pub fn key(&self) -> &str {
        self.shared.middleware.key()
    }
}
