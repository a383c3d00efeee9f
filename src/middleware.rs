use crate::action::Action;
use crate::storage::Storage;
use crate::store::StateContainer;
use serde::Serialize;
use std::rc::Rc;

/// Writes the container's state to storage after every action.
///
/// The action is forwarded first, so the write sees the state produced by
/// that action. The rehydration action is forwarded but never written back,
/// since its state was just read. Writes are fire-and-forget: a failure is
/// logged and nothing else happens.
#[derive(Clone)]
pub struct PersistMiddleware {
    storage: Rc<dyn Storage>,
    key: String,
}

impl std::fmt::Debug for PersistMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistMiddleware")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl PersistMiddleware {
    pub fn new(storage: Rc<dyn Storage>, key: impl Into<String>) -> Self {
        PersistMiddleware {
            storage,
            key: key.into(),
        }
    }

    /// Returns the storage key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the storage back-end.
    pub fn storage(&self) -> &Rc<dyn Storage> {
        &self.storage
    }

    /// Forward `action` to `container`, then persist the resulting state.
    pub fn handle<S, A, C>(&self, container: &mut C, action: Action<A, S>)
    where
        S: Serialize,
        C: StateContainer<S, A> + ?Sized,
    {
        let is_init = action.is_rehydrate();
        container.dispatch(action);

        if is_init {
            return;
        }

        let value = match serde_json::to_value(container.state()) {
            Ok(value) => value,
            Err(e) => {
                log::error!("persiststate: unable to serialize state for key '{}': {e}", self.key);
                return;
            }
        };

        let key = self.key.clone();
        self.storage.put(
            &self.key,
            value,
            Box::new(move |result| {
                if let Err(e) = result {
                    log::error!("persiststate: unable to persist state under key '{key}': {e}");
                }
            }),
        );
    }
}
