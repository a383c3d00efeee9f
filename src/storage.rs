//! The storage contract consumed by [`PersistState`](crate::PersistState),
//! and the JSON adapter that puts any string key-value medium behind it.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;

/// Errors reported by storage back-ends through their completion callbacks.
///
/// A persisted store never surfaces these to the application: read errors
/// are logged and treated as "nothing persisted", write errors are logged
/// and dropped.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A custom back-end failure.
    #[error("{0}")]
    Adapter(String),
}

/// Completion handler for [`Storage::get`].
pub type GetCallback = Box<dyn FnOnce(Result<Option<Value>, StorageError>)>;

/// Completion handler for [`Storage::put`].
pub type PutCallback = Box<dyn FnOnce(Result<(), StorageError>)>;

/// An asynchronous key-value back-end for persisted state.
///
/// Both operations report through a callback that may run before the method
/// returns or at any later point on the same thread. Values are opaque: the
/// back-end stores whatever [`Value`] it is given and hands the same value
/// back.
///
/// Implementations must not hold internal borrows while invoking a callback,
/// since the `get` callback dispatches into the store, which may call `put`.
pub trait Storage {
    /// Read the value stored under `key`. `Ok(None)` means nothing is stored.
    fn get(&self, key: &str, done: GetCallback);

    /// Overwrite the value stored under `key`.
    fn put(&self, key: &str, value: Value, done: PutCallback);
}

impl<T: Storage + ?Sized> Storage for Rc<T> {
    fn get(&self, key: &str, done: GetCallback) {
        (**self).get(key, done)
    }

    fn put(&self, key: &str, value: Value, done: PutCallback) {
        (**self).put(key, value, done)
    }
}

impl<T: Storage + ?Sized> Storage for Box<T> {
    fn get(&self, key: &str, done: GetCallback) {
        (**self).get(key, done)
    }

    fn put(&self, key: &str, value: Value, done: PutCallback) {
        (**self).put(key, value, done)
    }
}

/// A synchronous string key-value medium, in the shape of a browser's
/// `localStorage`.
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Adapts a [`KeyValueStore`] to the [`Storage`] contract.
///
/// Values are written as JSON text and parsed on read. Callbacks run before
/// the call returns.
///
/// # Examples
///
/// ```
/// use persiststate::{MemoryStore, Storage, adapter};
/// use serde_json::json;
///
/// let items = MemoryStore::new();
/// let storage = adapter(items.clone());
///
/// storage.put("prefs", json!({"theme": "dark"}), Box::new(|r| assert!(r.is_ok())));
/// assert_eq!(items.raw("prefs").as_deref(), Some(r#"{"theme":"dark"}"#));
///
/// storage.get("prefs", Box::new(|r| {
///     assert_eq!(r.unwrap(), Some(json!({"theme": "dark"})));
/// }));
/// ```
#[derive(Debug, Clone)]
pub struct JsonAdapter<K> {
    store: K,
}

impl<K> JsonAdapter<K> {
    pub fn new(store: K) -> Self {
        JsonAdapter { store }
    }

    /// The wrapped key-value medium.
    pub fn inner(&self) -> &K {
        &self.store
    }
}

impl<K: KeyValueStore> JsonAdapter<K> {
    fn read(&self, key: &str) -> Result<Option<Value>, StorageError> {
        match self.store.get_item(key)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let text = serde_json::to_string(value)?;
        self.store.set_item(key, &text)
    }
}

impl<K: KeyValueStore> Storage for JsonAdapter<K> {
    fn get(&self, key: &str, done: GetCallback) {
        let result = self.read(key);
        done(result)
    }

    fn put(&self, key: &str, value: Value, done: PutCallback) {
        let result = self.write(key, &value);
        done(result)
    }
}

/// Wrap a key-value medium in the [`Storage`] contract.
pub fn adapter<K: KeyValueStore>(store: K) -> JsonAdapter<K> {
    JsonAdapter::new(store)
}

/// In-process [`KeyValueStore`]. Clones share the same items.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw text stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}
