#![allow(dead_code)]

use persiststate::{Action, GetCallback, PutCallback, Storage, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Storage whose `get` completes only when the test says so, standing in
/// for an event loop. `put` completes immediately and is recorded.
#[derive(Default)]
pub struct DeferredStorage {
    values: RefCell<HashMap<String, Value>>,
    pending_gets: RefCell<Vec<(String, GetCallback)>>,
    pub puts: RefCell<Vec<(String, Value)>>,
    pub gets: RefCell<Vec<String>>,
}

impl DeferredStorage {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with_value(key: &str, value: Value) -> Rc<Self> {
        let storage = Self::default();
        storage.values.borrow_mut().insert(key.to_string(), value);
        Rc::new(storage)
    }

    /// Complete every pending `get` with the stored value.
    pub fn complete_gets(&self) {
        let pending = std::mem::take(&mut *self.pending_gets.borrow_mut());
        for (key, done) in pending {
            let value = self.values.borrow().get(&key).cloned();
            done(Ok(value));
        }
    }

    /// Complete every pending `get` with an error.
    pub fn fail_gets(&self) {
        let pending = std::mem::take(&mut *self.pending_gets.borrow_mut());
        for (_, done) in pending {
            done(Err(StorageError::Adapter("backend unavailable".into())));
        }
    }

    pub fn pending_gets(&self) -> usize {
        self.pending_gets.borrow().len()
    }

    pub fn put_count(&self) -> usize {
        self.puts.borrow().len()
    }

    pub fn last_put(&self) -> Option<(String, Value)> {
        self.puts.borrow().last().cloned()
    }
}

impl Storage for DeferredStorage {
    fn get(&self, key: &str, done: GetCallback) {
        self.gets.borrow_mut().push(key.to_string());
        self.pending_gets.borrow_mut().push((key.to_string(), done));
    }

    fn put(&self, key: &str, value: Value, done: PutCallback) {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        self.puts.borrow_mut().push((key.to_string(), value));
        done(Ok(()));
    }
}

/// Storage that fails every operation immediately.
#[derive(Default)]
pub struct FailingStorage {
    pub put_attempts: Cell<usize>,
}

impl Storage for FailingStorage {
    fn get(&self, _key: &str, done: GetCallback) {
        done(Err(StorageError::Adapter("read refused".into())));
    }

    fn put(&self, _key: &str, _value: Value, done: PutCallback) {
        self.put_attempts.set(self.put_attempts.get() + 1);
        done(Err(StorageError::Adapter("write refused".into())));
    }
}

/// Reducer over a JSON object: `("set", key, value)` style actions.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Set(String, Value),
    Remove(String),
}

pub fn object_reducer(mut state: Value, action: &Action<Op, Value>) -> Value {
    if let (Action::App(op), Some(map)) = (action, state.as_object_mut()) {
        match op {
            Op::Set(key, value) => {
                map.insert(key.clone(), value.clone());
            }
            Op::Remove(key) => {
                map.remove(key);
            }
        }
    }
    state
}

/// Counter that records every action it sees, in order.
pub fn log_reducer(mut state: Vec<String>, action: &Action<String, Vec<String>>) -> Vec<String> {
    match action {
        Action::App(name) => state.push(name.clone()),
        Action::Rehydrate(_) => state.push("@@rehydrate".to_string()),
    }
    state
}

#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TodoState {
    pub items: Vec<TodoItem>,
    pub next_id: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: u64,
    pub text: String,
    pub done: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TodoAction {
    Add(String),
    Complete(u64),
}

pub fn todo_reducer(mut state: TodoState, action: &Action<TodoAction, TodoState>) -> TodoState {
    match action {
        Action::App(TodoAction::Add(text)) => {
            state.items.push(TodoItem {
                id: state.next_id,
                text: text.clone(),
                done: false,
            });
            state.next_id += 1;
        }
        Action::App(TodoAction::Complete(id)) => {
            if let Some(item) = state.items.iter_mut().find(|i| i.id == *id) {
                item.done = true;
            }
        }
        Action::Rehydrate(_) => {}
    }
    state
}
