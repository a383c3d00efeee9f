//! Todo list whose state survives restarts: the "hello world" of persiststate.

use persiststate::{Action, FileStore, PersistState, adapter};
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Serialize, Deserialize)]
struct TodoState {
    items: Vec<TodoItem>,
    next_id: u64,
}

#[derive(Clone, Serialize, Deserialize)]
struct TodoItem {
    id: u64,
    text: String,
    done: bool,
}

enum TodoAction {
    Add(&'static str),
    Complete(u64),
}

fn todo_reducer(mut state: TodoState, action: &Action<TodoAction, TodoState>) -> TodoState {
    match action {
        Action::App(TodoAction::Add(text)) => {
            state.items.push(TodoItem {
                id: state.next_id,
                text: text.to_string(),
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

fn print_todos(state: &TodoState) {
    for item in &state.items {
        let check = if item.done { "x" } else { " " };
        println!("  [{}] {}", check, item.text);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;

    {
        let store = PersistState::new()
            .storage(adapter(FileStore::new(dir.path())))
            .key("todos")
            .create(todo_reducer, TodoState::default());

        store.dispatch(TodoAction::Add("buy milk"));
        println!("Added: buy milk");
        store.dispatch(TodoAction::Add("write docs"));
        println!("Added: write docs");
        store.dispatch(TodoAction::Complete(0));
        println!("Completed: buy milk");
    }

    // A new store over the same directory starts from the persisted state.
    let store = PersistState::new()
        .storage(adapter(FileStore::new(dir.path())))
        .key("todos")
        .create(todo_reducer, TodoState::default());

    println!("\nTodos after restart:");
    store.with_state(print_todos);

    Ok(())
}
