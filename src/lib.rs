mod action;
mod buffer;
mod enhancer;
pub mod file;
mod merge;
mod middleware;
mod reducer;
pub mod storage;
mod store;

pub use action::{Action, ActionKind, Bypass, INIT, Meta, Rehydrate};
pub use buffer::ActionBuffer;
pub use enhancer::{
    DEFAULT_KEY, PersistState, PersistedStore, StorageArg, default_storage, default_storage_in,
    persist_state,
};
pub use file::FileStore;
pub use merge::{Merge, ShallowMerge, merge_state};
pub use middleware::PersistMiddleware;
pub use reducer::{
    BoxReducer, HandlesRehydration, MergePersisted, Reducer, handles_rehydration,
    merge_persisted_state,
};
pub use storage::{
    GetCallback, JsonAdapter, KeyValueStore, MemoryStore, PutCallback, Storage, StorageError,
    adapter,
};
pub use store::{StateContainer, Store, Subscription, create_store};
