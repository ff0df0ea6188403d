//! Storage module
//!
//! Key-value storage abstraction and the debounced collection persistence
//! built on top of it.

pub mod key_value;
pub mod persistence;

pub use key_value::{KeyValueStore, MemoryStore};
pub use persistence::PersistedCollection;
