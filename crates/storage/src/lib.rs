#![forbid(unsafe_code)]

//! Persistence adapters for the quiz.
//!
//! The domain saves itself as an opaque blob under a versioned key, so this
//! crate only has to speak key/value: an in-memory store for tests and
//! ephemeral runs, and a SQLite store for real ones.

pub mod sqlite;
pub mod store;

pub use sqlite::{SqliteInitError, SqliteStore};
pub use store::{InMemoryStore, SessionStore, Storage, StorageError};
