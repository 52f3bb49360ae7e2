use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Key/value contract for session blobs.
///
/// A missing key is not an error: `get` answers `None` and `clear` succeeds,
/// so callers only see `Err` when the backend itself misbehaves.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `blob` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write does not reach the backend.
    async fn set(&self, key: &str, blob: &str) -> Result<(), StorageError>;

    /// Remove whatever is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn clear(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and `--memory` runs.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), blob.to_owned());
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .blobs
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// Aggregates the session store behind a trait object for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionStore>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemoryStore::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = InMemoryStore::new();
        store.set("quiz.session.v1", r#"{"score":1}"#).await.unwrap();
        let blob = store.get("quiz.session.v1").await.unwrap();
        assert_eq!(blob.as_deref(), Some(r#"{"score":1}"#));
    }

    #[tokio::test]
    async fn set_replaces_the_previous_blob() {
        let store = InMemoryStore::new();
        store.set("k", "first").await.unwrap();
        store.set("k", "second").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = InMemoryStore::new();
        store.set("k", "blob").await.unwrap();
        store.clear("k").await.unwrap();
        store.clear("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_do_not_interfere() {
        let store = InMemoryStore::new();
        store.set("a", "one").await.unwrap();
        store.set("b", "two").await.unwrap();
        store.clear("a").await.unwrap();
        assert_eq!(store.get("b").await.unwrap().as_deref(), Some("two"));
    }
}
