use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::SqliteStore;
use crate::store::{SessionStore, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT blob FROM session_blobs WHERE key = ?1")
            .bind(key)
            .fetch_optional(self.pool())
            .await
            .map_err(conn)?;
        row.map(|row| row.try_get::<String, _>("blob").map_err(ser))
            .transpose()
    }

    async fn set(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO session_blobs (key, blob, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    blob = excluded.blob,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(blob)
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn clear(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM session_blobs WHERE key = ?1")
            .bind(key)
            .execute(self.pool())
            .await
            .map_err(conn)?;
        Ok(())
    }
}
