//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::snapshot::SnapshotError;
use storage::store::StorageError;

/// Errors emitted by `QuizFlow`.
///
/// Only the persistence boundary can fail; session operations themselves
/// report unexpected calls as ignored transitions, not errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
