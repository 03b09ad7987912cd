//! Lock error types.

use std::time::Duration;
use thiserror::Error;
use xylem_core::DocumentId;

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;

/// Errors raised by the lock manager.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("timed out after {timeout:?} waiting for write lock on {doc}")]
    Timeout { doc: DocumentId, timeout: Duration },
}

impl LockError {
    pub fn timeout(doc: DocumentId, timeout: Duration) -> Self {
        Self::Timeout { doc, timeout }
    }
}
