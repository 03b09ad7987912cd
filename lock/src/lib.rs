//! Xylem Lock
//!
//! Document write locks for the mutation engine.
//!
//! Responsibilities:
//! - Per-document write locks held for the whole mutation of a statement
//! - The global update lock serializing only the lock-acquisition phase
//! - RAII guards releasing on every exit path

mod error;
mod manager;

pub use error::{LockError, LockResult};
pub use manager::{AcquisitionGuard, DocLockSet, LockManager, WriteGuard, DEFAULT_LOCK_TIMEOUT};
