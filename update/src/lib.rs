//! Xylem Update
//!
//! The transactional document-mutation engine: imperative structural
//! updates (insert, delete, value-replace, rename) against persisted XML
//! documents.
//!
//! Responsibilities:
//! - Validate evaluated select/value sequences and route empty selections
//!   onto the soft error-trap path
//! - Lock every touched document before any structural change
//! - Deep-copy content before insertion so storage never aliases sources
//! - Fire before/after document triggers exactly once per document
//! - Enforce write permissions and namespace consistency
//! - Persist, notify, and commit; release locks on every exit path
//!
//! # Module Structure
//!
//! - `executor` - `UpdateExecutor` facade coordinating the operations
//! - `modification` - shared base: selection, locking, deep copy, triggers
//! - `ops/` - individual operations (insert, delete, update, rename)
//! - `validation` - shared selection/content checks
//! - `context` - per-query state handed in by the evaluation layer
//! - `error` - error taxonomy

mod context;
mod error;
mod executor;
mod modification;
mod ops;
mod validation;

pub use context::{QueryContext, UPDATE_ERROR_VAR};
pub use error::{UpdateError, UpdateResult};
pub use executor::UpdateExecutor;
pub use modification::Modification;
pub use ops::InsertMode;
