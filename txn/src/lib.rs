//! Xylem Txn
//!
//! Transaction handles for the mutation engine.
//!
//! Responsibilities:
//! - Issue fresh transactions, or continuations of an ambient batch
//! - Record txn lifecycle and persisted documents in the journal
//! - Abort on drop when a fresh transaction was never committed

mod error;
mod journal;
mod manager;

pub use error::{TxnError, TxnResult};
pub use journal::{Journal, JournalEntry, TxnRecord};
pub use manager::{Txn, TxnKind, TxnManager, TxnState};
