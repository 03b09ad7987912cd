//! Transaction error types.

use thiserror::Error;
use xylem_core::TxnId;

/// Result type for transaction operations.
pub type TxnResult<T> = Result<T, TxnError>;

/// Transaction errors.
#[derive(Debug, Error)]
pub enum TxnError {
    /// The transaction is no longer active.
    #[error("transaction {txn} is not active")]
    NotActive { txn: TxnId },
}

impl TxnError {
    pub fn not_active(txn: TxnId) -> Self {
        Self::NotActive { txn }
    }
}
