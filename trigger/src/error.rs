//! Trigger error types.

use thiserror::Error;

/// Result type for trigger hooks.
pub type TriggerResult<T> = Result<T, TriggerError>;

/// Errors raised by trigger hooks.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// The trigger refuses the update.
    #[error("update vetoed by trigger: {reason}")]
    Veto { reason: String },

    /// The trigger itself failed.
    #[error("trigger failed: {message}")]
    Failure { message: String },
}

impl TriggerError {
    pub fn veto(reason: impl Into<String>) -> Self {
        Self::Veto {
            reason: reason.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }
}
