//! Core error types.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid NCName: {name}")]
    InvalidNcName { name: String },

    #[error("invalid QName: {name}")]
    InvalidQName { name: String },

    #[error("no namespace binding for prefix: {prefix}")]
    UnboundPrefix { prefix: String },
}

impl CoreError {
    pub fn invalid_ncname(name: impl Into<String>) -> Self {
        Self::InvalidNcName { name: name.into() }
    }

    pub fn invalid_qname(name: impl Into<String>) -> Self {
        Self::InvalidQName { name: name.into() }
    }

    pub fn unbound_prefix(prefix: impl Into<String>) -> Self {
        Self::UnboundPrefix {
            prefix: prefix.into(),
        }
    }
}
