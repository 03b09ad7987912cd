//! DOM error types.

use thiserror::Error;
use xylem_core::{DocumentId, NodeId};

/// Result type for DOM operations.
pub type DomResult<T> = Result<T, DomError>;

/// Errors raised by document storage and the structural primitives.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0} has no parent")]
    NoParent(NodeId),

    #[error("cannot place {content} content {position}")]
    InvalidPlacement { content: String, position: String },

    #[error("document already has a document element")]
    RootExists,

    #[error("consistency check failed: {message}")]
    Inconsistent { message: String },
}

impl DomError {
    pub fn invalid_placement(content: impl Into<String>, position: impl Into<String>) -> Self {
        Self::InvalidPlacement {
            content: content.into(),
            position: position.into(),
        }
    }

    pub fn inconsistent(message: impl Into<String>) -> Self {
        Self::Inconsistent {
            message: message.into(),
        }
    }
}
