//! Mutation error taxonomy.

use thiserror::Error;
use xylem_dom::DomError;
use xylem_lock::LockError;
use xylem_trigger::TriggerError;
use xylem_txn::TxnError;

/// Result type for mutation operations.
pub type UpdateResult<T> = Result<T, UpdateError>;

/// Errors that can occur during a mutation operation.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The select sequence contains non-node items.
    #[error("target selection is not a node sequence: found {found}")]
    TypeMismatch { found: String },

    /// The value expression evaluated to the empty sequence.
    #[error("content expression is empty")]
    EmptyContent,

    /// The subject may not write the document.
    #[error("user {user} is not allowed to write document {doc}")]
    PermissionDenied { user: String, doc: String },

    /// A document write lock could not be acquired.
    #[error("lock failure: {0}")]
    LockFailure(#[from] LockError),

    /// A before-update trigger refused or failed.
    #[error("update vetoed by trigger: {reason}")]
    TriggerVeto { reason: String },

    /// The target node kind cannot be mutated.
    #[error("cannot modify {kind} node")]
    UnsupportedNodeKind { kind: String },

    /// Inserted content would rebind an in-scope namespace prefix.
    #[error("err:XUDY0023: prefix {prefix} is bound to {bound} in scope, content binds it to {attempted}")]
    NamespaceConflict {
        prefix: String,
        bound: String,
        attempted: String,
    },

    /// The target has no usable parent for this operation.
    #[error("invalid target: {message}")]
    InvalidTarget { message: String },

    /// A rename value could not be parsed as a QName.
    #[error("cannot resolve QName {name}: {cause}")]
    QNameResolution { name: String, cause: String },

    /// Storage-layer failure.
    #[error("storage error: {0}")]
    Storage(#[from] DomError),

    /// Transaction-layer failure.
    #[error("transaction error: {0}")]
    Txn(#[from] TxnError),
}

impl UpdateError {
    pub fn type_mismatch(found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            found: found.into(),
        }
    }

    pub fn permission_denied(user: impl Into<String>, doc: impl Into<String>) -> Self {
        Self::PermissionDenied {
            user: user.into(),
            doc: doc.into(),
        }
    }

    pub fn unsupported_node_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedNodeKind { kind: kind.into() }
    }

    pub fn namespace_conflict(
        prefix: impl Into<String>,
        bound: impl Into<String>,
        attempted: impl Into<String>,
    ) -> Self {
        Self::NamespaceConflict {
            prefix: prefix.into(),
            bound: bound.into(),
            attempted: attempted.into(),
        }
    }

    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            message: message.into(),
        }
    }

    pub fn qname_resolution(name: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::QNameResolution {
            name: name.into(),
            cause: cause.to_string(),
        }
    }
}

impl From<TriggerError> for UpdateError {
    fn from(e: TriggerError) -> Self {
        Self::TriggerVeto {
            reason: e.to_string(),
        }
    }
}
