//! Identity types for persisted entities.
//!
//! All identifiers are small copyable values that are:
//! - Unique within their namespace
//! - Immutable once assigned
//! - Opaque to external users
//!
//! A node's position in paged storage can shift while its document is being
//! restructured, so nodes are always addressed through these stable ids and
//! resolved via the owning document's arena index, never by raw reference.

use std::fmt;

/// Unique identifier for a persisted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl DocumentId {
    /// Create a new DocumentId from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// Unique identifier for a node within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new NodeId from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Unique identifier for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxnId(pub u64);

impl TxnId {
    /// Create a new TxnId from a raw value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx{}", self.0)
    }
}

/// Handle to a node physically persisted in a document.
///
/// Valid as an address only while the owning document is write-locked;
/// structural edits elsewhere in the document may relocate the node's
/// storage but never change its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoredNode {
    pub doc: DocumentId,
    pub node: NodeId,
}

impl StoredNode {
    pub fn new(doc: DocumentId, node: NodeId) -> Self {
        Self { doc, node }
    }
}

impl fmt::Display for StoredNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.doc, self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display() {
        assert_eq!(DocumentId::new(3).to_string(), "d3");
        assert_eq!(NodeId::new(7).to_string(), "n7");
        assert_eq!(TxnId::new(1).to_string(), "tx1");
        assert_eq!(
            StoredNode::new(DocumentId::new(3), NodeId::new(7)).to_string(),
            "d3/n7"
        );
    }

    #[test]
    fn test_document_id_ordering() {
        // Lock acquisition sorts by DocumentId; the order must be total.
        let mut ids = vec![DocumentId::new(5), DocumentId::new(1), DocumentId::new(3)];
        ids.sort();
        assert_eq!(ids, vec![DocumentId::new(1), DocumentId::new(3), DocumentId::new(5)]);
    }
}
