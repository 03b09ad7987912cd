//! The document store.
//!
//! Owns every persisted document, hands out access by id, accounts for
//! persisted revisions, and broadcasts update notifications to registered
//! listeners. Single-writer model: structural mutation goes through
//! `&mut self`, with cross-statement coordination handled by the lock
//! manager one layer up.

use crate::document::DocumentImpl;
use crate::error::{DomError, DomResult};
use crate::node::TransientNode;
use std::collections::HashMap;
use xylem_core::{DocumentId, NodeId, Permissions, Subject};

/// The kind of change a listener is told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    Insert,
    Remove,
    Replace,
    Rename,
}

/// Observer of persisted document changes.
pub trait UpdateListener {
    fn document_updated(&self, doc: DocumentId, event: UpdateEvent);
}

/// Broadcasts document changes to registered listeners.
#[derive(Default)]
pub struct NotificationService {
    listeners: Vec<Box<dyn UpdateListener>>,
}

impl NotificationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Box<dyn UpdateListener>) {
        self.listeners.push(listener);
    }

    pub fn notify(&self, doc: DocumentId, event: UpdateEvent) {
        for listener in &self.listeners {
            listener.document_updated(doc, event);
        }
    }
}

/// All persisted documents, by id.
#[derive(Default)]
pub struct DocumentStore {
    documents: HashMap<DocumentId, DocumentImpl>,
    next_doc_id: u64,
    notifier: NotificationService,
    /// Page-split threshold above which a document is defragmented.
    /// Disabled by default.
    defrag_threshold: Option<u32>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            next_doc_id: 1,
            notifier: NotificationService::new(),
            defrag_threshold: None,
        }
    }

    // ==================== Configuration ====================

    pub fn defrag_threshold(&self) -> Option<u32> {
        self.defrag_threshold
    }

    pub fn set_defrag_threshold(&mut self, threshold: Option<u32>) {
        self.defrag_threshold = threshold;
    }

    pub fn subscribe(&mut self, listener: Box<dyn UpdateListener>) {
        self.notifier.subscribe(listener);
    }

    // ==================== Document Lifecycle ====================

    /// Create an empty document owned by the given subject.
    pub fn create_document(
        &mut self,
        uri: impl Into<String>,
        collection: impl Into<String>,
        owner: &Subject,
    ) -> DocumentId {
        let id = DocumentId::new(self.next_doc_id);
        self.next_doc_id += 1;
        let doc = DocumentImpl::new(
            id,
            uri,
            collection,
            Permissions::default_for(owner.name()),
        );
        self.documents.insert(id, doc);
        id
    }

    /// Create a document and install its document element in one step.
    pub fn create_with_root(
        &mut self,
        uri: impl Into<String>,
        collection: impl Into<String>,
        owner: &Subject,
        root: TransientNode,
    ) -> DomResult<(DocumentId, NodeId)> {
        let id = self.create_document(uri, collection, owner);
        let root_id = self.doc_mut(id)?.set_document_element(root)?;
        Ok((id, root_id))
    }

    /// Resolve a document.
    pub fn doc(&self, id: DocumentId) -> DomResult<&DocumentImpl> {
        self.documents.get(&id).ok_or(DomError::DocumentNotFound(id))
    }

    /// Resolve a document for mutation. Caller must hold its write lock.
    pub fn doc_mut(&mut self, id: DocumentId) -> DomResult<&mut DocumentImpl> {
        self.documents
            .get_mut(&id)
            .ok_or(DomError::DocumentNotFound(id))
    }

    /// All document ids, ascending.
    pub fn document_ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<_> = self.documents.keys().copied().collect();
        ids.sort();
        ids
    }

    // ==================== Persistence ====================

    /// Re-persist a document after mutation, bumping its revision.
    pub fn persist(&mut self, id: DocumentId) -> DomResult<u64> {
        let doc = self.doc_mut(id)?;
        let revision = doc.bump_revision();
        tracing::debug!(doc = %id, revision, "persisted document");
        Ok(revision)
    }

    /// Broadcast a change notification for a document.
    pub fn notify(&self, id: DocumentId, event: UpdateEvent) {
        self.notifier.notify(id, event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use xylem_core::QName;

    struct Counter(Arc<AtomicUsize>);

    impl UpdateListener for Counter {
        fn document_updated(&self, _doc: DocumentId, _event: UpdateEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_create_and_resolve() {
        // GIVEN
        let mut store = DocumentStore::new();
        let admin = Subject::dba("admin");

        // WHEN
        let (id, root) = store
            .create_with_root(
                "/db/a.xml",
                "/db",
                &admin,
                TransientNode::element(QName::local("a").unwrap()),
            )
            .unwrap();

        // THEN
        let doc = store.doc(id).unwrap();
        assert_eq!(doc.document_element(), Some(root));
        assert_eq!(doc.uri(), "/db/a.xml");
    }

    #[test]
    fn test_persist_bumps_revision() {
        // GIVEN
        let mut store = DocumentStore::new();
        let admin = Subject::dba("admin");
        let id = store.create_document("/db/a.xml", "/db", &admin);

        // WHEN / THEN
        assert_eq!(store.persist(id).unwrap(), 1);
        assert_eq!(store.persist(id).unwrap(), 2);
    }

    #[test]
    fn test_notification_reaches_listeners() {
        // GIVEN
        let mut store = DocumentStore::new();
        let admin = Subject::dba("admin");
        let id = store.create_document("/db/a.xml", "/db", &admin);
        let count = Arc::new(AtomicUsize::new(0));
        store.subscribe(Box::new(Counter(count.clone())));

        // WHEN
        store.notify(id, UpdateEvent::Insert);
        store.notify(id, UpdateEvent::Remove);

        // THEN
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_document_fails() {
        let store = DocumentStore::new();
        assert!(matches!(
            store.doc(DocumentId::new(99)).unwrap_err(),
            DomError::DocumentNotFound(_)
        ));
    }
}
