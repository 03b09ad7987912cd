//! Trigger trait, per-operation registry, and collection wiring.
//!
//! A registry instance lives for exactly one mutation operation: the
//! lock-and-prepare phase fills it, the finish phase drains it. Keeping it
//! a per-invocation value prevents hooks from one statement bleeding into
//! the next.

use crate::error::TriggerResult;
use std::collections::HashMap;
use std::sync::Arc;
use xylem_core::DocumentId;
use xylem_dom::DocumentImpl;
use xylem_txn::Txn;

/// Before/after hook around one document's update.
///
/// Hooks run synchronously on the mutating thread, inside the operation's
/// transaction, while the document's write lock is held.
pub trait DocumentTrigger {
    /// Called once before any structural change to the document. Returning
    /// an error vetoes the whole operation.
    fn before_update(&mut self, txn: &mut Txn<'_>, doc: &mut DocumentImpl) -> TriggerResult<()>;

    /// Called once after all targets have been processed.
    fn after_update(&mut self, txn: &mut Txn<'_>, doc: &mut DocumentImpl) -> TriggerResult<()>;
}

/// Creates the trigger instance for a document, if one is configured.
pub trait TriggerFactory: Send + Sync {
    fn create(&self, doc: &DocumentImpl) -> Option<Box<dyn DocumentTrigger>>;
}

/// Collection-name → trigger-factory configuration.
#[derive(Default, Clone)]
pub struct TriggerConfig {
    by_collection: HashMap<String, Arc<dyn TriggerFactory>>,
}

impl TriggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, collection: impl Into<String>, factory: Arc<dyn TriggerFactory>) {
        self.by_collection.insert(collection.into(), factory);
    }

    /// Instantiate the trigger for a document, if its collection has one.
    pub fn create_for(&self, doc: &DocumentImpl) -> Option<Box<dyn DocumentTrigger>> {
        self.by_collection
            .get(doc.collection())
            .and_then(|factory| factory.create(doc))
    }
}

/// The triggers prepared for one operation, keyed by document id.
#[derive(Default)]
pub struct TriggerRegistry {
    triggers: HashMap<DocumentId, Box<dyn DocumentTrigger>>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, doc: DocumentId, trigger: Box<dyn DocumentTrigger>) {
        self.triggers.insert(doc, trigger);
    }

    pub fn get_mut(&mut self, doc: DocumentId) -> Option<&mut Box<dyn DocumentTrigger>> {
        self.triggers.get_mut(&doc)
    }

    pub fn contains(&self, doc: DocumentId) -> bool {
        self.triggers.contains_key(&doc)
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Drop all prepared triggers. Called when an operation finishes.
    pub fn clear(&mut self) {
        self.triggers.clear();
    }
}
