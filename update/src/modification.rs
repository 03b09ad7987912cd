//! Shared base of all mutation operations.
//!
//! A `Modification` lives for exactly one operation invocation. It owns the
//! per-invocation trigger registry and the modified-document set, and holds
//! the statement's write locks from `select_and_lock` until the cleanup
//! path drops them. Lock release happens on every exit path: explicitly via
//! `unlock_documents`, and implicitly on drop.
//!
//! Phase order for one statement:
//! select & validate -> locks acquired -> before-triggers fired ->
//! per-target mutation -> after-triggers -> commit. Any error aborts the
//! remaining targets and flows through lock release before propagating.

use crate::context::QueryContext;
use crate::error::{UpdateError, UpdateResult};
use std::time::{SystemTime, UNIX_EPOCH};
use xylem_core::{DocumentId, NodeId, StoredNode};
use xylem_dom::{DocumentImpl, DocumentStore, Item, Sequence, UpdateEvent};
use xylem_lock::{DocLockSet, LockManager, DEFAULT_LOCK_TIMEOUT};
use xylem_txn::{Txn, TxnManager};

/// Shared machinery for one mutation operation.
pub struct Modification<'a> {
    pub(crate) ctx: &'a mut QueryContext,
    pub(crate) store: &'a mut DocumentStore,
    locks: &'a LockManager,
    lock_set: Option<DocLockSet>,
    triggers: xylem_trigger::TriggerRegistry,
    /// Documents mutated so far, in first-touch order, deduplicated.
    modified: Vec<DocumentId>,
}

impl<'a> Modification<'a> {
    pub fn new(
        ctx: &'a mut QueryContext,
        store: &'a mut DocumentStore,
        locks: &'a LockManager,
    ) -> Self {
        Self {
            ctx,
            store,
            locks,
            lock_set: None,
            triggers: xylem_trigger::TriggerRegistry::new(),
            modified: Vec::new(),
        }
    }

    /// Validate the selection, lock every document it spans, and fire each
    /// target document's before-update trigger.
    ///
    /// The global update lock is held only while the document set is
    /// computed and the per-document locks are acquired; it is released
    /// before the (potentially long) mutation phase so statements on
    /// disjoint document sets do not serialize against each other.
    pub fn select_and_lock(
        &mut self,
        txn: &mut Txn<'_>,
        selection: &Sequence,
    ) -> UpdateResult<Vec<StoredNode>> {
        let mut targets = Vec::with_capacity(selection.len());
        let mut docs = Vec::new();

        let lock_set = {
            let _phase = self.locks.begin_acquisition();
            for item in selection.iter() {
                match item {
                    Item::Atomic(value) => {
                        return Err(UpdateError::type_mismatch(value.string_value()));
                    }
                    Item::Transient(node) => {
                        return Err(UpdateError::unsupported_node_kind(format!(
                            "in-memory {}",
                            match node {
                                xylem_dom::TransientNode::Element { .. } => "element",
                                _ => "node",
                            }
                        )));
                    }
                    Item::Stored(handle) => {
                        let doc = self.store.doc(handle.doc)?;
                        if doc.kind(handle.node)?.is_document() {
                            return Err(UpdateError::unsupported_node_kind("document"));
                        }
                        docs.push(handle.doc);
                        targets.push(*handle);
                    }
                }
            }
            self.locks.lock_set(&docs, DEFAULT_LOCK_TIMEOUT)?
            // _phase drops here: the acquisition phase is over
        };
        tracing::debug!(docs = lock_set.len(), "write locks acquired");

        let locked: Vec<DocumentId> = lock_set.docs().collect();
        self.lock_set = Some(lock_set);
        for doc_id in locked {
            self.prepare_trigger(txn, doc_id)?;
        }
        Ok(targets)
    }

    fn prepare_trigger(&mut self, txn: &mut Txn<'_>, doc_id: DocumentId) -> UpdateResult<()> {
        if self.triggers.contains(doc_id) {
            return Ok(());
        }
        if let Some(mut trigger) = self.ctx.triggers().create_for(self.store.doc(doc_id)?) {
            trigger.before_update(txn, self.store.doc_mut(doc_id)?)?;
            self.triggers.insert(doc_id, trigger);
        }
        Ok(())
    }

    /// Produce an independent transient copy of content intended for
    /// insertion. Persisted sources are serialized into fresh trees,
    /// transient sources are cloned, document items normalize to their
    /// root element, atomics pass through.
    pub fn deep_copy(&self, content: &Sequence) -> UpdateResult<Sequence> {
        content
            .iter()
            .map(|item| {
                Ok(match item {
                    Item::Atomic(value) => Item::Atomic(value.clone()),
                    Item::Transient(node) => Item::Transient(node.clone()),
                    Item::Stored(handle) => {
                        let doc = self.store.doc(handle.doc)?;
                        Item::Transient(doc.serialize_node(handle.node)?)
                    }
                })
            })
            .collect::<UpdateResult<Vec<Item>>>()
            .map(Sequence::from)
    }

    /// Touch, persist, and notify for one mutated document, and remember
    /// it for the after-trigger pass.
    pub(crate) fn persist_and_notify(
        &mut self,
        txn: &mut Txn<'_>,
        doc_id: DocumentId,
        event: UpdateEvent,
    ) -> UpdateResult<()> {
        self.store.doc_mut(doc_id)?.touch(current_millis());
        if !self.modified.contains(&doc_id) {
            self.modified.push(doc_id);
        }
        self.store.persist(doc_id)?;
        txn.record_persist(doc_id)?;
        self.store.notify(doc_id, event);
        Ok(())
    }

    /// Fire each modified document's after-update hook once, then clear
    /// the modified set and the trigger registry.
    pub fn finish_triggers(&mut self, txn: &mut Txn<'_>) -> UpdateResult<()> {
        let docs: Vec<DocumentId> = self.modified.drain(..).collect();
        for doc_id in docs {
            if let Some(trigger) = self.triggers.get_mut(doc_id) {
                trigger.after_update(txn, self.store.doc_mut(doc_id)?)?;
            }
        }
        self.triggers.clear();
        Ok(())
    }

    /// Release all write locks held by this operation. Idempotent; also
    /// runs on drop.
    pub fn unlock_documents(&mut self) {
        self.lock_set = None;
    }

    /// Parent used as the mutation anchor: attribute nodes resolve to
    /// their owner element, other nodes to their DOM parent. The document
    /// element resolves to `None` (its DOM parent is the document node),
    /// which callers use to detect attempted mutation of the root.
    pub fn get_parent(doc: &DocumentImpl, node: Option<NodeId>) -> Option<NodeId> {
        let node = node?;
        let record = doc.node(node).ok()?;
        if record.kind.is_attribute() {
            return record.parent;
        }
        let parent = record.parent?;
        match doc.kind(parent).ok()? {
            kind if kind.is_document() => None,
            _ => Some(parent),
        }
    }

    /// Defragment documents whose page-split count exceeds the threshold.
    ///
    /// Maintenance utility, off the mutation hot path: each affected
    /// document is briefly write-locked and compacted within its own
    /// transaction, then consistency-checked.
    pub fn check_fragmentation(
        store: &mut DocumentStore,
        txns: &TxnManager,
        locks: &LockManager,
        docs: &[DocumentId],
        split_threshold: Option<u32>,
    ) -> UpdateResult<()> {
        let Some(threshold) = split_threshold.or(store.defrag_threshold()) else {
            return Ok(());
        };
        for &doc_id in docs {
            if store.doc(doc_id)?.page_splits() <= threshold {
                continue;
            }
            let _guard = locks.write_lock(doc_id, DEFAULT_LOCK_TIMEOUT)?;
            let mut txn = txns.begin();
            tracing::debug!(doc = %doc_id, "defragmenting document");
            store.doc_mut(doc_id)?.defragment();
            store.doc(doc_id)?.consistency_check()?;
            store.persist(doc_id)?;
            txn.record_persist(doc_id)?;
            txn.commit()?;
        }
        Ok(())
    }
}

impl Drop for Modification<'_> {
    fn drop(&mut self) {
        // Locks must never outlive the operation, whatever the exit path.
        self.unlock_documents();
    }
}

pub(crate) fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
