//! Insert content before, after, or into persisted nodes.

use crate::context::QueryContext;
use crate::error::{UpdateError, UpdateResult};
use crate::modification::Modification;
use crate::validation;
use xylem_core::NodeId;
use xylem_dom::{DocumentStore, Sequence, UpdateEvent};
use xylem_lock::LockManager;
use xylem_txn::{Txn, TxnManager};

/// Where inserted content lands relative to each selected node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// As preceding siblings of the target.
    Before,
    /// As following siblings of the target.
    After,
    /// As the last children of the target element.
    Append,
}

/// Insert a deep copy of `content` at each node of `select`.
///
/// Empty content is an error regardless of the selection; an empty
/// selection is soft-trapped and the call is a no-op.
pub fn insert(
    ctx: &mut QueryContext,
    store: &mut DocumentStore,
    locks: &LockManager,
    txns: &TxnManager,
    select: &Sequence,
    content: &Sequence,
    mode: InsertMode,
) -> UpdateResult<Sequence> {
    if content.is_empty() {
        return Err(UpdateError::EmptyContent);
    }
    if !validation::check_node_selection(ctx, select)? {
        return Ok(Sequence::empty());
    }

    let batch = ctx.batch();
    let mut txn = txns.begin_or_join(batch);
    let mut m = Modification::new(ctx, store, locks);
    let result = apply(&mut m, &mut txn, select, content, mode);
    m.unlock_documents();
    drop(m);
    result?;
    txn.commit()?;
    Ok(Sequence::empty())
}

fn apply(
    m: &mut Modification<'_>,
    txn: &mut Txn<'_>,
    select: &Sequence,
    content: &Sequence,
    mode: InsertMode,
) -> UpdateResult<()> {
    let targets = m.select_and_lock(txn, select)?;
    let copied = m.deep_copy(content)?;
    let transient = validation::to_transient_content(&copied);

    for target in targets {
        super::check_write(m, target.doc)?;
        let doc = m.store.doc(target.doc)?;
        let point = insertion_point(m, target.doc, target.node, mode)?;

        let scope = doc.in_scope_namespaces(point)?;
        for node in &transient {
            validation::check_ns_conflicts(node, &scope)?;
        }

        let doc = m.store.doc_mut(target.doc)?;
        match mode {
            InsertMode::Before => doc.insert_before(target.node, &transient)?,
            InsertMode::After => doc.insert_after(target.node, &transient)?,
            InsertMode::Append => doc.append_children(target.node, &transient)?,
        };
        m.persist_and_notify(txn, target.doc, UpdateEvent::Insert)?;
    }
    m.finish_triggers(txn)
}

/// The node whose namespace scope governs the insertion: the target
/// itself for append, the target's parent element for the sibling modes.
fn insertion_point(
    m: &Modification<'_>,
    doc_id: xylem_core::DocumentId,
    node: NodeId,
    mode: InsertMode,
) -> UpdateResult<NodeId> {
    let doc = m.store.doc(doc_id)?;
    match mode {
        InsertMode::Append => {
            if !doc.kind(node)?.is_element() {
                return Err(UpdateError::invalid_target(
                    "insert-into target is not an element",
                ));
            }
            Ok(node)
        }
        InsertMode::Before | InsertMode::After => Modification::get_parent(doc, Some(node))
            .ok_or_else(|| {
                UpdateError::invalid_target("insertion point has no parent element")
            }),
    }
}
