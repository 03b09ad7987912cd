//! Replace the value of persisted nodes in place.

use crate::context::QueryContext;
use crate::error::{UpdateError, UpdateResult};
use crate::modification::Modification;
use crate::validation;
use xylem_dom::{DocumentStore, NodeKind, Sequence, TransientNode, UpdateEvent};
use xylem_lock::LockManager;
use xylem_txn::{Txn, TxnManager};

/// Replace each selected node's value with a deep copy of `content`.
///
/// For an element target the existing children are dropped and the
/// content nodes become the new children, each atomic item as its own
/// text node. Text and attribute targets take the content's string
/// value. Other node kinds are not updatable.
pub fn update_value(
    ctx: &mut QueryContext,
    store: &mut DocumentStore,
    locks: &LockManager,
    txns: &TxnManager,
    select: &Sequence,
    content: &Sequence,
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
    let result = apply(&mut m, &mut txn, select, content);
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
) -> UpdateResult<()> {
    let targets = m.select_and_lock(txn, select)?;
    let copied = m.deep_copy(content)?;
    // Copied content holds no stored handles, so this never reads the store.
    let text_value = copied.string_value(m.store);
    let transient = validation::to_transient_content(&copied);

    for target in targets {
        super::check_write(m, target.doc)?;
        let doc = m.store.doc(target.doc)?;
        match doc.kind(target.node)? {
            NodeKind::Element { .. } => {
                let scope = doc.in_scope_namespaces(target.node)?;
                for node in &transient {
                    validation::check_ns_conflicts(node, &scope)?;
                }
                let old: Vec<_> = doc.children_of(target.node)?.to_vec();
                let doc = m.store.doc_mut(target.doc)?;
                for child in old {
                    doc.remove_child(child)?;
                }
                doc.append_children(target.node, &transient)?;
            }
            NodeKind::Text { .. } => {
                m.store.doc_mut(target.doc)?.update_child(
                    target.node,
                    &TransientNode::text(text_value.clone()),
                )?;
            }
            NodeKind::Attribute { name, .. } => {
                let name = name.clone();
                m.store.doc_mut(target.doc)?.replace_attribute(
                    target.node,
                    name,
                    text_value.clone(),
                )?;
            }
            other => {
                return Err(UpdateError::unsupported_node_kind(other.name()));
            }
        }
        m.persist_and_notify(txn, target.doc, UpdateEvent::Replace)?;
    }
    m.finish_triggers(txn)
}
