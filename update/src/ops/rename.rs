//! Rename persisted elements and attributes.

use crate::context::QueryContext;
use crate::error::{UpdateError, UpdateResult};
use crate::modification::Modification;
use crate::validation;
use xylem_core::{QName, Value};
use xylem_dom::{DocumentStore, Item, NodeKind, Sequence, TransientNode, UpdateEvent};
use xylem_lock::LockManager;
use xylem_txn::{Txn, TxnManager};

/// Give each selected element or attribute a new name. Children,
/// attributes, and values are preserved.
///
/// The new name may be an atomic QName or any item whose string value is
/// a lexical QName; prefixes resolve against the query's statically known
/// namespaces.
pub fn rename(
    ctx: &mut QueryContext,
    store: &mut DocumentStore,
    locks: &LockManager,
    txns: &TxnManager,
    select: &Sequence,
    new_name: &Sequence,
) -> UpdateResult<Sequence> {
    if new_name.is_empty() {
        return Err(UpdateError::EmptyContent);
    }
    if !validation::check_node_selection(ctx, select)? {
        return Ok(Sequence::empty());
    }

    let batch = ctx.batch();
    let mut txn = txns.begin_or_join(batch);
    let mut m = Modification::new(ctx, store, locks);
    let result = apply(&mut m, &mut txn, select, new_name);
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
    new_name: &Sequence,
) -> UpdateResult<()> {
    let targets = m.select_and_lock(txn, select)?;
    let name = resolve_new_name(m, new_name)?;

    for target in targets {
        super::check_write(m, target.doc)?;
        let doc = m.store.doc(target.doc)?;

        // Renaming may not rebind an in-scope prefix to a different URI.
        if let (Some(prefix), Some(uri)) = (name.prefix(), name.ns_uri()) {
            let scope = doc.in_scope_namespaces(target.node)?;
            if let Some(bound) = scope.resolve(prefix) {
                if bound != uri {
                    return Err(UpdateError::namespace_conflict(prefix, bound, uri));
                }
            }
        }

        match doc.kind(target.node)? {
            NodeKind::Element { .. } => {
                let mut copy = doc.serialize_node(target.node)?;
                if let TransientNode::Element { name: n, .. } = &mut copy {
                    *n = name.clone();
                }
                m.store.doc_mut(target.doc)?.update_child(target.node, &copy)?;
            }
            NodeKind::Attribute { value, .. } => {
                let value = value.clone();
                m.store.doc_mut(target.doc)?.replace_attribute(
                    target.node,
                    name.clone(),
                    value,
                )?;
            }
            other => {
                return Err(UpdateError::unsupported_node_kind(other.name()));
            }
        }
        m.persist_and_notify(txn, target.doc, UpdateEvent::Rename)?;
    }
    m.finish_triggers(txn)
}

fn resolve_new_name(m: &Modification<'_>, new_name: &Sequence) -> UpdateResult<QName> {
    let Some(item) = new_name.first() else {
        return Err(UpdateError::EmptyContent);
    };
    if let Item::Atomic(Value::QName(q)) = item {
        return Ok(q.clone());
    }
    let lexical = item.string_value(m.store);
    QName::parse(&lexical, m.ctx.namespaces())
        .map_err(|cause| UpdateError::qname_resolution(lexical.as_str(), cause))
}
