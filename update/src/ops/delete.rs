//! Remove persisted nodes and their subtrees.

use crate::context::QueryContext;
use crate::error::{UpdateError, UpdateResult};
use crate::modification::Modification;
use crate::validation;
use xylem_dom::{DocumentStore, Sequence, UpdateEvent};
use xylem_lock::LockManager;
use xylem_txn::{Txn, TxnManager};

/// Remove each node of `select` from its document, subtree included.
/// The document element itself cannot be removed.
pub fn delete(
    ctx: &mut QueryContext,
    store: &mut DocumentStore,
    locks: &LockManager,
    txns: &TxnManager,
    select: &Sequence,
) -> UpdateResult<Sequence> {
    if !validation::check_node_selection(ctx, select)? {
        return Ok(Sequence::empty());
    }

    let batch = ctx.batch();
    let mut txn = txns.begin_or_join(batch);
    let mut m = Modification::new(ctx, store, locks);
    let result = apply(&mut m, &mut txn, select);
    m.unlock_documents();
    drop(m);
    result?;
    txn.commit()?;
    Ok(Sequence::empty())
}

fn apply(m: &mut Modification<'_>, txn: &mut Txn<'_>, select: &Sequence) -> UpdateResult<()> {
    let targets = m.select_and_lock(txn, select)?;
    for target in targets {
        super::check_write(m, target.doc)?;
        let doc = m.store.doc(target.doc)?;
        if Modification::get_parent(doc, Some(target.node)).is_none() {
            return Err(UpdateError::invalid_target(
                "cannot remove the document element",
            ));
        }
        m.store.doc_mut(target.doc)?.remove_child(target.node)?;
        m.persist_and_notify(txn, target.doc, UpdateEvent::Remove)?;
    }
    m.finish_triggers(txn)
}
