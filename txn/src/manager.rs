//! Transaction manager and handles.
//!
//! An operation runs inside exactly one `Txn`. A `Fresh` transaction is
//! owned by the operation: it commits at the end and aborts if dropped
//! uncommitted. A `Joined` transaction continues an ambient batch; commit
//! and abort are deferred to the batch owner, so the operation's commit
//! call only releases the handle.

use crate::error::{TxnError, TxnResult};
use crate::journal::{Journal, TxnRecord};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use xylem_core::{DocumentId, TxnId};

/// Whether a transaction is operation-owned or a batch continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnKind {
    /// Owned by the current operation.
    Fresh,
    /// Continuation of an ambient batch transaction.
    Joined,
}

/// Lifecycle state of a transaction handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    Active,
    Committed,
    Aborted,
}

/// Issues transactions and owns the journal.
#[derive(Default)]
pub struct TxnManager {
    next_id: AtomicU64,
    journal: Mutex<Journal>,
}

impl TxnManager {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            journal: Mutex::new(Journal::new()),
        }
    }

    /// Begin a fresh transaction.
    pub fn begin(&self) -> Txn<'_> {
        let id = TxnId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.journal.lock().append(id, TxnRecord::Begin);
        tracing::debug!(txn = %id, "begin transaction");
        Txn {
            mgr: self,
            id,
            kind: TxnKind::Fresh,
            state: TxnState::Active,
        }
    }

    /// Start a batch transaction. The caller owns it and commits it after
    /// all batched operations have joined and finished.
    pub fn begin_batch(&self) -> Txn<'_> {
        self.begin()
    }

    /// Continue an ambient batch transaction.
    pub fn join(&self, batch: TxnId) -> Txn<'_> {
        Txn {
            mgr: self,
            id: batch,
            kind: TxnKind::Joined,
            state: TxnState::Active,
        }
    }

    /// Begin fresh, or join the given batch if one is ambient.
    pub fn begin_or_join(&self, batch: Option<TxnId>) -> Txn<'_> {
        match batch {
            Some(id) => self.join(id),
            None => self.begin(),
        }
    }

    /// Inspect the journal.
    pub fn with_journal<R>(&self, f: impl FnOnce(&Journal) -> R) -> R {
        f(&self.journal.lock())
    }
}

/// One transaction handle.
pub struct Txn<'m> {
    mgr: &'m TxnManager,
    id: TxnId,
    kind: TxnKind,
    state: TxnState,
}

impl Txn<'_> {
    pub fn id(&self) -> TxnId {
        self.id
    }

    pub fn kind(&self) -> TxnKind {
        self.kind
    }

    pub fn state(&self) -> TxnState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TxnState::Active
    }

    /// Record that a document was re-persisted under this transaction.
    pub fn record_persist(&mut self, doc: DocumentId) -> TxnResult<()> {
        self.ensure_active()?;
        self.mgr.journal.lock().append(self.id, TxnRecord::Persist(doc));
        Ok(())
    }

    /// Commit. For a joined handle this only releases the continuation;
    /// the batch owner writes the commit record.
    pub fn commit(mut self) -> TxnResult<()> {
        self.ensure_active()?;
        self.state = TxnState::Committed;
        if self.kind == TxnKind::Fresh {
            self.mgr.journal.lock().append(self.id, TxnRecord::Commit);
            tracing::debug!(txn = %self.id, "committed transaction");
        }
        Ok(())
    }

    /// Abort explicitly. Dropping an active fresh handle does the same.
    pub fn abort(mut self) {
        self.mark_aborted();
    }

    fn mark_aborted(&mut self) {
        if self.state == TxnState::Active {
            self.state = TxnState::Aborted;
            if self.kind == TxnKind::Fresh {
                self.mgr.journal.lock().append(self.id, TxnRecord::Abort);
                tracing::debug!(txn = %self.id, "aborted transaction");
            }
        }
    }

    fn ensure_active(&self) -> TxnResult<()> {
        if self.state != TxnState::Active {
            return Err(TxnError::not_active(self.id));
        }
        Ok(())
    }
}

impl Drop for Txn<'_> {
    fn drop(&mut self) {
        // An uncommitted fresh transaction aborts on every exit path.
        self.mark_aborted();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_writes_record() {
        // GIVEN
        let mgr = TxnManager::new();
        let txn = mgr.begin();
        let id = txn.id();

        // WHEN
        txn.commit().unwrap();

        // THEN
        assert!(mgr.with_journal(|j| j.committed(id)));
    }

    #[test]
    fn test_drop_without_commit_aborts() {
        // GIVEN
        let mgr = TxnManager::new();
        let id = {
            let txn = mgr.begin();
            txn.id()
            // dropped here, uncommitted
        };

        // THEN
        assert!(!mgr.with_journal(|j| j.committed(id)));
        assert!(mgr.with_journal(|j| j.records_for(id).contains(&TxnRecord::Abort)));
    }

    #[test]
    fn test_joined_commit_defers_to_batch() {
        // GIVEN
        let mgr = TxnManager::new();
        let batch = mgr.begin_batch();
        let id = batch.id();

        // WHEN - a joined continuation commits
        let joined = mgr.join(id);
        joined.commit().unwrap();

        // THEN - no commit record until the batch owner commits
        assert!(!mgr.with_journal(|j| j.committed(id)));
        batch.commit().unwrap();
        assert!(mgr.with_journal(|j| j.committed(id)));
    }

    #[test]
    fn test_record_persist_requires_active() {
        // GIVEN
        let mgr = TxnManager::new();
        let mut txn = mgr.begin();
        let doc = DocumentId::new(1);

        // WHEN / THEN
        txn.record_persist(doc).unwrap();
        let id = txn.id();
        txn.commit().unwrap();
        assert!(mgr.with_journal(|j| j.records_for(id).contains(&TxnRecord::Persist(doc))));
    }
}
