//! In-memory transaction journal.
//!
//! Records the lifecycle of every transaction and the documents it
//! persisted. Durability itself is delegated to the storage layer; the
//! journal gives tests and maintenance code an inspectable account of
//! what committed and what aborted.

use xylem_core::{DocumentId, TxnId};

/// One journal record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnRecord {
    Begin,
    /// A document was re-persisted within the transaction.
    Persist(DocumentId),
    Commit,
    Abort,
}

/// One journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalEntry {
    pub txn: TxnId,
    pub record: TxnRecord,
}

/// Append-only in-memory journal.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, txn: TxnId, record: TxnRecord) {
        self.entries.push(JournalEntry { txn, record });
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// All records of one transaction, in order.
    pub fn records_for(&self, txn: TxnId) -> Vec<TxnRecord> {
        self.entries
            .iter()
            .filter(|e| e.txn == txn)
            .map(|e| e.record)
            .collect()
    }

    /// Whether the transaction reached a commit record.
    pub fn committed(&self, txn: TxnId) -> bool {
        self.records_for(txn).contains(&TxnRecord::Commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_order() {
        // GIVEN
        let mut journal = Journal::new();
        let t = TxnId::new(1);

        // WHEN
        journal.append(t, TxnRecord::Begin);
        journal.append(t, TxnRecord::Persist(DocumentId::new(4)));
        journal.append(t, TxnRecord::Commit);

        // THEN
        assert_eq!(
            journal.records_for(t),
            vec![
                TxnRecord::Begin,
                TxnRecord::Persist(DocumentId::new(4)),
                TxnRecord::Commit
            ]
        );
        assert!(journal.committed(t));
    }

    #[test]
    fn test_uncommitted_txn() {
        let mut journal = Journal::new();
        let t = TxnId::new(2);
        journal.append(t, TxnRecord::Begin);
        journal.append(t, TxnRecord::Abort);
        assert!(!journal.committed(t));
    }
}
