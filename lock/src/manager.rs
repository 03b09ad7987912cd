//! The lock manager.
//!
//! Two levels of locking protect node positions during structural edits:
//!
//! - The **global update lock** serializes only the lock-acquisition phase
//!   of concurrent modification statements. While one statement computes
//!   its document set and takes per-document locks, no other statement may
//!   do the same, which bounds deadlock risk from inconsistent acquisition
//!   ordering. It is released the moment the per-document locks are held.
//! - **Per-document write locks** are held for the full mutation of a
//!   statement, so no concurrent writer or position-dependent reader can
//!   observe an intermediate state.
//!
//! All guards release on drop.

use crate::error::{LockError, LockResult};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use xylem_core::DocumentId;

/// Default patience for a single write-lock acquisition.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// One document's write lock. Single state bit guarded by a condvar so the
/// guard can own the `Arc` and release from `Drop`.
#[derive(Debug, Default)]
struct DocLock {
    locked: Mutex<bool>,
    available: Condvar,
}

impl DocLock {
    fn acquire(&self, doc: DocumentId, timeout: Duration) -> LockResult<()> {
        let deadline = Instant::now() + timeout;
        let mut locked = self.locked.lock();
        while *locked {
            if self.available.wait_until(&mut locked, deadline).timed_out() {
                return Err(LockError::timeout(doc, timeout));
            }
        }
        *locked = true;
        Ok(())
    }

    fn release(&self) {
        let mut locked = self.locked.lock();
        *locked = false;
        self.available.notify_one();
    }
}

/// Holds the global update lock for the duration of the acquisition phase.
pub struct AcquisitionGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// An exclusive write lock on one document. Released on drop.
#[derive(Debug)]
pub struct WriteGuard {
    doc: DocumentId,
    lock: Arc<DocLock>,
}

impl WriteGuard {
    pub fn doc(&self) -> DocumentId {
        self.doc
    }
}

impl Drop for WriteGuard {
    fn drop(&mut self) {
        self.lock.release();
        tracing::trace!(doc = %self.doc, "released write lock");
    }
}

/// The write locks held by one modification statement.
pub struct DocLockSet {
    guards: Vec<WriteGuard>,
}

impl DocLockSet {
    pub fn docs(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.guards.iter().map(|g| g.doc())
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

/// Process-wide lock registry.
#[derive(Default)]
pub struct LockManager {
    update_lock: Mutex<()>,
    docs: Mutex<HashMap<DocumentId, Arc<DocLock>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the global update lock. Hold the returned guard only while
    /// determining and acquiring the per-document lock set.
    pub fn begin_acquisition(&self) -> AcquisitionGuard<'_> {
        AcquisitionGuard {
            _guard: self.update_lock.lock(),
        }
    }

    /// Acquire the write lock of a single document.
    pub fn write_lock(&self, doc: DocumentId, timeout: Duration) -> LockResult<WriteGuard> {
        let lock = self.doc_lock(doc);
        lock.acquire(doc, timeout)?;
        tracing::trace!(doc = %doc, "acquired write lock");
        Ok(WriteGuard { doc, lock })
    }

    /// Acquire write locks on a whole document set. Ids are deduplicated
    /// and taken in ascending order; the caller should hold the global
    /// update lock across this call. Already-held guards are released (by
    /// drop) if any later acquisition fails.
    pub fn lock_set(&self, docs: &[DocumentId], timeout: Duration) -> LockResult<DocLockSet> {
        let mut ordered = docs.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for doc in ordered {
            guards.push(self.write_lock(doc, timeout)?);
        }
        Ok(DocLockSet { guards })
    }

    fn doc_lock(&self, doc: DocumentId) -> Arc<DocLock> {
        let mut docs = self.docs.lock();
        docs.entry(doc).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn d(n: u64) -> DocumentId {
        DocumentId::new(n)
    }

    #[test]
    fn test_write_lock_excludes_second_writer() {
        // GIVEN
        let mgr = LockManager::new();
        let guard = mgr.write_lock(d(1), DEFAULT_LOCK_TIMEOUT).unwrap();

        // WHEN - a second acquisition with a short timeout
        let result = mgr.write_lock(d(1), Duration::from_millis(50));

        // THEN
        assert!(matches!(result.unwrap_err(), LockError::Timeout { .. }));
        drop(guard);
        assert!(mgr.write_lock(d(1), Duration::from_millis(50)).is_ok());
    }

    #[test]
    fn test_lock_set_dedups_and_orders() {
        // GIVEN
        let mgr = LockManager::new();

        // WHEN
        let set = mgr
            .lock_set(&[d(3), d(1), d(3), d(2)], DEFAULT_LOCK_TIMEOUT)
            .unwrap();

        // THEN
        let docs: Vec<_> = set.docs().collect();
        assert_eq!(docs, vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn test_disjoint_sets_never_deadlock() {
        // GIVEN - two threads repeatedly locking disjoint document sets
        // through the full acquisition protocol
        let mgr = Arc::new(LockManager::new());
        let completed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = [(1u64, 2u64), (3, 4)]
            .into_iter()
            .map(|(a, b)| {
                let mgr = mgr.clone();
                let completed = completed.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let set = {
                            let _phase = mgr.begin_acquisition();
                            mgr.lock_set(&[d(a), d(b)], DEFAULT_LOCK_TIMEOUT).unwrap()
                        };
                        drop(set);
                    }
                    completed.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        // THEN
        assert_eq!(completed.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_overlapping_sets_serialize() {
        // GIVEN - two threads hammering overlapping sets in opposite
        // declaration order; the acquisition protocol must not deadlock
        let mgr = Arc::new(LockManager::new());
        let handles: Vec<_> = [[1u64, 2u64], [2, 1]]
            .into_iter()
            .map(|docs| {
                let mgr = mgr.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let set = {
                            let _phase = mgr.begin_acquisition();
                            mgr.lock_set(&[d(docs[0]), d(docs[1])], DEFAULT_LOCK_TIMEOUT)
                                .unwrap()
                        };
                        drop(set);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn test_failed_set_releases_partial_guards() {
        // GIVEN - d2 is already held elsewhere
        let mgr = LockManager::new();
        let held = mgr.write_lock(d(2), DEFAULT_LOCK_TIMEOUT).unwrap();

        // WHEN - a set spanning d1 and d2 times out
        let result = mgr.lock_set(&[d(1), d(2)], Duration::from_millis(50));
        assert!(result.is_err());
        drop(held);

        // THEN - d1 was released on the failure path
        assert!(mgr.write_lock(d(1), Duration::from_millis(50)).is_ok());
    }
}
