//! Update executor - coordinates mutation operations.
//!
//! The executor delegates to specialized operation modules in `ops/`:
//! - `ops/insert.rs` - insert before / after / into
//! - `ops/delete.rs` - node removal
//! - `ops/update.rs` - value replacement
//! - `ops/rename.rs` - element and attribute renaming

use crate::context::QueryContext;
use crate::error::UpdateResult;
use crate::modification::Modification;
use crate::ops::{self, InsertMode};
use xylem_core::DocumentId;
use xylem_dom::{DocumentStore, Sequence};
use xylem_lock::LockManager;
use xylem_txn::TxnManager;

/// Update executor.
pub struct UpdateExecutor<'s> {
    store: &'s mut DocumentStore,
    locks: &'s LockManager,
    txns: &'s TxnManager,
}

impl<'s> UpdateExecutor<'s> {
    /// Create a new executor over the shared store and managers.
    pub fn new(
        store: &'s mut DocumentStore,
        locks: &'s LockManager,
        txns: &'s TxnManager,
    ) -> Self {
        Self { store, locks, txns }
    }

    /// Insert a copy of `content` before each node of `select`.
    pub fn insert_before(
        &mut self,
        ctx: &mut QueryContext,
        select: &Sequence,
        content: &Sequence,
    ) -> UpdateResult<Sequence> {
        ops::insert(
            ctx,
            self.store,
            self.locks,
            self.txns,
            select,
            content,
            InsertMode::Before,
        )
    }

    /// Insert a copy of `content` after each node of `select`.
    pub fn insert_after(
        &mut self,
        ctx: &mut QueryContext,
        select: &Sequence,
        content: &Sequence,
    ) -> UpdateResult<Sequence> {
        ops::insert(
            ctx,
            self.store,
            self.locks,
            self.txns,
            select,
            content,
            InsertMode::After,
        )
    }

    /// Append a copy of `content` to each element of `select`.
    pub fn insert_into(
        &mut self,
        ctx: &mut QueryContext,
        select: &Sequence,
        content: &Sequence,
    ) -> UpdateResult<Sequence> {
        ops::insert(
            ctx,
            self.store,
            self.locks,
            self.txns,
            select,
            content,
            InsertMode::Append,
        )
    }

    /// Remove each node of `select`.
    pub fn delete(
        &mut self,
        ctx: &mut QueryContext,
        select: &Sequence,
    ) -> UpdateResult<Sequence> {
        ops::delete(ctx, self.store, self.locks, self.txns, select)
    }

    /// Replace each selected node's value with a copy of `content`.
    pub fn update_value(
        &mut self,
        ctx: &mut QueryContext,
        select: &Sequence,
        content: &Sequence,
    ) -> UpdateResult<Sequence> {
        ops::update_value(ctx, self.store, self.locks, self.txns, select, content)
    }

    /// Give each selected element or attribute a new name.
    pub fn rename(
        &mut self,
        ctx: &mut QueryContext,
        select: &Sequence,
        new_name: &Sequence,
    ) -> UpdateResult<Sequence> {
        ops::rename(ctx, self.store, self.locks, self.txns, select, new_name)
    }

    /// Compact the listed documents if their page-split counts exceed the
    /// threshold (the store's configured threshold when `None`).
    pub fn check_fragmentation(
        &mut self,
        docs: &[DocumentId],
        split_threshold: Option<u32>,
    ) -> UpdateResult<()> {
        Modification::check_fragmentation(self.store, self.txns, self.locks, docs, split_threshold)
    }
}
