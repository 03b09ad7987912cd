//! Mutation operations.
//!
//! Each operation is a free function over the stores and managers it
//! touches, wrapped around a [`Modification`](crate::Modification) that
//! carries the per-invocation lock set and triggers. All four share the
//! same shape: validate the selection, open or join a transaction,
//! acquire locks, mutate, release locks, commit.

mod delete;
mod insert;
mod rename;
mod update;

pub use delete::delete;
pub use insert::{insert, InsertMode};
pub use rename::rename;
pub use update::update_value;

use crate::error::{UpdateError, UpdateResult};
use crate::modification::Modification;
use xylem_core::DocumentId;

/// Write-permission gate, checked per target document after locking.
pub(crate) fn check_write(m: &Modification<'_>, doc_id: DocumentId) -> UpdateResult<()> {
    let doc = m.store.doc(doc_id)?;
    if !doc.permissions().can_write(m.ctx.principal()) {
        return Err(UpdateError::permission_denied(
            m.ctx.principal().name(),
            doc.uri(),
        ));
    }
    Ok(())
}
