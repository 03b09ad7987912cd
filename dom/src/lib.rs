//! Xylem DOM
//!
//! Persisted XML document trees and the structural mutation primitives the
//! update engine is built on.
//!
//! Responsibilities:
//! - Arena-backed node storage with stable ids (`DocumentImpl`)
//! - Transient value trees for content about to be inserted
//! - Structural primitives: insert-before/after, append, remove, update
//! - Namespace-scope resolution along the ancestor axis
//! - Document store with persistence accounting and update notification
//! - Defragmentation and consistency checking
//!
//! # Module Structure
//!
//! - `node` - Arena records, node kinds, transient trees
//! - `document` - `DocumentImpl` and the mutation primitives
//! - `sequence` - `Item`/`Sequence` exchange types for the query layer
//! - `store` - `DocumentStore` and the notification service
//! - `error` - error types

mod document;
mod error;
mod node;
mod sequence;
mod store;

pub use document::DocumentImpl;
pub use error::{DomError, DomResult};
pub use node::{NodeKind, NodeRecord, TransientAttr, TransientNode};
pub use sequence::{Item, ItemType, Sequence};
pub use store::{DocumentStore, NotificationService, UpdateEvent, UpdateListener};
