//! Xylem Core
//!
//! Identity, naming, value, and security primitives shared by every layer
//! of the database.
//!
//! Responsibilities:
//! - Stable identifiers for documents, nodes, and transactions
//! - QName parsing and namespace-prefix resolution
//! - Atomic values as exchanged with the query layer
//! - Subjects and document permissions

mod error;
mod id;
mod qname;
mod security;
mod value;

pub use error::{CoreError, CoreResult};
pub use id::{DocumentId, NodeId, StoredNode, TxnId};
pub use qname::{Namespaces, QName, XML_NS_URI, XML_PREFIX};
pub use security::{Permissions, Subject};
pub use value::Value;
