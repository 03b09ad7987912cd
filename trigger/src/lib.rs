//! Xylem Trigger
//!
//! Before/after hooks around document-level updates.
//!
//! Responsibilities:
//! - The `DocumentTrigger` trait: before-update may veto, after-update
//!   observes
//! - Per-operation `TriggerRegistry`, document-id keyed, never shared
//!   across operations
//! - `TriggerConfig`: collection-name → factory wiring

mod error;
mod registry;

pub use error::{TriggerError, TriggerResult};
pub use registry::{DocumentTrigger, TriggerConfig, TriggerFactory, TriggerRegistry};
