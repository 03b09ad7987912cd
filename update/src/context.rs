//! Per-query state handed in by the evaluation layer.
//!
//! The mutation engine does not evaluate expressions; it receives the
//! active principal, the statement's namespace bindings, an optional
//! ambient batch transaction, the trigger configuration, and the shared
//! error-trap variables a query can accumulate soft failures into.

use std::collections::HashMap;
use xylem_core::{Namespaces, Subject, TxnId};
use xylem_trigger::TriggerConfig;

/// Context-variable name the operations record soft failures under.
pub const UPDATE_ERROR_VAR: &str = "update-error";

/// One query's mutation-relevant state.
pub struct QueryContext {
    principal: Subject,
    namespaces: Namespaces,
    triggers: TriggerConfig,
    batch: Option<TxnId>,
    traps: HashMap<String, Vec<String>>,
}

impl QueryContext {
    pub fn new(principal: Subject) -> Self {
        Self {
            principal,
            namespaces: Namespaces::new(),
            triggers: TriggerConfig::new(),
            batch: None,
            traps: HashMap::new(),
        }
    }

    pub fn principal(&self) -> &Subject {
        &self.principal
    }

    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Bind a statement-level namespace prefix.
    pub fn bind_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.namespaces.bind(prefix, uri);
    }

    pub fn triggers(&self) -> &TriggerConfig {
        &self.triggers
    }

    pub fn set_trigger_config(&mut self, config: TriggerConfig) {
        self.triggers = config;
    }

    /// The ambient batch transaction, if the query runs inside one.
    pub fn batch(&self) -> Option<TxnId> {
        self.batch
    }

    pub fn set_batch(&mut self, batch: Option<TxnId>) {
        self.batch = batch;
    }

    // ==================== Error Traps ====================

    /// Append a message to a trap variable.
    pub fn record_trap(&mut self, name: &str, message: impl Into<String>) {
        self.traps
            .entry(name.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages accumulated under a trap variable.
    pub fn trap_messages(&self, name: &str) -> &[String] {
        self.traps.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Take and clear a trap variable.
    pub fn drain_trap(&mut self, name: &str) -> Vec<String> {
        self.traps.remove(name).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trap_accumulates() {
        // GIVEN
        let mut ctx = QueryContext::new(Subject::new("alice"));

        // WHEN
        ctx.record_trap(UPDATE_ERROR_VAR, "first");
        ctx.record_trap(UPDATE_ERROR_VAR, "second");

        // THEN
        assert_eq!(ctx.trap_messages(UPDATE_ERROR_VAR), ["first", "second"]);
        assert_eq!(ctx.drain_trap(UPDATE_ERROR_VAR).len(), 2);
        assert!(ctx.trap_messages(UPDATE_ERROR_VAR).is_empty());
    }

    #[test]
    fn test_namespace_binding() {
        let mut ctx = QueryContext::new(Subject::new("alice"));
        ctx.bind_namespace("p", "urn:p");
        assert_eq!(ctx.namespaces().resolve("p"), Some("urn:p"));
    }
}
