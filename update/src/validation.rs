//! Shared selection and content checks.

use crate::context::{QueryContext, UPDATE_ERROR_VAR};
use crate::error::{UpdateError, UpdateResult};
use xylem_core::Namespaces;
use xylem_dom::{Item, Sequence, TransientNode};

/// Check that the select sequence is node-typed.
///
/// Returns `Ok(true)` when the operation should proceed. An empty
/// selection fails the node-type check (its item type is `Empty`, not a
/// node subtype) but is soft-trapped: one message is recorded into the
/// query's error-trap variable and the operation becomes a no-op,
/// `Ok(false)`. A non-empty selection with non-node items is a hard
/// `TypeMismatch`.
pub(crate) fn check_node_selection(
    ctx: &mut QueryContext,
    select: &Sequence,
) -> UpdateResult<bool> {
    let item_type = select.item_type();
    if item_type.is_node() {
        return Ok(true);
    }
    if select.is_empty() {
        ctx.record_trap(
            UPDATE_ERROR_VAR,
            "select expression returned the empty sequence: nothing to modify",
        );
        tracing::debug!("empty selection trapped, operation is a no-op");
        return Ok(false);
    }
    Err(UpdateError::type_mismatch(format!("{:?}", item_type)))
}

/// Turn deep-copied content into the transient nodes the structural
/// primitives accept. Each atomic item becomes its own text node; adjacent
/// atomics are never merged.
pub(crate) fn to_transient_content(content: &Sequence) -> Vec<TransientNode> {
    content
        .iter()
        .filter_map(|item| match item {
            Item::Transient(node) => Some(node.clone()),
            Item::Atomic(value) => Some(TransientNode::text(value.string_value())),
            // Deep copy precedes this call; stored handles cannot appear.
            Item::Stored(_) => None,
        })
        .collect()
}

/// Reject content that would rebind an in-scope namespace prefix to a
/// different URI (err:XUDY0023). Unbound prefixes and bindings to the
/// same URI pass. The whole copied tree is checked against the
/// insertion-point scope.
pub(crate) fn check_ns_conflicts(
    node: &TransientNode,
    scope: &Namespaces,
) -> UpdateResult<()> {
    let TransientNode::Element {
        name,
        ns_decls,
        attributes,
        children,
    } = node
    else {
        return Ok(());
    };

    let mut bindings: Vec<(&str, &str)> = Vec::new();
    if let (Some(prefix), Some(uri)) = (name.prefix(), name.ns_uri()) {
        bindings.push((prefix, uri));
    }
    for (prefix, uri) in ns_decls {
        bindings.push((prefix, uri));
    }
    for attr in attributes {
        if let (Some(prefix), Some(uri)) = (attr.name.prefix(), attr.name.ns_uri()) {
            bindings.push((prefix, uri));
        }
    }

    for (prefix, uri) in bindings {
        if let Some(bound) = scope.resolve(prefix) {
            if bound != uri {
                return Err(UpdateError::namespace_conflict(prefix, bound, uri));
            }
        }
    }

    for child in children {
        check_ns_conflicts(child, scope)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use xylem_core::{QName, Subject, Value};

    fn q(local: &str) -> QName {
        QName::local(local).unwrap()
    }

    #[test]
    fn test_empty_selection_traps() {
        // GIVEN
        let mut ctx = QueryContext::new(Subject::new("alice"));

        // WHEN
        let proceed = check_node_selection(&mut ctx, &Sequence::empty()).unwrap();

        // THEN
        assert!(!proceed);
        assert_eq!(ctx.trap_messages(UPDATE_ERROR_VAR).len(), 1);
    }

    #[test]
    fn test_non_node_selection_throws() {
        // GIVEN
        let mut ctx = QueryContext::new(Subject::new("alice"));
        let select = Sequence::from(vec![Item::Atomic(Value::from("not a node"))]);

        // WHEN
        let result = check_node_selection(&mut ctx, &select);

        // THEN
        assert!(matches!(
            result.unwrap_err(),
            UpdateError::TypeMismatch { .. }
        ));
        assert!(ctx.trap_messages(UPDATE_ERROR_VAR).is_empty());
    }

    #[test]
    fn test_atomics_become_distinct_text_nodes() {
        // GIVEN
        let content = Sequence::from(vec![
            Item::Atomic(Value::from("a")),
            Item::Atomic(Value::from("b")),
        ]);

        // WHEN
        let nodes = to_transient_content(&content);

        // THEN - two separate text nodes, not one merged "ab"
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0], TransientNode::text("a"));
        assert_eq!(nodes[1], TransientNode::text("b"));
    }

    #[test]
    fn test_ns_conflict_on_different_uri() {
        // GIVEN - scope binds p -> urn:b, content binds p -> urn:a
        let mut scope = Namespaces::new();
        scope.bind("p", "urn:b");
        let content = TransientNode::element(QName::with_ns("p", "x", "urn:a").unwrap());

        // WHEN
        let result = check_ns_conflicts(&content, &scope);

        // THEN
        assert!(matches!(
            result.unwrap_err(),
            UpdateError::NamespaceConflict { .. }
        ));
    }

    #[test]
    fn test_same_uri_or_unbound_prefix_accepted() {
        // GIVEN
        let mut scope = Namespaces::new();
        scope.bind("p", "urn:a");

        // THEN - same URI passes
        let same = TransientNode::element(QName::with_ns("p", "x", "urn:a").unwrap());
        assert!(check_ns_conflicts(&same, &scope).is_ok());

        // THEN - an unbound prefix passes
        let unbound = TransientNode::element(QName::with_ns("q", "x", "urn:q").unwrap());
        assert!(check_ns_conflicts(&unbound, &scope).is_ok());
    }

    #[test]
    fn test_ns_conflict_found_in_nested_content() {
        // GIVEN - the conflict sits on a grandchild
        let mut scope = Namespaces::new();
        scope.bind("p", "urn:b");
        let content = TransientNode::element(q("outer")).with_child(
            TransientNode::element(q("inner"))
                .with_child(TransientNode::element(QName::with_ns("p", "x", "urn:a").unwrap())),
        );

        // THEN
        assert!(check_ns_conflicts(&content, &scope).is_err());
    }
}
