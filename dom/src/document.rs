//! Persisted document implementation.
//!
//! A document owns an arena of `NodeRecord`s addressed by stable `NodeId`s.
//! The arena index is the only way nodes are resolved; structural edits may
//! relocate a node's storage but its id never changes while it lives.
//!
//! Every structural primitive here assumes the caller holds the document's
//! write lock. The primitives consume `TransientNode` trees only, so the
//! content being written can never alias the tree being written into.

use crate::error::{DomError, DomResult};
use crate::node::{NodeKind, NodeRecord, TransientAttr, TransientNode};
use std::collections::HashMap;
use xylem_core::{DocumentId, Namespaces, NodeId, Permissions, QName};

/// A persisted XML document.
#[derive(Debug, Clone)]
pub struct DocumentImpl {
    id: DocumentId,
    uri: String,
    collection: String,
    permissions: Permissions,
    /// Milliseconds since the Unix epoch of the last mutation.
    last_modified: u64,
    /// Number of structural page splits since the last defragmentation.
    page_splits: u32,
    /// Revision counter bumped on every persist.
    revision: u64,
    nodes: HashMap<NodeId, NodeRecord>,
    doc_node: NodeId,
    next_node_id: u64,
}

impl DocumentImpl {
    /// Create an empty document containing only its document node.
    pub fn new(
        id: DocumentId,
        uri: impl Into<String>,
        collection: impl Into<String>,
        permissions: Permissions,
    ) -> Self {
        let doc_node = NodeId::new(1);
        let mut nodes = HashMap::new();
        nodes.insert(doc_node, NodeRecord::new(doc_node, None, NodeKind::Document));
        Self {
            id,
            uri: uri.into(),
            collection: collection.into(),
            permissions,
            last_modified: 0,
            page_splits: 0,
            revision: 0,
            nodes,
            doc_node,
            next_node_id: 2,
        }
    }

    // ==================== Metadata ====================

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn permissions(&self) -> &Permissions {
        &self.permissions
    }

    pub fn permissions_mut(&mut self) -> &mut Permissions {
        &mut self.permissions
    }

    pub fn last_modified(&self) -> u64 {
        self.last_modified
    }

    /// Update the last-modified timestamp.
    pub fn touch(&mut self, millis: u64) {
        self.last_modified = millis;
    }

    pub fn page_splits(&self) -> u32 {
        self.page_splits
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn bump_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    // ==================== Node Access ====================

    /// The document node id.
    pub fn doc_node(&self) -> NodeId {
        self.doc_node
    }

    /// The document element, if the document is non-empty.
    pub fn document_element(&self) -> Option<NodeId> {
        self.nodes
            .get(&self.doc_node)
            .and_then(|record| record.children.first().copied())
    }

    /// Resolve a node record through the arena index.
    pub fn node(&self, id: NodeId) -> DomResult<&NodeRecord> {
        self.nodes.get(&id).ok_or(DomError::NodeNotFound(id))
    }

    /// Whether the node id is present in the arena.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// The node's kind.
    pub fn kind(&self, id: NodeId) -> DomResult<&NodeKind> {
        Ok(&self.node(id)?.kind)
    }

    /// DOM parent of a node. The document node has none.
    pub fn parent_of(&self, id: NodeId) -> DomResult<Option<NodeId>> {
        Ok(self.node(id)?.parent)
    }

    /// Child nodes of an element or the document node, in document order.
    pub fn children_of(&self, id: NodeId) -> DomResult<&[NodeId]> {
        Ok(&self.node(id)?.children)
    }

    /// Attribute nodes of an element.
    pub fn attributes_of(&self, id: NodeId) -> DomResult<&[NodeId]> {
        Ok(&self.node(id)?.attributes)
    }

    /// Element or attribute name.
    pub fn name_of(&self, id: NodeId) -> DomResult<Option<&QName>> {
        Ok(match &self.node(id)?.kind {
            NodeKind::Element { name, .. } => Some(name),
            NodeKind::Attribute { name, .. } => Some(name),
            _ => None,
        })
    }

    /// Text data of a text node, attribute value of an attribute.
    pub fn value_of(&self, id: NodeId) -> DomResult<Option<&str>> {
        Ok(match &self.node(id)?.kind {
            NodeKind::Text { data } => Some(data.as_str()),
            NodeKind::Attribute { value, .. } => Some(value.as_str()),
            NodeKind::Comment { data } => Some(data.as_str()),
            NodeKind::ProcessingInstruction { data, .. } => Some(data.as_str()),
            _ => None,
        })
    }

    /// The XPath string value of a node: its own data, or the
    /// concatenation of all descendant text.
    pub fn string_value(&self, id: NodeId) -> DomResult<String> {
        let record = self.node(id)?;
        Ok(match &record.kind {
            NodeKind::Text { data } => data.clone(),
            NodeKind::Attribute { value, .. } => value.clone(),
            NodeKind::Comment { data } => data.clone(),
            NodeKind::ProcessingInstruction { data, .. } => data.clone(),
            NodeKind::Document | NodeKind::Element { .. } => {
                let mut out = String::new();
                for &child in &record.children {
                    out.push_str(&self.string_value(child)?);
                }
                out
            }
        })
    }

    /// Namespace bindings in scope at a node, walking the ancestor-or-self
    /// axis. The nearest declaration of a prefix wins. Prefixes used by
    /// element and attribute names count as in-scope bindings alongside
    /// explicit declarations.
    pub fn in_scope_namespaces(&self, id: NodeId) -> DomResult<Namespaces> {
        let mut scope: Vec<(String, String)> = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let record = self.node(node_id)?;
            if let NodeKind::Element { name, ns_decls } = &record.kind {
                for (prefix, uri) in ns_decls {
                    scope.push((prefix.clone(), uri.clone()));
                }
                if let (Some(prefix), Some(uri)) = (name.prefix(), name.ns_uri()) {
                    scope.push((prefix.to_string(), uri.to_string()));
                }
                for &attr_id in &record.attributes {
                    if let NodeKind::Attribute { name, .. } = &self.node(attr_id)?.kind {
                        if let (Some(prefix), Some(uri)) = (name.prefix(), name.ns_uri()) {
                            scope.push((prefix.to_string(), uri.to_string()));
                        }
                    }
                }
            }
            current = record.parent;
        }
        // Outermost first so that nearer declarations shadow on rebind.
        let mut namespaces = Namespaces::new();
        for (prefix, uri) in scope.into_iter().rev() {
            namespaces.bind(prefix, uri);
        }
        Ok(namespaces)
    }

    // ==================== Structural Primitives ====================

    /// Install the document element from a transient tree.
    pub fn set_document_element(&mut self, content: TransientNode) -> DomResult<NodeId> {
        if self.document_element().is_some() {
            return Err(DomError::RootExists);
        }
        if !content.is_element() {
            return Err(DomError::invalid_placement(
                "non-element",
                "as the document element",
            ));
        }
        let doc_node = self.doc_node;
        let id = self.materialize(&content, doc_node)?;
        self.record_mut(doc_node)?.children.push(id);
        Ok(id)
    }

    /// Insert content as siblings immediately before `target`.
    pub fn insert_before(
        &mut self,
        target: NodeId,
        content: &[TransientNode],
    ) -> DomResult<Vec<NodeId>> {
        self.insert_siblings(target, content, 0)
    }

    /// Insert content as siblings immediately after `target`.
    pub fn insert_after(
        &mut self,
        target: NodeId,
        content: &[TransientNode],
    ) -> DomResult<Vec<NodeId>> {
        self.insert_siblings(target, content, 1)
    }

    fn insert_siblings(
        &mut self,
        target: NodeId,
        content: &[TransientNode],
        offset: usize,
    ) -> DomResult<Vec<NodeId>> {
        let parent = self
            .node(target)?
            .parent
            .ok_or(DomError::NoParent(target))?;
        if !self.node(parent)?.kind.is_element() {
            return Err(DomError::NotAnElement(parent));
        }
        let position = self
            .node(parent)?
            .children
            .iter()
            .position(|&c| c == target)
            .ok_or(DomError::NodeNotFound(target))?;

        let mut new_ids = Vec::with_capacity(content.len());
        for node in content {
            if node.is_attribute() {
                return Err(DomError::invalid_placement("attribute", "between siblings"));
            }
            new_ids.push(self.materialize(node, parent)?);
        }
        let record = self.record_mut(parent)?;
        record
            .children
            .splice(position + offset..position + offset, new_ids.iter().copied());
        self.page_splits += new_ids.len() as u32;
        Ok(new_ids)
    }

    /// Append content as the last children of the element `parent`.
    /// Attribute content is attached to the attribute list instead.
    pub fn append_children(
        &mut self,
        parent: NodeId,
        content: &[TransientNode],
    ) -> DomResult<Vec<NodeId>> {
        if !self.node(parent)?.kind.is_element() {
            return Err(DomError::NotAnElement(parent));
        }
        let mut new_ids = Vec::with_capacity(content.len());
        for node in content {
            let id = self.materialize(node, parent)?;
            if node.is_attribute() {
                self.record_mut(parent)?.attributes.push(id);
            } else {
                self.record_mut(parent)?.children.push(id);
            }
            new_ids.push(id);
        }
        self.page_splits += new_ids.len() as u32;
        Ok(new_ids)
    }

    /// Detach a node (and its whole subtree) from its parent and drop it
    /// from the arena.
    pub fn remove_child(&mut self, node: NodeId) -> DomResult<()> {
        let parent = self.node(node)?.parent.ok_or(DomError::NoParent(node))?;
        let record = self.record_mut(parent)?;
        record.children.retain(|&c| c != node);
        record.attributes.retain(|&a| a != node);
        self.drop_subtree(node);
        self.page_splits += 1;
        Ok(())
    }

    /// Replace `old` with a freshly materialized copy of `new` at the same
    /// position under the same parent. Returns the replacement's id; the
    /// old id is gone from the arena afterwards.
    pub fn update_child(&mut self, old: NodeId, new: &TransientNode) -> DomResult<NodeId> {
        let parent = self.node(old)?.parent.ok_or(DomError::NoParent(old))?;
        if new.is_attribute() != self.node(old)?.kind.is_attribute() {
            return Err(DomError::invalid_placement(
                "mismatched",
                "in place of a node of a different class",
            ));
        }
        let new_id = self.materialize(new, parent)?;
        let record = self.record_mut(parent)?;
        let list = if new.is_attribute() {
            &mut record.attributes
        } else {
            &mut record.children
        };
        let position = list
            .iter()
            .position(|&c| c == old)
            .ok_or(DomError::NodeNotFound(old))?;
        list[position] = new_id;
        self.drop_subtree(old);
        self.page_splits += 1;
        Ok(new_id)
    }

    /// Replace an attribute node with a new attribute of the given name and
    /// value on the same owner element.
    pub fn replace_attribute(
        &mut self,
        old: NodeId,
        name: QName,
        value: impl Into<String>,
    ) -> DomResult<NodeId> {
        if !self.node(old)?.kind.is_attribute() {
            return Err(DomError::invalid_placement(
                "non-attribute",
                "in place of an attribute",
            ));
        }
        self.update_child(old, &TransientNode::Attribute(TransientAttr::new(name, value.into())))
    }

    // ==================== Serialization (deep copy out) ====================

    /// Serialize a persisted subtree into a fresh transient tree. The
    /// result shares nothing with the arena.
    pub fn serialize_node(&self, id: NodeId) -> DomResult<TransientNode> {
        let record = self.node(id)?;
        Ok(match &record.kind {
            NodeKind::Document => {
                // Document items normalize to their root element.
                let root = self
                    .document_element()
                    .ok_or(DomError::NodeNotFound(id))?;
                self.serialize_node(root)?
            }
            NodeKind::Element { name, ns_decls } => {
                let mut attributes = Vec::with_capacity(record.attributes.len());
                for &attr_id in &record.attributes {
                    if let NodeKind::Attribute { name, value } = &self.node(attr_id)?.kind {
                        attributes.push(TransientAttr::new(name.clone(), value.clone()));
                    }
                }
                let mut children = Vec::with_capacity(record.children.len());
                for &child_id in &record.children {
                    children.push(self.serialize_node(child_id)?);
                }
                TransientNode::Element {
                    name: name.clone(),
                    ns_decls: ns_decls.clone(),
                    attributes,
                    children,
                }
            }
            NodeKind::Attribute { name, value } => {
                TransientNode::Attribute(TransientAttr::new(name.clone(), value.clone()))
            }
            NodeKind::Text { data } => TransientNode::Text(data.clone()),
            NodeKind::Comment { data } => TransientNode::Comment(data.clone()),
            NodeKind::ProcessingInstruction { target, data } => {
                TransientNode::ProcessingInstruction {
                    target: target.clone(),
                    data: data.clone(),
                }
            }
        })
    }

    // ==================== Maintenance ====================

    /// Compact the arena storage. Node ids are stable across
    /// defragmentation; only the physical layout and the split counter
    /// reset.
    pub fn defragment(&mut self) {
        let compacted: HashMap<NodeId, NodeRecord> = self.nodes.drain().collect();
        self.nodes = compacted;
        self.nodes.shrink_to_fit();
        self.page_splits = 0;
        tracing::debug!(doc = %self.id, "defragmented document");
    }

    /// Verify arena invariants: parent/child symmetry, attribute kinds,
    /// reachability from the document node.
    pub fn consistency_check(&self) -> DomResult<()> {
        let mut reachable = 0usize;
        let mut stack = vec![self.doc_node];
        while let Some(id) = stack.pop() {
            let record = self.node(id)?;
            reachable += 1;
            for &child in record.children.iter().chain(record.attributes.iter()) {
                let child_record = self.node(child)?;
                if child_record.parent != Some(id) {
                    return Err(DomError::inconsistent(format!(
                        "node {} does not point back to parent {}",
                        child, id
                    )));
                }
                stack.push(child);
            }
            for &attr in &record.attributes {
                if !self.node(attr)?.kind.is_attribute() {
                    return Err(DomError::inconsistent(format!(
                        "non-attribute node {} in attribute list of {}",
                        attr, id
                    )));
                }
            }
        }
        if reachable != self.nodes.len() {
            return Err(DomError::inconsistent(format!(
                "{} arena records, {} reachable from the document node",
                self.nodes.len(),
                reachable
            )));
        }
        Ok(())
    }

    // ==================== Internal ====================

    fn record_mut(&mut self, id: NodeId) -> DomResult<&mut NodeRecord> {
        self.nodes.get_mut(&id).ok_or(DomError::NodeNotFound(id))
    }

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    /// Recursively copy a transient tree into the arena under `parent`.
    /// The caller wires the returned id into the parent's child or
    /// attribute list.
    fn materialize(&mut self, node: &TransientNode, parent: NodeId) -> DomResult<NodeId> {
        let id = self.alloc_id();
        match node {
            TransientNode::Element {
                name,
                ns_decls,
                attributes,
                children,
            } => {
                self.nodes.insert(
                    id,
                    NodeRecord::new(
                        id,
                        Some(parent),
                        NodeKind::Element {
                            name: name.clone(),
                            ns_decls: ns_decls.clone(),
                        },
                    ),
                );
                for attr in attributes {
                    let attr_id = self.alloc_id();
                    self.nodes.insert(
                        attr_id,
                        NodeRecord::new(
                            attr_id,
                            Some(id),
                            NodeKind::Attribute {
                                name: attr.name.clone(),
                                value: attr.value.clone(),
                            },
                        ),
                    );
                    self.record_mut(id)?.attributes.push(attr_id);
                }
                for child in children {
                    let child_id = self.materialize(child, id)?;
                    self.record_mut(id)?.children.push(child_id);
                }
            }
            TransientNode::Attribute(attr) => {
                self.nodes.insert(
                    id,
                    NodeRecord::new(
                        id,
                        Some(parent),
                        NodeKind::Attribute {
                            name: attr.name.clone(),
                            value: attr.value.clone(),
                        },
                    ),
                );
            }
            TransientNode::Text(data) => {
                self.nodes.insert(
                    id,
                    NodeRecord::new(id, Some(parent), NodeKind::Text { data: data.clone() }),
                );
            }
            TransientNode::Comment(data) => {
                self.nodes.insert(
                    id,
                    NodeRecord::new(id, Some(parent), NodeKind::Comment { data: data.clone() }),
                );
            }
            TransientNode::ProcessingInstruction { target, data } => {
                self.nodes.insert(
                    id,
                    NodeRecord::new(
                        id,
                        Some(parent),
                        NodeKind::ProcessingInstruction {
                            target: target.clone(),
                            data: data.clone(),
                        },
                    ),
                );
            }
        }
        Ok(id)
    }

    fn drop_subtree(&mut self, id: NodeId) {
        if let Some(record) = self.nodes.remove(&id) {
            for child in record.children.into_iter().chain(record.attributes) {
                self.drop_subtree(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(local: &str) -> QName {
        QName::local(local).unwrap()
    }

    fn sample() -> DocumentImpl {
        // <a><x/></a>
        let mut doc = DocumentImpl::new(
            DocumentId::new(1),
            "/db/a.xml",
            "/db",
            Permissions::default_for("admin"),
        );
        doc.set_document_element(
            TransientNode::element(q("a")).with_child(TransientNode::element(q("x"))),
        )
        .unwrap();
        doc
    }

    fn child_names(doc: &DocumentImpl, parent: NodeId) -> Vec<String> {
        doc.children_of(parent)
            .unwrap()
            .iter()
            .map(|&c| {
                doc.name_of(c)
                    .unwrap()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| doc.kind(c).unwrap().name().to_string())
            })
            .collect()
    }

    #[test]
    fn test_insert_after_orders_siblings() {
        // GIVEN
        let mut doc = sample();
        let root = doc.document_element().unwrap();
        let x = doc.children_of(root).unwrap()[0];

        // WHEN
        doc.insert_after(x, &[TransientNode::element(q("b"))]).unwrap();

        // THEN
        assert_eq!(child_names(&doc, root), vec!["x", "b"]);
    }

    #[test]
    fn test_insert_before_orders_siblings() {
        // GIVEN
        let mut doc = sample();
        let root = doc.document_element().unwrap();
        let x = doc.children_of(root).unwrap()[0];

        // WHEN
        doc.insert_before(x, &[TransientNode::element(q("b")), TransientNode::element(q("c"))])
            .unwrap();

        // THEN - content keeps its own relative order
        assert_eq!(child_names(&doc, root), vec!["b", "c", "x"]);
    }

    #[test]
    fn test_append_children_go_last() {
        // GIVEN
        let mut doc = sample();
        let root = doc.document_element().unwrap();

        // WHEN
        doc.append_children(root, &[TransientNode::element(q("y"))]).unwrap();

        // THEN
        assert_eq!(child_names(&doc, root), vec!["x", "y"]);
    }

    #[test]
    fn test_insert_before_root_has_no_element_parent() {
        // GIVEN
        let mut doc = sample();
        let root = doc.document_element().unwrap();

        // WHEN
        let result = doc.insert_before(root, &[TransientNode::element(q("b"))]);

        // THEN - the root's parent is the document node, not an element
        assert!(matches!(result.unwrap_err(), DomError::NotAnElement(_)));
    }

    #[test]
    fn test_remove_child_drops_subtree() {
        // GIVEN
        let mut doc = sample();
        let root = doc.document_element().unwrap();
        let x = doc.children_of(root).unwrap()[0];

        // WHEN
        doc.remove_child(x).unwrap();

        // THEN
        assert!(child_names(&doc, root).is_empty());
        assert!(!doc.contains(x));
    }

    #[test]
    fn test_update_child_supersedes_identity() {
        // GIVEN
        let mut doc = sample();
        let root = doc.document_element().unwrap();
        let x = doc.children_of(root).unwrap()[0];

        // WHEN
        let y = doc.update_child(x, &TransientNode::element(q("y"))).unwrap();

        // THEN
        assert_eq!(child_names(&doc, root), vec!["y"]);
        assert!(!doc.contains(x));
        assert!(doc.contains(y));
    }

    #[test]
    fn test_replace_attribute_keeps_owner() {
        // GIVEN
        let mut doc = DocumentImpl::new(
            DocumentId::new(1),
            "/db/a.xml",
            "/db",
            Permissions::default_for("admin"),
        );
        doc.set_document_element(TransientNode::element(q("a")).with_attr(q("attr"), "1"))
            .unwrap();
        let root = doc.document_element().unwrap();
        let attr = doc.attributes_of(root).unwrap()[0];

        // WHEN
        let new_attr = doc.replace_attribute(attr, q("attr"), "5").unwrap();

        // THEN
        assert_eq!(doc.value_of(new_attr).unwrap(), Some("5"));
        assert!(!doc.contains(attr));
        assert_eq!(doc.attributes_of(root).unwrap(), &[new_attr]);
    }

    #[test]
    fn test_in_scope_namespaces_nearest_wins() {
        // GIVEN <a xmlns:p="urn:outer"><b xmlns:p="urn:inner"/></a>
        let mut doc = DocumentImpl::new(
            DocumentId::new(1),
            "/db/a.xml",
            "/db",
            Permissions::default_for("admin"),
        );
        doc.set_document_element(
            TransientNode::element(q("a"))
                .with_ns("p", "urn:outer")
                .with_child(TransientNode::element(q("b")).with_ns("p", "urn:inner")),
        )
        .unwrap();
        let root = doc.document_element().unwrap();
        let b = doc.children_of(root).unwrap()[0];

        // THEN
        assert_eq!(doc.in_scope_namespaces(root).unwrap().resolve("p"), Some("urn:outer"));
        assert_eq!(doc.in_scope_namespaces(b).unwrap().resolve("p"), Some("urn:inner"));
    }

    #[test]
    fn test_serialize_is_independent() {
        // GIVEN
        let mut doc = sample();
        let root = doc.document_element().unwrap();

        // WHEN - serialize then mutate the source
        let copy = doc.serialize_node(root).unwrap();
        let x = doc.children_of(root).unwrap()[0];
        doc.remove_child(x).unwrap();

        // THEN - the copy is untouched
        assert_eq!(copy.element_name().unwrap().local_part(), "a");
        match &copy {
            TransientNode::Element { children, .. } => assert_eq!(children.len(), 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_defragment_preserves_content() {
        // GIVEN
        let mut doc = sample();
        let root = doc.document_element().unwrap();
        doc.append_children(root, &[TransientNode::text("body")]).unwrap();
        assert!(doc.page_splits() > 0);

        // WHEN
        doc.defragment();

        // THEN
        assert_eq!(doc.page_splits(), 0);
        assert_eq!(doc.string_value(root).unwrap(), "body");
        doc.consistency_check().unwrap();
    }

    #[test]
    fn test_consistency_check_passes_on_fresh_document() {
        sample().consistency_check().unwrap();
    }
}
