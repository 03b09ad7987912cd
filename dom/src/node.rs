//! Node representations.
//!
//! Persisted nodes live in a per-document arena as `NodeRecord`s addressed
//! by stable `NodeId`s. Content that is about to be inserted travels as
//! `TransientNode` value trees: fully owned, never aliasing any arena, so a
//! structural insert can never point back into the tree it is mutating.

use xylem_core::{NodeId, QName};

/// The kind and payload of an arena node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The document node itself. Exactly one per arena, always the root.
    Document,
    /// An element with its name and the namespace declarations it carries.
    Element {
        name: QName,
        /// prefix → URI pairs declared on this element. The empty string
        /// prefix denotes the default namespace.
        ns_decls: Vec<(String, String)>,
    },
    /// An attribute attached to an element.
    Attribute { name: QName, value: String },
    /// A text node.
    Text { data: String },
    /// A comment.
    Comment { data: String },
    /// A processing instruction.
    ProcessingInstruction { target: String, data: String },
}

impl NodeKind {
    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element { .. })
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, NodeKind::Attribute { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(self, NodeKind::Text { .. })
    }

    pub fn is_document(&self) -> bool {
        matches!(self, NodeKind::Document)
    }

    /// Short kind name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Element { .. } => "element",
            NodeKind::Attribute { .. } => "attribute",
            NodeKind::Text { .. } => "text",
            NodeKind::Comment { .. } => "comment",
            NodeKind::ProcessingInstruction { .. } => "processing-instruction",
        }
    }
}

/// One persisted node in a document arena.
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    /// Child nodes in document order. Empty for non-container kinds.
    pub children: Vec<NodeId>,
    /// Attribute nodes. Only elements carry attributes.
    pub attributes: Vec<NodeId>,
    pub kind: NodeKind,
}

impl NodeRecord {
    pub fn new(id: NodeId, parent: Option<NodeId>, kind: NodeKind) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            attributes: Vec::new(),
            kind,
        }
    }
}

/// An attribute of a transient element.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientAttr {
    pub name: QName,
    pub value: String,
}

impl TransientAttr {
    pub fn new(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// An independent, fully owned node tree.
///
/// This is the only form content may take on its way into persisted
/// storage; deep copy produces these from any source.
#[derive(Debug, Clone, PartialEq)]
pub enum TransientNode {
    Element {
        name: QName,
        ns_decls: Vec<(String, String)>,
        attributes: Vec<TransientAttr>,
        children: Vec<TransientNode>,
    },
    Attribute(TransientAttr),
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

impl TransientNode {
    /// Create an empty element.
    pub fn element(name: QName) -> Self {
        Self::Element {
            name,
            ns_decls: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a text node.
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text(data.into())
    }

    /// Add a child (elements only; no-op otherwise).
    pub fn with_child(mut self, child: TransientNode) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    /// Add an attribute (elements only; no-op otherwise).
    pub fn with_attr(mut self, name: QName, value: impl Into<String>) -> Self {
        if let Self::Element { attributes, .. } = &mut self {
            attributes.push(TransientAttr::new(name, value));
        }
        self
    }

    /// Add a namespace declaration (elements only; no-op otherwise).
    pub fn with_ns(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        if let Self::Element { ns_decls, .. } = &mut self {
            ns_decls.push((prefix.into(), uri.into()));
        }
        self
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, Self::Attribute(_))
    }

    /// Element name, if this is an element.
    pub fn element_name(&self) -> Option<&QName> {
        match self {
            Self::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The XPath string value: concatenated text descendants, or the
    /// node's own data.
    pub fn string_value(&self) -> String {
        match self {
            Self::Element { children, .. } => {
                let mut out = String::new();
                for child in children {
                    out.push_str(&child.string_value());
                }
                out
            }
            Self::Attribute(attr) => attr.value.clone(),
            Self::Text(data) => data.clone(),
            Self::Comment(data) => data.clone(),
            Self::ProcessingInstruction { data, .. } => data.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(local: &str) -> QName {
        QName::local(local).unwrap()
    }

    #[test]
    fn test_transient_builder() {
        // GIVEN / WHEN
        let tree = TransientNode::element(q("a"))
            .with_attr(q("id"), "1")
            .with_child(TransientNode::element(q("b")).with_child(TransientNode::text("hi")));

        // THEN
        assert!(tree.is_element());
        assert_eq!(tree.string_value(), "hi");
        match &tree {
            TransientNode::Element {
                attributes,
                children,
                ..
            } => {
                assert_eq!(attributes.len(), 1);
                assert_eq!(children.len(), 1);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_string_value_concatenates_descendants() {
        let tree = TransientNode::element(q("a"))
            .with_child(TransientNode::text("one"))
            .with_child(TransientNode::element(q("b")).with_child(TransientNode::text("two")));
        assert_eq!(tree.string_value(), "onetwo");
    }
}
