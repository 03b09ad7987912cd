//! Evaluated-expression exchange types.
//!
//! The query layer hands the mutation engine already-evaluated `select` and
//! `value` expressions as sequences of items. An item is either a handle to
//! a persisted node, an in-memory transient node, or an atomic value.

use crate::node::TransientNode;
use crate::store::DocumentStore;
use xylem_core::{StoredNode, Value};

/// One evaluated item.
#[derive(Debug, Clone)]
pub enum Item {
    /// A node persisted in a document.
    Stored(StoredNode),
    /// An in-memory node not backed by storage.
    Transient(TransientNode),
    /// An atomic value.
    Atomic(Value),
}

impl Item {
    pub fn is_node(&self) -> bool {
        matches!(self, Item::Stored(_) | Item::Transient(_))
    }

    pub fn as_stored(&self) -> Option<StoredNode> {
        match self {
            Item::Stored(handle) => Some(*handle),
            _ => None,
        }
    }

    /// The item's string value. Stored nodes resolve through the store.
    pub fn string_value(&self, store: &DocumentStore) -> String {
        match self {
            Item::Stored(handle) => store
                .doc(handle.doc)
                .and_then(|doc| doc.string_value(handle.node))
                .unwrap_or_default(),
            Item::Transient(node) => node.string_value(),
            Item::Atomic(value) => value.string_value(),
        }
    }
}

/// Summary type of a sequence, in the style of a static item type.
///
/// `Empty` is deliberately not a node subtype: a node-type check on an
/// empty sequence fails, which is what routes empty selections onto the
/// soft error-trap path instead of the hard failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// No items.
    Empty,
    /// Every item is a node.
    Node,
    /// Every item is atomic.
    Atomic,
    /// Nodes and atomics mixed.
    Mixed,
}

impl ItemType {
    /// Whether this type is a subtype of node.
    pub fn is_node(self) -> bool {
        matches!(self, ItemType::Node)
    }
}

/// A sequence of evaluated items.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    items: Vec<Item>,
}

impl Sequence {
    /// The empty sequence.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn push(&mut self, item: Item) {
        self.items.push(item);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&Item> {
        self.items.first()
    }

    /// The common item type across all items.
    pub fn item_type(&self) -> ItemType {
        if self.items.is_empty() {
            return ItemType::Empty;
        }
        let nodes = self.items.iter().filter(|i| i.is_node()).count();
        if nodes == self.items.len() {
            ItemType::Node
        } else if nodes == 0 {
            ItemType::Atomic
        } else {
            ItemType::Mixed
        }
    }

    /// The string value of the whole sequence: item string values
    /// concatenated in order, with no separator.
    pub fn string_value(&self, store: &DocumentStore) -> String {
        let mut out = String::new();
        for item in &self.items {
            out.push_str(&item.string_value(store));
        }
        out
    }
}

impl From<Vec<Item>> for Sequence {
    fn from(items: Vec<Item>) -> Self {
        Self { items }
    }
}

impl FromIterator<Item> for Sequence {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Sequence {
    type Item = Item;
    type IntoIter = std::vec::IntoIter<Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xylem_core::QName;

    #[test]
    fn test_empty_sequence_is_not_node_typed() {
        // The node check on an empty selection must fail, routing it
        // onto the trap path.
        assert_eq!(Sequence::empty().item_type(), ItemType::Empty);
        assert!(!Sequence::empty().item_type().is_node());
    }

    #[test]
    fn test_item_type_classification() {
        let node = Item::Transient(TransientNode::text("t"));
        let atomic = Item::Atomic(Value::from("v"));

        assert_eq!(Sequence::from(vec![node.clone()]).item_type(), ItemType::Node);
        assert_eq!(Sequence::from(vec![atomic.clone()]).item_type(), ItemType::Atomic);
        assert_eq!(Sequence::from(vec![node, atomic]).item_type(), ItemType::Mixed);
    }

    #[test]
    fn test_string_value_single_concatenation() {
        // GIVEN
        let store = DocumentStore::new();
        let seq = Sequence::from(vec![
            Item::Atomic(Value::from("a")),
            Item::Atomic(Value::Int(1)),
            Item::Transient(
                TransientNode::element(QName::local("e").unwrap())
                    .with_child(TransientNode::text("b")),
            ),
        ]);

        // THEN - no separators between item string values
        assert_eq!(seq.string_value(&store), "a1b");
    }
}
