use crate::model::{AttributeValue, Element, NodeId, Path, Position};

/// Primitive document mutation.
///
/// Positions and paths are read against the document as it is right before
/// the operation is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Insert elements into a container.
    Insert {
        position: Position,
        elements: Vec<Element>,
    },
    /// Insert text into a text block.
    InsertText { position: Position, text: String },
    /// Remove `length` chars from a text block.
    RemoveText { position: Position, length: usize },
    /// Remove a range of children from a container.
    Remove {
        parent: Path,
        range: std::ops::Range<usize>,
    },
    /// Move a range of children to another container position.
    ///
    /// `target` is read before the range is taken out, so moving children
    /// `1..3` of the root to root offset `6` places them after the element
    /// that was at index 5.
    Move {
        parent: Path,
        range: std::ops::Range<usize>,
        target: Position,
    },
    Rename { path: Path, name: String },
    /// Set (`Some`) or remove (`None`) an attribute.
    SetAttribute {
        path: Path,
        key: String,
        value: Option<AttributeValue>,
    },
    /// Split a text block at a char offset; the tail becomes a new sibling
    /// with the same name and attributes.
    Split { position: Position },
    /// Merge the element at `path` into its previous sibling.
    Merge { path: Path },
}

/// What kind of operation produced a [`Change`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Remove,
    Move,
    Rename,
    Attribute { key: String },
    Split,
    Merge,
    Text,
}

/// Record of one applied operation, in terms of stable element identities.
///
/// `touched` are the elements the operation changed or introduced;
/// `neighbors` are the siblings bordering each affected range at the moment
/// the operation was applied (the removal side of a move included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub touched: Vec<NodeId>,
    pub neighbors: Vec<NodeId>,
}

impl Change {
    pub(crate) fn new(kind: ChangeKind) -> Self {
        Self {
            kind,
            touched: Vec::new(),
            neighbors: Vec::new(),
        }
    }
}
