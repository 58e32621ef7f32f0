use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Document-local identity of an element.
///
/// Assigned when an element is attached to a [`Document`](crate::model::Document)
/// and kept across moves, renames and attribute changes. Detached elements
/// (fragments, freshly built trees) carry [`NodeId::DETACHED`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    pub const DETACHED: NodeId = NodeId(0);

    pub fn is_detached(self) -> bool {
        self == Self::DETACHED
    }
}

/// Value of an element attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Bool(bool),
    Str(String),
}

impl AttributeValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of the value; numeric strings are accepted.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(n) => Some(*n),
            AttributeValue::Str(s) => s.parse().ok(),
            AttributeValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Int(n) => write!(f, "{n}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Str(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Str(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        AttributeValue::Int(value as i64)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// A node of the document tree.
///
/// Containers (the root, block quotes, tables) hold child elements; text
/// blocks (paragraphs, headings) hold their text directly. Which of the two
/// an element name is decided by the [`Schema`](crate::model::Schema); an
/// element never uses both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(skip)]
    pub(crate) id: NodeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::DETACHED,
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// Text block with the given content.
    pub fn block(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::new(name)
        }
    }

    /// Container holding the given children.
    pub fn container(name: impl Into<String>, children: Vec<Element>) -> Self {
        Self {
            children,
            ..Self::new(name)
        }
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Length in the unit positions inside this element use: chars for text
    /// blocks, children for containers.
    pub fn max_offset(&self) -> usize {
        if self.children.is_empty() {
            self.text.chars().count()
        } else {
            self.children.len()
        }
    }

    /// Pre-order walk over this element and all descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

/// Byte index of the `char_offset`-th character, or `None` past the end.
pub(crate) fn byte_index(text: &str, char_offset: usize) -> Option<usize> {
    if char_offset == 0 {
        return Some(0);
    }
    match text.char_indices().nth(char_offset) {
        Some((index, _)) => Some(index),
        None if text.chars().count() == char_offset => Some(text.len()),
        None => None,
    }
}
