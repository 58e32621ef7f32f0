use std::collections::{BTreeMap, BTreeSet};

use crate::lists::attributes::LIST_ATTRIBUTES;
use crate::model::document::ROOT_NAME;

/// How an element holds its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Root,
    /// Holds child elements.
    Container,
    /// Holds text.
    TextBlock,
}

/// Schema definition of one element name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDef {
    pub name: String,
    pub kind: ElementKind,
    /// Document-level block (paragraph, heading, block quote, table). Table
    /// rows and cells are structure inside a block, not blocks themselves.
    pub is_block: bool,
    pub allowed_attributes: BTreeSet<String>,
}

impl ElementDef {
    pub fn text_block(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ElementKind::TextBlock,
            is_block: true,
            allowed_attributes: BTreeSet::new(),
        }
    }

    pub fn container(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ElementKind::Container,
            is_block: true,
            allowed_attributes: BTreeSet::new(),
        }
    }

    /// Mark as inner structure rather than a document-level block.
    pub fn inner(mut self) -> Self {
        self.is_block = false;
        self
    }

    pub fn allow(mut self, key: impl Into<String>) -> Self {
        self.allowed_attributes.insert(key.into());
        self
    }
}

/// Registry of element definitions.
///
/// Unknown names are treated as text blocks that allow no attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    definitions: BTreeMap<String, ElementDef>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    /// Schema knowing only the root.
    pub fn new() -> Self {
        let root = ElementDef {
            name: ROOT_NAME.to_string(),
            kind: ElementKind::Root,
            is_block: false,
            allowed_attributes: BTreeSet::new(),
        };
        Self {
            definitions: BTreeMap::from([(root.name.clone(), root)]),
        }
    }

    /// Add or replace a definition.
    pub fn register(&mut self, definition: ElementDef) {
        self.definitions.insert(definition.name.clone(), definition);
    }

    /// Allow `keys` on every registered block.
    pub fn allow_on_blocks(&mut self, keys: &[&str]) {
        for definition in self.definitions.values_mut().filter(|d| d.is_block) {
            definition
                .allowed_attributes
                .extend(keys.iter().map(|k| k.to_string()));
        }
    }

    /// Allow `key` on an already registered element. Returns `false` when
    /// `name` is unknown.
    pub fn allow(&mut self, name: &str, key: &str) -> bool {
        match self.definitions.get_mut(name) {
            Some(definition) => {
                definition.allowed_attributes.insert(key.to_string());
                true
            }
            None => false,
        }
    }

    pub fn definition(&self, name: &str) -> Option<&ElementDef> {
        self.definitions.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn allows_attribute(&self, name: &str, key: &str) -> bool {
        self.definition(name)
            .is_some_and(|d| d.allowed_attributes.contains(key))
    }

    /// Whether elements of this name may carry the list attributes.
    pub fn is_list_capable(&self, name: &str) -> bool {
        LIST_ATTRIBUTES
            .iter()
            .all(|key| self.allows_attribute(name, key))
    }

    pub fn is_text_block(&self, name: &str) -> bool {
        self.definition(name)
            .is_none_or(|d| d.kind == ElementKind::TextBlock)
    }

    pub fn is_container(&self, name: &str) -> bool {
        self.definition(name).is_some_and(|d| {
            matches!(d.kind, ElementKind::Container | ElementKind::Root)
        })
    }
}
