//! The three list attributes and how they are read off an element.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{AttributeValue, Element, Schema};

pub const LIST_ITEM_ID: &str = "listItemId";
pub const LIST_INDENT: &str = "listIndent";
pub const LIST_TYPE: &str = "listType";

pub const LIST_ATTRIBUTES: [&str; 3] = [LIST_ITEM_ID, LIST_INDENT, LIST_TYPE];

/// Kind of list an item belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ListType {
    #[default]
    Bulleted,
    Numbered,
    /// Any other type registered by an extension (`todo`, `checklist`...).
    Custom(String),
}

impl ListType {
    pub fn as_str(&self) -> &str {
        match self {
            ListType::Bulleted => "bulleted",
            ListType::Numbered => "numbered",
            ListType::Custom(name) => name,
        }
    }
}

impl FromStr for ListType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bulleted" => ListType::Bulleted,
            "numbered" => ListType::Numbered,
            other => ListType::Custom(other.to_string()),
        })
    }
}

impl From<String> for ListType {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(list_type) => list_type,
            Err(never) => match never {},
        }
    }
}

impl From<ListType> for String {
    fn from(value: ListType) -> Self {
        value.as_str().to_string()
    }
}

impl From<ListType> for AttributeValue {
    fn from(value: ListType) -> Self {
        AttributeValue::Str(value.into())
    }
}

impl From<&ListType> for AttributeValue {
    fn from(value: &ListType) -> Self {
        AttributeValue::Str(value.as_str().to_string())
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `element` is a list block: its schema allows the list attributes
/// and it carries a `listItemId`.
pub fn is_list_block(element: &Element, schema: &Schema) -> bool {
    element.has_attribute(LIST_ITEM_ID) && schema.is_list_capable(&element.name)
}

/// Whether `element` carries any of the list attributes.
pub fn has_list_attributes(element: &Element) -> bool {
    LIST_ATTRIBUTES.iter().any(|key| element.has_attribute(key))
}

pub fn item_id(element: &Element) -> Option<String> {
    element.attribute(LIST_ITEM_ID).map(|id| id.to_string())
}

/// Stored indent. `None` when missing, negative or not a number.
pub fn indent(element: &Element) -> Option<usize> {
    element
        .attribute(LIST_INDENT)
        .and_then(AttributeValue::as_int)
        .and_then(|n| usize::try_from(n).ok())
}

pub fn list_type(element: &Element) -> Option<ListType> {
    element
        .attribute(LIST_TYPE)
        .map(|value| value.to_string().into())
}
