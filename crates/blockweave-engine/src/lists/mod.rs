//! Lists as flat block sequences.
//!
//! A list is not a tree of list elements. Any block the schema allows
//! (paragraph, heading, block quote, table) becomes a list item by carrying
//! `listItemId`, `listIndent` and `listType`; consecutive sibling list blocks
//! form a run, and indents encode the nesting. Several consecutive blocks
//! sharing a `listItemId` form one item with more than one paragraph.
//!
//! Edits are free to break that encoding; [`postfixer::ListPostFixer`]
//! restores it at the end of every change session.

pub mod attributes;
pub mod commands;
pub mod identity;
pub mod invariants;
pub mod paste;
pub mod postfixer;
pub mod scanner;
pub mod trigger;

pub use attributes::{LIST_ATTRIBUTES, LIST_INDENT, LIST_ITEM_ID, LIST_TYPE, ListType};
pub use identity::{IdAllocator, IdGenerator, SequentialIds, UuidIds};
pub use postfixer::ListPostFixer;
