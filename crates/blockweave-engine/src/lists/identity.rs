//! List item identities.
//!
//! A `listItemId` only has to be unique among the attached list items of one
//! document. Generators produce candidates; [`IdAllocator`] guarantees the
//! document-level uniqueness by skipping candidates that are already in use.

use std::collections::HashSet;

use uuid::Uuid;

use crate::model::Document;

/// Source of new list item ids.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Random ids, the default for real documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        // Leading letter keeps the id a valid identifier in markup.
        format!("e{}", Uuid::new_v4().simple())
    }
}

/// Deterministic ids: `prefix` followed by a zero-padded counter
/// (`a00`, `a01`, ...).
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    counter: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("a")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}{:02}", self.prefix, self.counter);
        self.counter += 1;
        id
    }
}

/// Hands out ids that are not used anywhere in a document.
///
/// Candidates are checked against the document's id index one at a time;
/// ids handed out or reserved during the allocator's lifetime count as used.
pub struct IdAllocator<'a> {
    ids: &'a mut dyn IdGenerator,
    document: &'a Document,
    taken: HashSet<String>,
}

impl<'a> IdAllocator<'a> {
    pub fn new(ids: &'a mut dyn IdGenerator, document: &'a Document) -> Self {
        Self {
            ids,
            document,
            taken: HashSet::new(),
        }
    }

    pub fn is_taken(&self, id: &str) -> bool {
        self.taken.contains(id) || self.document.item_id_count(id) > 0
    }

    /// Mark an id as used without generating it.
    pub fn reserve(&mut self, id: impl Into<String>) {
        self.taken.insert(id.into());
    }

    pub fn fresh(&mut self) -> String {
        loop {
            let id = self.ids.next_id();
            if !self.is_taken(&id) {
                self.taken.insert(id.clone());
                return id;
            }
            log::trace!("skipping list item id {id}, already in use");
        }
    }
}
