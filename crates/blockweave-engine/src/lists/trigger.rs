//! Deciding which list runs a session may have broken.

use std::collections::BTreeSet;

use crate::lists::attributes::{LIST_ATTRIBUTES, has_list_attributes, is_list_block};
use crate::lists::scanner::run_head;
use crate::model::{Change, ChangeKind, Document, Path, Schema};

/// Elements a session touched and the heads of the list runs around them.
///
/// Paths are ordered, so iterating either set visits the document in order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TouchedSet {
    pub touched: BTreeSet<Path>,
    pub heads: BTreeSet<Path>,
}

impl TouchedSet {
    /// Every element of the document, used to repair a document loaded from
    /// outside a session.
    pub fn everything(document: &Document, schema: &Schema) -> Self {
        let mut set = Self::default();
        let mut stack: Vec<Path> = vec![Vec::new()];
        while let Some(path) = stack.pop() {
            let Some(element) = document.element(&path) else {
                continue;
            };
            for index in 0..element.children.len() {
                stack.push(child_path(&path, index));
            }
            if !path.is_empty() {
                set.add_head_of(document, schema, &path);
                set.touched.insert(path);
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty() && self.touched.is_empty()
    }

    fn add_head_of(&mut self, document: &Document, schema: &Schema, path: &[usize]) {
        let Some((siblings, index)) = document.siblings(path) else {
            return;
        };
        if !is_list_block(&siblings[index], schema) {
            return;
        }
        let mut head = path.to_vec();
        if let Some(last) = head.last_mut() {
            *last = run_head(siblings, schema, index);
        }
        self.heads.insert(head);
    }
}

fn child_path(parent: &[usize], index: usize) -> Path {
    let mut path = parent.to_vec();
    path.push(index);
    path
}

fn is_list_relevant(kind: &ChangeKind) -> bool {
    match kind {
        ChangeKind::Text => false,
        ChangeKind::Attribute { key } => LIST_ATTRIBUTES.contains(&key.as_str()),
        _ => true,
    }
}

/// Classify the changes of one session against the settled document.
///
/// Returns `None` when nothing needs repairing: no list block was touched or
/// sits next to a touched element, and no touched element carries list
/// attributes it may have to lose.
pub fn classify(document: &Document, schema: &Schema, changes: &[Change]) -> Option<TouchedSet> {
    let mut set = TouchedSet::default();
    let mut seeds: BTreeSet<Path> = BTreeSet::new();

    for change in changes.iter().filter(|change| is_list_relevant(&change.kind)) {
        for path in change.touched.iter().filter_map(|id| document.path_of(*id)) {
            let Some((siblings, position)) = document.siblings(&path) else {
                continue;
            };
            let parent = &path[..path.len() - 1];
            if position > 0 {
                seeds.insert(child_path(parent, position - 1));
            }
            if position + 1 < siblings.len() {
                seeds.insert(child_path(parent, position + 1));
            }
            seeds.insert(path.clone());
            set.touched.insert(path);
        }
        seeds.extend(
            change
                .neighbors
                .iter()
                .filter_map(|id| document.path_of(*id))
                .filter(|path| !path.is_empty()),
        );
    }

    for seed in &seeds {
        set.add_head_of(document, schema, seed);
    }

    let needs_strip = set
        .touched
        .iter()
        .filter_map(|path| document.element(path))
        .any(has_list_attributes);
    if set.heads.is_empty() && !needs_strip {
        return None;
    }
    log::trace!(
        "{} touched elements, {} list runs to check",
        set.touched.len(),
        set.heads.len()
    );
    Some(set)
}
