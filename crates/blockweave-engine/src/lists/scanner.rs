//! Walking sibling sequences of list blocks.
//!
//! Lists are never materialised as a tree. A run is found on demand by
//! scanning siblings from a block until the first non-list block on each
//! side.

use crate::lists::attributes::{self, ListType, is_list_block};
use crate::model::{Element, Schema};

/// View of one list block inside a run, with its attributes as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ListBlock<'a> {
    /// Index among the siblings.
    pub index: usize,
    pub element: &'a Element,
    pub indent: Option<usize>,
    pub list_type: Option<ListType>,
    pub item_id: String,
}

impl<'a> ListBlock<'a> {
    fn read(siblings: &'a [Element], schema: &Schema, index: usize) -> Option<Self> {
        let element = siblings.get(index)?;
        if !is_list_block(element, schema) {
            return None;
        }
        Some(Self {
            index,
            element,
            indent: attributes::indent(element),
            list_type: attributes::list_type(element),
            item_id: attributes::item_id(element)?,
        })
    }
}

/// Index of the first block of the run containing `index`.
///
/// `index` itself must be a list block; the walk stops at the first non-list
/// sibling or the start of the container.
pub fn run_head(siblings: &[Element], schema: &Schema, index: usize) -> usize {
    scan_backward(siblings, schema, index)
        .last()
        .map_or(index, |block| block.index)
}

/// Forward scan from `index` while siblings are list blocks.
pub fn scan_run<'a>(siblings: &'a [Element], schema: &'a Schema, index: usize) -> RunIter<'a> {
    RunIter {
        siblings,
        schema,
        next: Some(index),
    }
}

/// Backward scan from `index` (inclusive) while siblings are list blocks.
pub fn scan_backward<'a>(
    siblings: &'a [Element],
    schema: &'a Schema,
    index: usize,
) -> BackwardIter<'a> {
    BackwardIter {
        siblings,
        schema,
        next: Some(index),
    }
}

/// Index range of the whole run containing `index`, or `None` when the
/// block at `index` is not a list block.
pub fn run_range(
    siblings: &[Element],
    schema: &Schema,
    index: usize,
) -> Option<std::ops::Range<usize>> {
    let element = siblings.get(index)?;
    if !is_list_block(element, schema) {
        return None;
    }
    let head = run_head(siblings, schema, index);
    let end = scan_run(siblings, schema, index).last().map_or(index, |block| block.index);
    Some(head..end + 1)
}

#[derive(Clone)]
pub struct RunIter<'a> {
    siblings: &'a [Element],
    schema: &'a Schema,
    next: Option<usize>,
}

impl<'a> Iterator for RunIter<'a> {
    type Item = ListBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let block = ListBlock::read(self.siblings, self.schema, index);
        self.next = block.as_ref().map(|_| index + 1);
        block
    }
}

#[derive(Clone)]
pub struct BackwardIter<'a> {
    siblings: &'a [Element],
    schema: &'a Schema,
    next: Option<usize>,
}

impl<'a> Iterator for BackwardIter<'a> {
    type Item = ListBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let block = ListBlock::read(self.siblings, self.schema, index);
        self.next = block.as_ref().and_then(|_| index.checked_sub(1));
        block
    }
}
