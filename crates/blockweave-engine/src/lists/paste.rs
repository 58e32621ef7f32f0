//! Normalising list content before it is inserted.
//!
//! Pasted list blocks carry indents relative to the clipboard, not to the
//! document, and ids that may be missing or already in use. The fragment is
//! adjusted here; final clamping is left to the post-fixer.

use std::collections::HashMap;

use crate::lists::attributes::{
    self, LIST_INDENT, LIST_ITEM_ID, has_list_attributes, is_list_block,
};
use crate::lists::identity::{IdAllocator, IdGenerator};
use crate::model::{AttributeValue, Document, Fragment, Position, Schema};

/// Give the fragment's list blocks usable ids and indents for insertion at
/// `at`.
///
/// - Blocks with list attributes but no id get a fresh id each.
/// - Ids already present in the document are replaced; blocks that shared a
///   provisional id share the replacement, so multi-block items survive.
/// - The leading run of list blocks is shifted so its first block sits at the
///   indent of the list item at the insertion point, or at 0 when there is
///   none. Shifting stops at the first non-list block.
pub fn prepare_fragment(
    fragment: &mut Fragment,
    document: &Document,
    schema: &Schema,
    at: &Position,
    ids: &mut dyn IdGenerator,
) {
    if fragment.is_empty() {
        return;
    }
    assign_ids(fragment, document, schema, ids);

    let Some(first_indent) = fragment
        .blocks
        .first()
        .filter(|block| is_list_block(block, schema))
        .map(|block| attributes::indent(block).unwrap_or(0))
    else {
        return;
    };
    let target = reference_indent(document, schema, at).unwrap_or(0);
    let shift = (target as i64).saturating_sub(first_indent as i64);
    log::trace!("pasted list lands at indent {target}, shifting by {shift}");

    for block in fragment
        .blocks
        .iter_mut()
        .take_while(|block| is_list_block(block, schema))
    {
        let indent = attributes::indent(block).unwrap_or(0) as i64;
        let shifted = indent.saturating_add(shift).max(0);
        block
            .attributes
            .insert(LIST_INDENT.to_string(), AttributeValue::Int(shifted));
    }
}

fn assign_ids(
    fragment: &mut Fragment,
    document: &Document,
    schema: &Schema,
    ids: &mut dyn IdGenerator,
) {
    let mut ids = IdAllocator::new(ids, document);
    for block in &fragment.blocks {
        if let Some(id) = attributes::item_id(block) {
            ids.reserve(id);
        }
    }

    let mut replaced: HashMap<String, String> = HashMap::new();
    for block in fragment
        .blocks
        .iter_mut()
        .filter(|block| {
            schema.is_list_capable(&block.name) && has_list_attributes(block)
        })
    {
        let id = match attributes::item_id(block) {
            None => ids.fresh(),
            Some(id) if document.item_id_count(&id) > 0 => {
                replaced.entry(id).or_insert_with(|| ids.fresh()).clone()
            }
            Some(_) => continue,
        };
        block.attributes.insert(LIST_ITEM_ID.to_string(), id.into());
    }
}

/// Indent of the list item content inserted at `at` should line up with.
fn reference_indent(document: &Document, schema: &Schema, at: &Position) -> Option<usize> {
    let host = document.element(&at.parent)?;
    if schema.is_text_block(&host.name) {
        return is_list_block(host, schema).then(|| attributes::indent(host).unwrap_or(0));
    }
    let before = host.children.get(at.offset.checked_sub(1)?)?;
    is_list_block(before, schema).then(|| attributes::indent(before).unwrap_or(0))
}
