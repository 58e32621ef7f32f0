//! Editing commands over list items.
//!
//! Commands only set the attributes they mean to change; anything they leave
//! inconsistent (a following item now too deep, a branch with mixed types) is
//! settled by the post-fixer when the session ends.

use crate::lists::attributes::{
    self, LIST_ATTRIBUTES, LIST_INDENT, LIST_ITEM_ID, LIST_TYPE, ListType, is_list_block,
};
use crate::lists::scanner::scan_run;
use crate::model::{Element, ModelError, Path, Position, Schema, Writer};

/// Sibling indices of the blocks forming the item at `index`, plus the
/// blocks nested under it.
struct ItemSpan {
    parent: Path,
    item: std::ops::Range<usize>,
    end: usize,
    indent: usize,
}

impl ItemSpan {
    fn find(siblings: &[Element], schema: &Schema, path: &[usize]) -> Option<Self> {
        let (&index, parent) = path.split_last()?;
        let element = siblings.get(index)?;
        if !is_list_block(element, schema) {
            return None;
        }
        let id = attributes::item_id(element)?;
        let indent = attributes::indent(element).unwrap_or(0);

        let mut start = index;
        while start > 0 {
            let previous = &siblings[start - 1];
            if !is_list_block(previous, schema)
                || attributes::item_id(previous).as_deref() != Some(id.as_str())
            {
                break;
            }
            start -= 1;
        }
        let item_end = scan_run(siblings, schema, index)
            .take_while(|block| block.item_id == id)
            .last()
            .map_or(index + 1, |block| block.index + 1);
        let end = scan_run(siblings, schema, item_end)
            .take_while(|block| block.indent.unwrap_or(0) > indent)
            .last()
            .map_or(item_end, |block| block.index + 1);

        Some(Self {
            parent: parent.to_vec(),
            item: start..item_end,
            end,
            indent,
        })
    }

    fn paths(&self, range: std::ops::Range<usize>) -> impl Iterator<Item = Path> + '_ {
        range.map(|index| {
            let mut path = self.parent.clone();
            path.push(index);
            path
        })
    }
}

fn span_at(writer: &Writer<'_>, path: &[usize]) -> Result<Option<ItemSpan>, ModelError> {
    let Some((_, parent)) = path.split_last() else {
        return Ok(None);
    };
    let siblings = &writer.element(parent)?.children;
    Ok(ItemSpan::find(siblings, writer.schema(), path))
}

fn shift_indent(writer: &mut Writer<'_>, path: &Path, delta: i64) -> Result<(), ModelError> {
    let indent = attributes::indent(writer.element(path)?).unwrap_or(0) as i64;
    writer.set_attribute(path, LIST_INDENT, indent.saturating_add(delta).max(0))
}

/// Indent the item at `path` and everything nested under it by one level.
///
/// Returns `false` when the item has no previous sibling item to nest
/// under.
pub fn indent(writer: &mut Writer<'_>, path: &[usize]) -> Result<bool, ModelError> {
    let Some(span) = span_at(writer, path)? else {
        return Ok(false);
    };
    let parent = writer.element(&span.parent)?;
    let has_parent_candidate = span.item.start > 0
        && parent
            .children
            .get(span.item.start - 1)
            .is_some_and(|previous| {
                is_list_block(previous, writer.schema())
                    && attributes::indent(previous).unwrap_or(0) >= span.indent
            });
    if !has_parent_candidate {
        return Ok(false);
    }
    for block in span.paths(span.item.start..span.end).collect::<Vec<_>>() {
        shift_indent(writer, &block, 1)?;
    }
    Ok(true)
}

/// Outdent the item at `path` and everything nested under it by one level.
/// A top-level item stops being a list item.
pub fn outdent(writer: &mut Writer<'_>, path: &[usize]) -> Result<bool, ModelError> {
    let Some(span) = span_at(writer, path)? else {
        return Ok(false);
    };
    if span.indent == 0 {
        for block in span.paths(span.item.clone()).collect::<Vec<_>>() {
            for key in LIST_ATTRIBUTES {
                writer.remove_attribute(&block, key)?;
            }
        }
        for block in span.paths(span.item.end..span.end).collect::<Vec<_>>() {
            shift_indent(writer, &block, -1)?;
        }
        return Ok(true);
    }
    for block in span.paths(span.item.start..span.end).collect::<Vec<_>>() {
        shift_indent(writer, &block, -1)?;
    }
    Ok(true)
}

/// Change the type of the list the item at `path` belongs to: every item at
/// the same indent in the same branch.
pub fn set_list_type(
    writer: &mut Writer<'_>,
    path: &[usize],
    list_type: ListType,
) -> Result<bool, ModelError> {
    let Some(span) = span_at(writer, path)? else {
        return Ok(false);
    };
    let parent = writer.element(&span.parent)?;
    let schema = writer.schema();
    let in_branch = |element: &Element| {
        is_list_block(element, schema) && attributes::indent(element).unwrap_or(0) >= span.indent
    };

    let mut start = span.item.start;
    while start > 0 && in_branch(&parent.children[start - 1]) {
        start -= 1;
    }
    let end = scan_run(&parent.children, schema, span.item.start)
        .take_while(|block| block.indent.unwrap_or(0) >= span.indent)
        .last()
        .map_or(span.item.end, |block| block.index + 1);

    let targets: Vec<Path> = span
        .paths(start..end)
        .zip(start..end)
        .filter(|(_, index)| {
            attributes::indent(&parent.children[*index]).unwrap_or(0) == span.indent
        })
        .map(|(path, _)| path)
        .collect();
    for target in targets {
        writer.set_attribute(&target, LIST_TYPE, &list_type)?;
    }
    Ok(true)
}

/// Turn a plain block into a list item with a fresh id.
///
/// The item joins the list right before it at that list's last indent, or
/// starts a new list at indent 0.
pub fn make_list_item(
    writer: &mut Writer<'_>,
    path: &[usize],
    list_type: ListType,
) -> Result<bool, ModelError> {
    let element = writer.element(path)?;
    if !writer.schema().is_list_capable(&element.name) || is_list_block(element, writer.schema()) {
        return Ok(false);
    }
    let indent = match path.split_last() {
        Some((&index, parent)) if index > 0 => {
            let previous = &writer.element(parent)?.children[index - 1];
            if is_list_block(previous, writer.schema()) {
                attributes::indent(previous).unwrap_or(0)
            } else {
                0
            }
        }
        _ => 0,
    };
    let id = writer.fresh_id();
    writer.set_attribute(path, LIST_ITEM_ID, id)?;
    writer.set_attribute(path, LIST_INDENT, indent)?;
    writer.set_attribute(path, LIST_TYPE, &list_type)?;
    Ok(true)
}

/// Split a list block at a text position; the tail becomes a new item at the
/// same indent. Returns the path of the new block.
pub fn split_item(writer: &mut Writer<'_>, position: Position) -> Result<Path, ModelError> {
    let is_item = is_list_block(writer.element(&position.parent)?, writer.schema());
    let tail = writer.split(position)?;
    if is_item {
        let id = writer.fresh_id();
        writer.set_attribute(&tail, LIST_ITEM_ID, id)?;
    }
    Ok(tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::identity::SequentialIds;
    use crate::lists::postfixer::ListPostFixer;
    use crate::model::{Document, ElementDef, Model, ROOT_NAME};
    use pretty_assertions::assert_eq;

    fn model(items: &[(&str, i64, &str)]) -> Model {
        let mut schema = Schema::new();
        schema.register(ElementDef::text_block("paragraph"));
        schema.allow_on_blocks(&LIST_ATTRIBUTES);
        let mut model = Model::new(schema).with_ids(Box::new(SequentialIds::new("n")));
        model.add_stage(Box::new(ListPostFixer::default()));
        model.load(Document::from_root(Element::container(
            ROOT_NAME,
            items
                .iter()
                .map(|(id, indent, list_type)| {
                    if *indent < 0 {
                        return Element::block("paragraph", *id);
                    }
                    Element::block("paragraph", *id)
                        .with_attribute(LIST_ITEM_ID, *id)
                        .with_attribute(LIST_INDENT, *indent)
                        .with_attribute(LIST_TYPE, *list_type)
                })
                .collect(),
        )));
        model
    }

    fn state(model: &Model) -> Vec<Row> {
        model
            .document()
            .root()
            .children
            .iter()
            .map(|e| {
                let list_type = attributes::list_type(e).map(|t| t.to_string());
                (e.text.clone(), attributes::indent(e), list_type)
            })
            .collect()
    }

    type Row = (String, Option<usize>, Option<String>);

    fn row(text: &str, indent: Option<usize>, list_type: Option<&str>) -> Row {
        (text.to_string(), indent, list_type.map(str::to_string))
    }

    #[test]
    fn test_indent_moves_nested_items_along() {
        let mut model = model(&[
            ("a", 0, "bulleted"),
            ("b", 0, "bulleted"),
            ("c", 1, "bulleted"),
            ("d", 0, "bulleted"),
        ]);

        let done = model.change(|writer| indent(writer, &[1])).unwrap();

        assert!(done);
        assert_eq!(
            state(&model),
            vec![
                row("a", Some(0), Some("bulleted")),
                row("b", Some(1), Some("bulleted")),
                row("c", Some(2), Some("bulleted")),
                row("d", Some(0), Some("bulleted")),
            ]
        );
    }

    #[test]
    fn test_first_item_cannot_be_indented() {
        let mut model = model(&[("a", 0, "bulleted"), ("b", 1, "bulleted")]);

        assert!(!model.change(|writer| indent(writer, &[0])).unwrap());
        assert!(model.batches().is_empty());
    }

    #[test]
    fn test_indent_saturates_at_deepest_indent() {
        let mut model = model(&[("a", i64::MAX, "bulleted"), ("b", i64::MAX, "bulleted")]);

        let done = model.change(|writer| indent(writer, &[1])).unwrap();

        assert!(done);
        assert_eq!(
            state(&model),
            vec![
                row("a", Some(0), Some("bulleted")),
                row("b", Some(0), Some("bulleted")),
            ]
        );
    }

    #[test]
    fn test_outdent_top_level_item_demotes_it() {
        let mut model = model(&[
            ("a", 0, "bulleted"),
            ("b", 1, "bulleted"),
            ("c", 2, "bulleted"),
        ]);

        model.change(|writer| outdent(writer, &[0])).unwrap();

        assert_eq!(
            state(&model),
            vec![
                row("a", None, None),
                row("b", Some(0), Some("bulleted")),
                row("c", Some(1), Some("bulleted")),
            ]
        );
        let first = &model.document().root().children[0];
        assert!(!first.has_attribute(LIST_ITEM_ID));
    }

    #[test]
    fn test_set_list_type_changes_one_branch() {
        let mut model = model(&[
            ("a", 0, "bulleted"),
            ("b", 1, "bulleted"),
            ("c", 2, "bulleted"),
            ("d", 1, "bulleted"),
            ("e", 0, "bulleted"),
            ("f", 1, "bulleted"),
        ]);

        model
            .change(|writer| set_list_type(writer, &[3], ListType::Numbered))
            .unwrap();

        let types: Vec<_> = state(&model)
            .into_iter()
            .map(|(_, _, t)| t.unwrap())
            .collect();
        assert_eq!(
            types,
            vec!["bulleted", "numbered", "bulleted", "numbered", "bulleted", "bulleted"]
        );
    }

    #[test]
    fn test_make_list_item_joins_previous_list() {
        let mut model = model(&[("a", 0, "bulleted"), ("b", 1, "bulleted"), ("p", -1, "")]);

        model
            .change(|writer| make_list_item(writer, &[2], ListType::Bulleted))
            .unwrap();

        let p = &model.document().root().children[2];
        assert_eq!(attributes::indent(p), Some(1));
        assert_eq!(attributes::item_id(p).as_deref(), Some("n00"));
    }

    #[test]
    fn test_split_item_creates_new_item() {
        let mut model = model(&[("ab", 0, "numbered")]);

        let tail = model
            .change(|writer| split_item(writer, Position::new(vec![0], 1)))
            .unwrap();

        let root = &model.document().root().children;
        assert_eq!(tail, vec![1]);
        assert_eq!(root[1].text, "b");
        assert_eq!(attributes::item_id(&root[1]).as_deref(), Some("n00"));
        assert_eq!(attributes::list_type(&root[1]), Some(ListType::Numbered));
    }
}
