use std::collections::HashSet;
use std::fmt;

use crate::lists::attributes::{
    self, LIST_ATTRIBUTES, LIST_INDENT, ListType, has_list_attributes, is_list_block,
};
use crate::lists::scanner::{ListBlock, scan_run};
use crate::model::{Document, Element, Path, Schema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// List attributes on an element whose schema forbids them.
    NotListCapable,
    /// Some but not all of the three list attributes.
    PartialAttributes { missing: Vec<&'static str> },
    /// `listIndent` is not a non-negative integer.
    InvalidIndent,
    /// First block of a run is nested.
    RunStartsIndented { indent: usize },
    /// More than one level deeper than the previous block.
    IndentTooDeep { indent: usize, max: usize },
    /// Nested item whose type differs from the earlier item of its branch.
    TypeMismatch { expected: ListType, found: ListType },
    /// Block continuing an item with a different indent or type.
    ItemDisagrees { id: String },
    /// Item id used by blocks that are not contiguous.
    DuplicateItemId { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: Path,
    pub kind: ViolationKind,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: ", self.path)?;
        match &self.kind {
            ViolationKind::NotListCapable => write!(f, "element may not carry list attributes"),
            ViolationKind::PartialAttributes { missing } => {
                write!(f, "missing list attributes {}", missing.join(", "))
            }
            ViolationKind::InvalidIndent => {
                write!(f, "{LIST_INDENT} is not a non-negative integer")
            }
            ViolationKind::RunStartsIndented { indent } => {
                write!(f, "list starts at indent {indent}")
            }
            ViolationKind::IndentTooDeep { indent, max } => {
                write!(f, "indent {indent} exceeds {max}")
            }
            ViolationKind::TypeMismatch { expected, found } => {
                write!(f, "list type {found} in a {expected} list")
            }
            ViolationKind::ItemDisagrees { id } => {
                write!(f, "blocks of item {id} disagree on indent or type")
            }
            ViolationKind::DuplicateItemId { id } => write!(f, "item id {id} is used twice"),
        }
    }
}

/// Every list invariant the document breaks, in document order.
///
/// A settled document (any state a change session commits) yields nothing.
pub fn check(document: &Document, schema: &Schema) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut starts = Vec::new();
    walk(
        document.root(),
        &Vec::new(),
        schema,
        &mut violations,
        &mut starts,
    );

    starts.sort();
    let mut seen = HashSet::new();
    for (path, id) in starts {
        if !seen.insert(id.clone()) {
            violations.push(Violation {
                path,
                kind: ViolationKind::DuplicateItemId { id },
            });
        }
    }
    violations.sort_by(|a, b| a.path.cmp(&b.path));
    violations
}

/// Panics with a description of every violation found.
pub fn assert_valid(document: &Document, schema: &Schema) {
    let violations = check(document, schema);
    assert!(
        violations.is_empty(),
        "list invariants violated:\n{}",
        violations
            .iter()
            .map(|violation| violation.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn child_path(parent: &[usize], index: usize) -> Path {
    let mut path = parent.to_vec();
    path.push(index);
    path
}

fn walk(
    element: &Element,
    path: &Path,
    schema: &Schema,
    violations: &mut Vec<Violation>,
    starts: &mut Vec<(Path, String)>,
) {
    let siblings = &element.children;
    let mut index = 0;
    while index < siblings.len() {
        if is_list_block(&siblings[index], schema) {
            index = check_run(siblings, index, path, schema, violations, starts);
        } else {
            index += 1;
        }
    }
    for (index, child) in siblings.iter().enumerate() {
        let child_path = child_path(path, index);
        check_attributes(child, &child_path, schema, violations);
        walk(child, &child_path, schema, violations, starts);
    }
}

fn check_attributes(
    element: &Element,
    path: &Path,
    schema: &Schema,
    violations: &mut Vec<Violation>,
) {
    if !has_list_attributes(element) {
        return;
    }
    let mut report = |kind| {
        violations.push(Violation {
            path: path.clone(),
            kind,
        })
    };
    if !schema.is_list_capable(&element.name) {
        report(ViolationKind::NotListCapable);
        return;
    }
    let missing: Vec<&'static str> = LIST_ATTRIBUTES
        .into_iter()
        .filter(|key| !element.has_attribute(key))
        .collect();
    if !missing.is_empty() {
        report(ViolationKind::PartialAttributes { missing });
    }
    if element.has_attribute(LIST_INDENT) && attributes::indent(element).is_none() {
        report(ViolationKind::InvalidIndent);
    }
}

/// Check the run starting at `head`; returns the index after it.
fn check_run(
    siblings: &[Element],
    head: usize,
    parent: &Path,
    schema: &Schema,
    violations: &mut Vec<Violation>,
    starts: &mut Vec<(Path, String)>,
) -> usize {
    let mut previous: Option<ListBlock<'_>> = None;
    // Type of the open branch at each indent.
    let mut types: Vec<Option<ListType>> = Vec::new();
    let mut end = head;

    for block in scan_run(siblings, schema, head) {
        end = block.index + 1;
        let path = child_path(parent, block.index);
        let indent = block.indent.unwrap_or(0);
        let mut report = |kind| {
            violations.push(Violation {
                path: path.clone(),
                kind,
            })
        };

        match previous.as_ref().map(|p| p.indent.unwrap_or(0)) {
            None if indent > 0 => report(ViolationKind::RunStartsIndented { indent }),
            Some(previous_indent) if indent > previous_indent + 1 => {
                report(ViolationKind::IndentTooDeep {
                    indent,
                    max: previous_indent + 1,
                })
            }
            _ => {}
        }

        match previous.as_ref().filter(|p| p.item_id == block.item_id) {
            Some(item) => {
                if item.indent.unwrap_or(0) != indent || item.list_type != block.list_type {
                    report(ViolationKind::ItemDisagrees {
                        id: block.item_id.clone(),
                    });
                }
            }
            None => {
                starts.push((path.clone(), block.item_id.clone()));
                if indent > 0 && indent < types.len() {
                    if let (Some(expected), Some(found)) = (&types[indent], &block.list_type) {
                        if expected != found {
                            report(ViolationKind::TypeMismatch {
                                expected: expected.clone(),
                                found: found.clone(),
                            });
                        }
                    }
                }
            }
        }

        if indent < types.len() {
            types.truncate(indent + 1);
            if indent == 0 {
                types[0] = block.list_type.clone();
            }
        } else {
            types.resize(indent, None);
            types.push(block.list_type.clone());
        }
        previous = Some(block);
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::attributes::{LIST_ITEM_ID, LIST_TYPE};
    use crate::model::{ElementDef, ROOT_NAME};
    use pretty_assertions::assert_eq;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        schema.register(ElementDef::text_block("paragraph"));
        schema.register(ElementDef::container("blockQuote"));
        schema.allow_on_blocks(&LIST_ATTRIBUTES);
        schema.register(ElementDef::text_block("caption"));
        schema
    }

    fn item(id: &str, indent: i64, list_type: &str) -> Element {
        Element::block("paragraph", id)
            .with_attribute(LIST_ITEM_ID, id)
            .with_attribute(LIST_INDENT, indent)
            .with_attribute(LIST_TYPE, list_type)
    }

    fn kinds(children: Vec<Element>) -> Vec<(Path, ViolationKind)> {
        let doc = Document::from_root(Element::container(ROOT_NAME, children));
        check(&doc, &schema())
            .into_iter()
            .map(|v| (v.path, v.kind))
            .collect()
    }

    #[test]
    fn test_settled_list_has_no_violations() {
        let children = vec![
            item("a", 0, "bulleted"),
            item("b", 1, "numbered"),
            item("c", 1, "numbered"),
            item("d", 0, "numbered"),
            Element::block("paragraph", "x"),
            item("e", 0, "bulleted"),
        ];

        assert_eq!(kinds(children), vec![]);
    }

    #[test]
    fn test_indent_violations() {
        let children = vec![item("a", 1, "bulleted"), item("b", 3, "bulleted")];

        assert_eq!(
            kinds(children),
            vec![
                (vec![0], ViolationKind::RunStartsIndented { indent: 1 }),
                (vec![1], ViolationKind::IndentTooDeep { indent: 3, max: 2 }),
            ]
        );
    }

    #[test]
    fn test_nested_type_mismatch() {
        let children = vec![
            item("a", 0, "bulleted"),
            item("b", 1, "bulleted"),
            item("c", 1, "numbered"),
        ];

        assert_eq!(
            kinds(children),
            vec![(
                vec![2],
                ViolationKind::TypeMismatch {
                    expected: ListType::Bulleted,
                    found: ListType::Numbered
                }
            )]
        );
    }

    #[test]
    fn test_attribute_violations() {
        let children = vec![
            Element::block("caption", "c").with_attribute(LIST_ITEM_ID, "a"),
            Element::block("paragraph", "p").with_attribute(LIST_INDENT, 0i64),
        ];

        assert_eq!(
            kinds(children),
            vec![
                (vec![0], ViolationKind::NotListCapable),
                (
                    vec![1],
                    ViolationKind::PartialAttributes {
                        missing: vec![LIST_ITEM_ID, LIST_TYPE]
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_split_and_inconsistent_items() {
        let children = vec![
            item("a", 0, "bulleted"),
            item("a", 1, "bulleted"),
            Element::container("blockQuote", vec![item("a", 0, "bulleted")]),
        ];

        assert_eq!(
            kinds(children),
            vec![
                (vec![1], ViolationKind::ItemDisagrees { id: "a".to_string() }),
                (vec![2, 0], ViolationKind::DuplicateItemId { id: "a".to_string() }),
            ]
        );
    }
}
