use std::collections::HashMap;

use crate::lists::attributes::LIST_ITEM_ID;
use crate::model::element::byte_index;
use crate::model::position::path_after_removal;
use crate::model::{
    AttributeValue, Change, ChangeKind, Element, ModelError, NodeId, Operation, Path, Position,
};

/// Name of the implicit root container.
pub const ROOT_NAME: &str = "$root";

/// The document tree.
///
/// Owns the root container and hands out [`NodeId`]s to every element it
/// attaches. Mutation goes through [`Document::apply`], which reports what it
/// touched as a [`Change`]; callers normally do not call it directly but use a
/// [`Writer`](crate::model::Writer) inside [`Model::change`](crate::model::Model::change).
///
/// Two indexes are kept up to date by every operation: the parent of each
/// attached element, so an id resolves to its path without a tree walk, and
/// the number of elements carrying each `listItemId`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
    next_id: u64,
    parents: HashMap<NodeId, NodeId>,
    item_ids: HashMap<String, usize>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::from_root(Element::new(ROOT_NAME))
    }

    /// Adopt a detached tree as the document content.
    pub fn from_root(mut root: Element) -> Self {
        root.id = NodeId(1);
        let mut document = Self {
            root: Element::new(ROOT_NAME),
            next_id: 2,
            parents: HashMap::new(),
            item_ids: HashMap::new(),
        };
        for child in &mut root.children {
            document.attach(child, root.id);
        }
        document.root = root;
        document
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Element at `path`, the root for an empty path.
    pub fn element(&self, path: &[usize]) -> Option<&Element> {
        let mut element = &self.root;
        for &index in path {
            element = element.children.get(index)?;
        }
        Some(element)
    }

    fn element_mut(&mut self, path: &[usize]) -> Result<&mut Element, ModelError> {
        let mut element = &mut self.root;
        for &index in path {
            element = element
                .children
                .get_mut(index)
                .ok_or_else(|| ModelError::InvalidPath(path.to_vec()))?;
        }
        Ok(element)
    }

    /// Siblings of the element at `path` plus its index among them.
    pub fn siblings(&self, path: &[usize]) -> Option<(&[Element], usize)> {
        let (index, parent) = path.split_last()?;
        let parent = self.element(parent)?;
        Some((&parent.children, *index))
    }

    /// Current path of an attached element, `None` once it was removed.
    pub fn path_of(&self, id: NodeId) -> Option<Path> {
        let mut ancestry = vec![id];
        let mut current = id;
        while current != self.root.id {
            current = *self.parents.get(&current)?;
            ancestry.push(current);
        }

        let mut path = Vec::with_capacity(ancestry.len() - 1);
        let mut element = &self.root;
        for &step in ancestry.iter().rev().skip(1) {
            let index = element.children.iter().position(|child| child.id == step)?;
            path.push(index);
            element = &element.children[index];
        }
        Some(path)
    }

    /// Number of attached elements whose `listItemId` is `id`.
    pub fn item_id_count(&self, id: &str) -> usize {
        self.item_ids.get(id).copied().unwrap_or(0)
    }

    fn attach(&mut self, element: &mut Element, parent: NodeId) {
        element.id = NodeId(self.next_id);
        self.next_id += 1;
        self.parents.insert(element.id, parent);
        self.track_item_id(element.attribute(LIST_ITEM_ID), true);
        for child in &mut element.children {
            self.attach(child, element.id);
        }
    }

    /// Drop a removed element and its descendants from the indexes.
    fn detach(&mut self, element: &Element) {
        for descendant in element.descendants() {
            self.parents.remove(&descendant.id);
            self.track_item_id(descendant.attribute(LIST_ITEM_ID), false);
        }
    }

    fn track_item_id(&mut self, value: Option<&AttributeValue>, added: bool) {
        let Some(value) = value else {
            return;
        };
        let id = value.to_string();
        if added {
            *self.item_ids.entry(id).or_default() += 1;
        } else if let Some(count) = self.item_ids.get_mut(&id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.item_ids.remove(&id);
            }
        }
    }

    /// Apply one primitive operation.
    pub fn apply(&mut self, operation: &Operation) -> Result<Change, ModelError> {
        match operation {
            Operation::Insert { position, elements } => {
                let mut change = Change::new(ChangeKind::Insert);
                self.insert_elements(position, elements.clone(), true, &mut change)?;
                Ok(change)
            }
            Operation::InsertText { position, text } => {
                let block = self.text_block_mut(&position.parent)?;
                let at = byte_index(&block.text, position.offset).ok_or_else(|| {
                    ModelError::OffsetOutOfBounds {
                        path: position.parent.clone(),
                        offset: position.offset,
                        max: block.text.chars().count(),
                    }
                })?;
                block.text.insert_str(at, text);
                let mut change = Change::new(ChangeKind::Text);
                change.touched.push(block.id);
                Ok(change)
            }
            Operation::RemoveText { position, length } => {
                let block = self.text_block_mut(&position.parent)?;
                let max = block.text.chars().count();
                let out_of_bounds = || ModelError::OffsetOutOfBounds {
                    path: position.parent.clone(),
                    offset: position.offset + length,
                    max,
                };
                let start = byte_index(&block.text, position.offset).ok_or_else(out_of_bounds)?;
                let end = byte_index(&block.text, position.offset + length)
                    .ok_or_else(out_of_bounds)?;
                block.text.replace_range(start..end, "");
                let mut change = Change::new(ChangeKind::Text);
                change.touched.push(block.id);
                Ok(change)
            }
            Operation::Remove { parent, range } => {
                let mut change = Change::new(ChangeKind::Remove);
                for removed in self.remove_children(parent, range.clone(), &mut change)? {
                    self.detach(&removed);
                }
                Ok(change)
            }
            Operation::Move {
                parent,
                range,
                target,
            } => self.move_children(parent, range.clone(), target),
            Operation::Rename { path, name } => {
                if path.is_empty() {
                    return Err(ModelError::RootOperation("renamed"));
                }
                let element = self.element_mut(path)?;
                element.name = name.clone();
                let mut change = Change::new(ChangeKind::Rename);
                change.touched.push(element.id);
                Ok(change)
            }
            Operation::SetAttribute { path, key, value } => {
                let element = self.element_mut(path)?;
                let previous = match value {
                    Some(value) => element.attributes.insert(key.clone(), value.clone()),
                    None => element.attributes.remove(key),
                };
                let mut change = Change::new(ChangeKind::Attribute { key: key.clone() });
                change.touched.push(element.id);
                if key == LIST_ITEM_ID {
                    self.track_item_id(previous.as_ref(), false);
                    self.track_item_id(value.as_ref(), true);
                }
                Ok(change)
            }
            Operation::Split { position } => self.split(position),
            Operation::Merge { path } => self.merge(path),
        }
    }

    fn text_block_mut(&mut self, path: &[usize]) -> Result<&mut Element, ModelError> {
        let element = self.element_mut(path)?;
        if !element.children.is_empty() {
            return Err(ModelError::NotATextBlock {
                path: path.to_vec(),
                name: element.name.clone(),
            });
        }
        Ok(element)
    }

    fn container_mut(&mut self, path: &[usize]) -> Result<&mut Element, ModelError> {
        let element = self.element_mut(path)?;
        if !element.text.is_empty() {
            return Err(ModelError::NotAContainer {
                path: path.to_vec(),
                name: element.name.clone(),
            });
        }
        Ok(element)
    }

    /// Insert `elements` at `position`. New content (`fresh`) is given ids;
    /// moved elements keep theirs and only change parent.
    fn insert_elements(
        &mut self,
        position: &Position,
        mut elements: Vec<Element>,
        fresh: bool,
        change: &mut Change,
    ) -> Result<(), ModelError> {
        let container = self.container_mut(&position.parent)?;
        let max = container.children.len();
        let parent_id = container.id;
        if position.offset > max {
            return Err(ModelError::OffsetOutOfBounds {
                path: position.parent.clone(),
                offset: position.offset,
                max,
            });
        }
        for element in &mut elements {
            if fresh {
                self.attach(element, parent_id);
            } else {
                self.parents.insert(element.id, parent_id);
            }
            change
                .touched
                .extend(element.descendants().map(|descendant| descendant.id));
        }

        let count = elements.len();
        let parent = self.container_mut(&position.parent)?;
        let tail = parent.children.split_off(position.offset);
        parent.children.extend(elements);
        parent.children.extend(tail);

        if position.offset > 0 {
            change.neighbors.push(parent.children[position.offset - 1].id);
        }
        if let Some(after) = parent.children.get(position.offset + count) {
            change.neighbors.push(after.id);
        }
        Ok(())
    }

    /// Take children `range` out of the container at `parent`. The caller
    /// decides whether they are dropped or re-inserted.
    fn remove_children(
        &mut self,
        parent: &[usize],
        range: std::ops::Range<usize>,
        change: &mut Change,
    ) -> Result<Vec<Element>, ModelError> {
        let container = self.container_mut(parent)?;
        let max = container.children.len();
        if range.start > range.end || range.end > max {
            return Err(ModelError::OffsetOutOfBounds {
                path: parent.to_vec(),
                offset: range.end,
                max,
            });
        }
        let removed: Vec<Element> = container.children.drain(range.clone()).collect();

        if range.start > 0 {
            change.neighbors.push(container.children[range.start - 1].id);
        }
        if let Some(after) = container.children.get(range.start) {
            change.neighbors.push(after.id);
        }
        Ok(removed)
    }

    fn move_children(
        &mut self,
        parent: &[usize],
        range: std::ops::Range<usize>,
        target: &Position,
    ) -> Result<Change, ModelError> {
        if target.parent == parent && target.offset > range.start && target.offset < range.end {
            return Err(ModelError::MoveIntoItself);
        }
        let target_parent = path_after_removal(&target.parent, parent, range.start, range.len())
            .ok_or(ModelError::MoveIntoItself)?;
        let mut target_offset = target.offset;
        if target.parent == parent && target.offset >= range.end {
            target_offset -= range.len();
        }
        // Validate the destination before anything is taken out.
        self.container_mut(&target.parent)?;

        let mut change = Change::new(ChangeKind::Move);
        let moved = self.remove_children(parent, range, &mut change)?;
        let target = Position::new(target_parent, target_offset);
        self.insert_elements(&target, moved, false, &mut change)?;
        Ok(change)
    }

    fn split(&mut self, position: &Position) -> Result<Change, ModelError> {
        let Some((&index, parent)) = position.parent.split_last() else {
            return Err(ModelError::RootOperation("split"));
        };
        let block = self.text_block_mut(&position.parent)?;
        let at = byte_index(&block.text, position.offset).ok_or_else(|| {
            ModelError::OffsetOutOfBounds {
                path: position.parent.clone(),
                offset: position.offset,
                max: block.text.chars().count(),
            }
        })?;
        let mut tail = Element::block(block.name.clone(), block.text.split_off(at));
        tail.attributes = block.attributes.clone();
        let original = block.id;

        let mut change = Change::new(ChangeKind::Split);
        let after = Position::new(parent.to_vec(), index + 1);
        self.insert_elements(&after, vec![tail], true, &mut change)?;
        change.touched.insert(0, original);
        Ok(change)
    }

    fn merge(&mut self, path: &[usize]) -> Result<Change, ModelError> {
        let Some((&index, parent)) = path.split_last() else {
            return Err(ModelError::RootOperation("merged"));
        };
        if index == 0 {
            return Err(ModelError::NothingToMerge(path.to_vec()));
        }
        let container = self.element_mut(parent)?;
        if index >= container.children.len() {
            return Err(ModelError::InvalidPath(path.to_vec()));
        }
        let mut merged = container.children.remove(index);
        let children = std::mem::take(&mut merged.children);
        let adopted: Vec<NodeId> = children.iter().map(Element::id).collect();
        let previous = &mut container.children[index - 1];
        previous.text.push_str(&merged.text);
        previous.children.extend(children);
        let previous_id = previous.id;
        let after = container.children.get(index).map(Element::id);

        for child in adopted {
            self.parents.insert(child, previous_id);
        }
        self.detach(&merged);

        let mut change = Change::new(ChangeKind::Merge);
        change.touched.push(previous_id);
        change.neighbors.extend(after);
        Ok(change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paragraphs(texts: &[&str]) -> Document {
        Document::from_root(Element::container(
            ROOT_NAME,
            texts.iter().map(|t| Element::block("paragraph", *t)).collect(),
        ))
    }

    fn texts(document: &Document) -> Vec<String> {
        document
            .root()
            .children
            .iter()
            .map(|e| e.text.clone())
            .collect()
    }

    fn item(text: &str, id: &str) -> Element {
        Element::block("paragraph", text).with_attribute(LIST_ITEM_ID, id)
    }

    #[test]
    fn test_attached_elements_get_distinct_ids() {
        let doc = paragraphs(&["a", "b", "c"]);
        let ids: Vec<_> = doc.root().descendants().map(Element::id).collect();

        assert_eq!(ids, vec![NodeId(1), NodeId(2), NodeId(3), NodeId(4)]);
    }

    #[test]
    fn test_path_of_follows_moves_and_forgets_removed() {
        let mut doc = Document::from_root(Element::container(
            ROOT_NAME,
            vec![
                Element::container("blockQuote", vec![Element::block("paragraph", "a")]),
                Element::block("paragraph", "b"),
            ],
        ));
        let a = doc.element(&[0, 0]).unwrap().id();
        let b = doc.element(&[1]).unwrap().id();
        assert_eq!(doc.path_of(a), Some(vec![0, 0]));

        doc.apply(&Operation::Move {
            parent: vec![0],
            range: 0..1,
            target: Position::in_root(2),
        })
        .unwrap();
        assert_eq!(doc.path_of(a), Some(vec![2]));

        doc.apply(&Operation::Remove {
            parent: vec![],
            range: 1..2,
        })
        .unwrap();
        assert_eq!(doc.path_of(b), None);
        assert_eq!(doc.path_of(a), Some(vec![1]));
        assert_eq!(doc.path_of(NodeId::DETACHED), None);
    }

    #[test]
    fn test_item_id_counts_follow_every_operation() {
        let mut doc = Document::from_root(Element::container(
            ROOT_NAME,
            vec![item("a1", "a"), item("a2", "a"), item("b", "b")],
        ));
        assert_eq!(doc.item_id_count("a"), 2);

        doc.apply(&Operation::Split {
            position: Position::new(vec![2], 0),
        })
        .unwrap();
        assert_eq!(doc.item_id_count("b"), 2);

        doc.apply(&Operation::Merge { path: vec![3] }).unwrap();
        assert_eq!(doc.item_id_count("b"), 1);

        doc.apply(&Operation::SetAttribute {
            path: vec![1],
            key: LIST_ITEM_ID.to_string(),
            value: Some("c".into()),
        })
        .unwrap();
        assert_eq!(doc.item_id_count("a"), 1);
        assert_eq!(doc.item_id_count("c"), 1);

        doc.apply(&Operation::Remove {
            parent: vec![],
            range: 0..1,
        })
        .unwrap();
        assert_eq!(doc.item_id_count("a"), 0);
    }

    #[test]
    fn test_move_target_is_read_before_removal() {
        let mut doc = paragraphs(&["a", "b", "c", "d", "e", "x"]);
        let moved_id = doc.root().children[1].id();

        let change = doc
            .apply(&Operation::Move {
                parent: vec![],
                range: 1..3,
                target: Position::in_root(6),
            })
            .unwrap();

        assert_eq!(texts(&doc), vec!["a", "d", "e", "x", "b", "c"]);
        assert_eq!(doc.root().children[4].id(), moved_id);
        assert!(change.touched.contains(&moved_id));
    }

    #[test]
    fn test_move_out_of_container() {
        let mut doc = Document::from_root(Element::container(
            ROOT_NAME,
            vec![Element::container(
                "blockQuote",
                vec![
                    Element::block("paragraph", "a"),
                    Element::block("paragraph", "e"),
                ],
            )],
        ));

        doc.apply(&Operation::Move {
            parent: vec![0],
            range: 1..2,
            target: Position::in_root(0),
        })
        .unwrap();

        assert_eq!(doc.element(&[0]).unwrap().text, "e");
        assert_eq!(doc.element(&[1, 0]).unwrap().text, "a");
    }

    #[test]
    fn test_move_into_itself_is_rejected() {
        let mut doc = Document::from_root(Element::container(
            ROOT_NAME,
            vec![Element::container(
                "blockQuote",
                vec![Element::block("paragraph", "a")],
            )],
        ));

        let result = doc.apply(&Operation::Move {
            parent: vec![],
            range: 0..1,
            target: Position::new(vec![0], 0),
        });

        assert_eq!(result, Err(ModelError::MoveIntoItself));
    }

    #[test]
    fn test_remove_reports_bordering_siblings() {
        let mut doc = paragraphs(&["a", "b", "c", "d"]);
        let (a, d) = (doc.root().children[0].id(), doc.root().children[3].id());

        let change = doc
            .apply(&Operation::Remove {
                parent: vec![],
                range: 1..3,
            })
            .unwrap();

        assert_eq!(texts(&doc), vec!["a", "d"]);
        assert_eq!(change.neighbors, vec![a, d]);
    }

    #[test]
    fn test_split_copies_attributes_and_merge_joins_text() {
        let mut doc = Document::from_root(Element::container(ROOT_NAME, vec![item("hello", "a")]));

        doc.apply(&Operation::Split {
            position: Position::new(vec![0], 2),
        })
        .unwrap();

        assert_eq!(texts(&doc), vec!["he", "llo"]);
        assert_eq!(
            doc.element(&[1]).unwrap().attribute(LIST_ITEM_ID),
            Some(&"a".into())
        );
        assert_ne!(
            doc.element(&[0]).unwrap().id(),
            doc.element(&[1]).unwrap().id()
        );

        doc.apply(&Operation::Merge { path: vec![1] }).unwrap();
        assert_eq!(texts(&doc), vec!["hello"]);
    }

    #[test]
    fn test_text_offsets_are_chars() {
        let mut doc = paragraphs(&["naïve"]);

        doc.apply(&Operation::InsertText {
            position: Position::new(vec![0], 3),
            text: "-".to_string(),
        })
        .unwrap();
        doc.apply(&Operation::RemoveText {
            position: Position::new(vec![0], 0),
            length: 2,
        })
        .unwrap();

        assert_eq!(texts(&doc), vec!["ï-ve"]);
    }

    #[test]
    fn test_invalid_paths_are_errors() {
        let mut doc = paragraphs(&["a"]);

        assert_eq!(
            doc.apply(&Operation::Rename {
                path: vec![3],
                name: "heading1".to_string()
            }),
            Err(ModelError::InvalidPath(vec![3]))
        );
        assert_eq!(
            doc.apply(&Operation::Merge { path: vec![0] }),
            Err(ModelError::NothingToMerge(vec![0]))
        );
    }
}
