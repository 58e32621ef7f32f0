use crate::lists::identity::{IdAllocator, IdGenerator};
use crate::model::{
    AttributeValue, Change, Document, Element, ModelError, Operation, Path, Position, Schema,
};

/// Mutation API handed to a change session.
///
/// Every call applies one [`Operation`] right away and records the resulting
/// [`Change`]. Later calls see the effect of earlier ones.
pub struct Writer<'a> {
    document: &'a mut Document,
    schema: &'a Schema,
    ids: &'a mut dyn IdGenerator,
    operations: Vec<Operation>,
    changes: Vec<Change>,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(
        document: &'a mut Document,
        schema: &'a Schema,
        ids: &'a mut dyn IdGenerator,
    ) -> Self {
        Self {
            document,
            schema,
            ids,
            operations: Vec::new(),
            changes: Vec::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &*self.document
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// Document, schema and id source borrowed at once.
    pub fn parts(&mut self) -> (&Document, &Schema, &mut dyn IdGenerator) {
        (&*self.document, self.schema, &mut *self.ids)
    }

    /// A list item id not used anywhere in the document.
    pub fn fresh_id(&mut self) -> String {
        IdAllocator::new(&mut *self.ids, &*self.document).fresh()
    }

    pub fn element(&self, path: &[usize]) -> Result<&Element, ModelError> {
        self.document
            .element(path)
            .ok_or_else(|| ModelError::InvalidPath(path.to_vec()))
    }

    /// Apply a raw operation.
    pub fn apply(&mut self, operation: Operation) -> Result<(), ModelError> {
        let change = self.document.apply(&operation)?;
        self.operations.push(operation);
        self.changes.push(change);
        Ok(())
    }

    pub fn insert(&mut self, position: Position, elements: Vec<Element>) -> Result<(), ModelError> {
        if elements.is_empty() {
            return Ok(());
        }
        self.apply(Operation::Insert { position, elements })
    }

    /// Insert `element` as the last child of `parent`, returning its path.
    pub fn append(&mut self, parent: &[usize], element: Element) -> Result<Path, ModelError> {
        let offset = self.element(parent)?.children.len();
        self.insert(Position::new(parent.to_vec(), offset), vec![element])?;
        let mut path = parent.to_vec();
        path.push(offset);
        Ok(path)
    }

    pub fn insert_text(
        &mut self,
        position: Position,
        text: impl Into<String>,
    ) -> Result<(), ModelError> {
        let text = text.into();
        if text.is_empty() {
            return Ok(());
        }
        self.apply(Operation::InsertText { position, text })
    }

    pub fn remove_text(&mut self, position: Position, length: usize) -> Result<(), ModelError> {
        if length == 0 {
            return Ok(());
        }
        self.apply(Operation::RemoveText { position, length })
    }

    /// Remove the element at `path`.
    pub fn remove(&mut self, path: &[usize]) -> Result<(), ModelError> {
        let Some((&index, parent)) = path.split_last() else {
            return Err(ModelError::RootOperation("removed"));
        };
        self.remove_range(parent, index..index + 1)
    }

    pub fn remove_range(
        &mut self,
        parent: &[usize],
        range: std::ops::Range<usize>,
    ) -> Result<(), ModelError> {
        if range.is_empty() {
            return Ok(());
        }
        self.apply(Operation::Remove {
            parent: parent.to_vec(),
            range,
        })
    }

    /// Move children `range` of `parent` to `target`, read in the coordinates
    /// before the move.
    pub fn move_range(
        &mut self,
        parent: &[usize],
        range: std::ops::Range<usize>,
        target: Position,
    ) -> Result<(), ModelError> {
        if range.is_empty() {
            return Ok(());
        }
        self.apply(Operation::Move {
            parent: parent.to_vec(),
            range,
            target,
        })
    }

    pub fn rename(&mut self, path: &[usize], name: impl Into<String>) -> Result<(), ModelError> {
        let name = name.into();
        if self.element(path)?.name == name {
            return Ok(());
        }
        self.apply(Operation::Rename {
            path: path.to_vec(),
            name,
        })
    }

    /// Set an attribute. Keys the schema forbids on the element are ignored.
    pub fn set_attribute(
        &mut self,
        path: &[usize],
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Result<(), ModelError> {
        let value = value.into();
        let element = self.element(path)?;
        if !self.schema.allows_attribute(&element.name, key) {
            log::debug!(
                "ignoring attribute {key}={value} on `{}` at {path:?}",
                element.name
            );
            return Ok(());
        }
        if element.attribute(key) == Some(&value) {
            return Ok(());
        }
        self.apply(Operation::SetAttribute {
            path: path.to_vec(),
            key: key.to_string(),
            value: Some(value),
        })
    }

    pub fn remove_attribute(&mut self, path: &[usize], key: &str) -> Result<(), ModelError> {
        if !self.element(path)?.has_attribute(key) {
            return Ok(());
        }
        self.apply(Operation::SetAttribute {
            path: path.to_vec(),
            key: key.to_string(),
            value: None,
        })
    }

    /// Split a text block at a char offset, returning the path of the new
    /// block holding the tail.
    pub fn split(&mut self, position: Position) -> Result<Path, ModelError> {
        let mut path = position.parent.clone();
        self.apply(Operation::Split { position })?;
        if let Some(last) = path.last_mut() {
            *last += 1;
        }
        Ok(path)
    }

    /// Merge the element at `path` into its previous sibling.
    pub fn merge(&mut self, path: &[usize]) -> Result<(), ModelError> {
        self.apply(Operation::Merge { path: path.to_vec() })
    }

    pub(crate) fn into_parts(self) -> (Vec<Operation>, Vec<Change>) {
        (self.operations, self.changes)
    }
}
