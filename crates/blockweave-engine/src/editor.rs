use std::collections::BTreeSet;

use crate::lists::attributes::{LIST_ATTRIBUTES, LIST_INDENT, LIST_TYPE};
use crate::lists::identity::{IdGenerator, UuidIds};
use crate::lists::paste::prepare_fragment;
use crate::lists::{ListPostFixer, ListType};
use crate::model::{
    ElementDef, Fragment, Model, ModelError, Position, Schema, Writer, insert_content,
};

/// Capabilities an editor can be built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    /// Lists as attributes on ordinary blocks, kept valid by the post-fixer.
    DocumentList,
    /// Lists as dedicated `listItem` elements. Cannot be combined with
    /// [`Feature::DocumentList`].
    LegacyList,
    BlockQuote,
    Table,
    Heading,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("Features {first:?} and {second:?} cannot be enabled together")]
    FeatureConflict { first: Feature, second: Feature },

    #[error(transparent)]
    Model(#[from] ModelError),
}

const CONFLICTS: &[(Feature, Feature)] = &[(Feature::DocumentList, Feature::LegacyList)];

pub const HEADINGS: [&str; 3] = ["heading1", "heading2", "heading3"];

/// Resolves features into a schema and a repair pipeline.
pub struct EditorBuilder {
    features: BTreeSet<Feature>,
    default_type: ListType,
    ids: Box<dyn IdGenerator>,
    definitions: Vec<ElementDef>,
    extensions: Vec<(String, String)>,
}

impl Default for EditorBuilder {
    fn default() -> Self {
        Self {
            features: BTreeSet::new(),
            default_type: ListType::default(),
            ids: Box::new(UuidIds),
            definitions: Vec::new(),
            extensions: Vec::new(),
        }
    }
}

impl EditorBuilder {
    pub fn feature(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    pub fn features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features.extend(features);
        self
    }

    /// Type given to list items that arrive without one.
    pub fn default_list_type(mut self, list_type: ListType) -> Self {
        self.default_type = list_type;
        self
    }

    pub fn ids(mut self, ids: Box<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Register an extra element after the features' own. Extra elements
    /// only allow the attributes their definition lists.
    pub fn register(mut self, definition: ElementDef) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Allow an extra attribute on an element registered by a feature or by
    /// [`EditorBuilder::register`].
    pub fn allow_attribute(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.extensions.push((name.into(), key.into()));
        self
    }

    pub fn build(self) -> Result<Editor, EditorError> {
        for &(first, second) in CONFLICTS {
            if self.features.contains(&first) && self.features.contains(&second) {
                return Err(EditorError::FeatureConflict { first, second });
            }
        }

        let mut schema = Schema::new();
        schema.register(ElementDef::text_block("paragraph"));
        for feature in &self.features {
            match feature {
                Feature::Heading => {
                    for heading in HEADINGS {
                        schema.register(ElementDef::text_block(heading));
                    }
                }
                Feature::BlockQuote => schema.register(ElementDef::container("blockQuote")),
                Feature::Table => {
                    schema.register(ElementDef::container("table"));
                    schema.register(ElementDef::container("tableRow").inner());
                    schema.register(ElementDef::container("tableCell").inner());
                }
                Feature::LegacyList => schema.register(
                    ElementDef::text_block("listItem")
                        .allow(LIST_INDENT)
                        .allow(LIST_TYPE),
                ),
                Feature::DocumentList => {}
            }
        }
        if self.features.contains(&Feature::DocumentList) {
            schema.allow_on_blocks(&LIST_ATTRIBUTES);
        }
        for definition in self.definitions {
            schema.register(definition);
        }
        for (name, key) in &self.extensions {
            if !schema.allow(name, key) {
                log::warn!("cannot allow {key} on unregistered element {name}");
            }
        }

        let mut model = Model::new(schema).with_ids(self.ids);
        if self.features.contains(&Feature::DocumentList) {
            model.add_stage(Box::new(ListPostFixer::new(self.default_type.clone())));
        }
        log::debug!(
            "editor built with {:?}, stages {:?}",
            self.features,
            model.stage_names()
        );

        Ok(Editor {
            model,
            features: self.features,
            default_type: self.default_type,
        })
    }
}

pub struct Editor {
    model: Model,
    features: BTreeSet<Feature>,
    default_type: ListType,
}

impl Editor {
    pub fn builder() -> EditorBuilder {
        EditorBuilder::default()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn default_list_type(&self) -> &ListType {
        &self.default_type
    }

    /// Run one change session on the model.
    pub fn change<T>(
        &mut self,
        f: impl FnOnce(&mut Writer<'_>) -> Result<T, ModelError>,
    ) -> Result<T, ModelError> {
        self.model.change(f)
    }

    /// Insert pasted or programmatic content at `at` in its own session.
    ///
    /// With document lists enabled, the fragment's list blocks get fresh ids
    /// and indents matching the insertion point first.
    pub fn insert_content(
        &mut self,
        mut fragment: Fragment,
        at: &Position,
    ) -> Result<(), ModelError> {
        if fragment.is_empty() {
            return Ok(());
        }
        let lists = self.has_feature(Feature::DocumentList);
        self.model.change(|writer| {
            if lists {
                let (document, schema, ids) = writer.parts();
                prepare_fragment(&mut fragment, document, schema, at, ids);
            }
            insert_content(writer, fragment, at)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_features_conflict() {
        let result = Editor::builder()
            .feature(Feature::DocumentList)
            .feature(Feature::LegacyList)
            .build();

        assert_eq!(
            result.err(),
            Some(EditorError::FeatureConflict {
                first: Feature::DocumentList,
                second: Feature::LegacyList
            })
        );
    }

    #[test]
    fn test_schema_follows_features() {
        let editor = Editor::builder()
            .features([Feature::DocumentList, Feature::Table, Feature::Heading])
            .register(ElementDef::text_block("nonListable"))
            .build()
            .unwrap();
        let schema = editor.model().schema();

        assert!(schema.is_list_capable("paragraph"));
        assert!(schema.is_list_capable("heading2"));
        assert!(schema.is_list_capable("table"));
        assert!(!schema.is_list_capable("tableCell"));
        assert!(!schema.is_list_capable("nonListable"));
        assert!(!schema.is_registered("blockQuote"));
        assert_eq!(editor.model().stage_names(), vec!["list-post-fixer"]);
    }

    #[test]
    fn test_without_document_lists_nothing_repairs() {
        let editor = Editor::builder().feature(Feature::LegacyList).build().unwrap();

        assert!(editor.model().stage_names().is_empty());
        assert!(!editor.model().schema().is_list_capable("paragraph"));
        assert!(
            editor
                .model()
                .schema()
                .allows_attribute("listItem", LIST_INDENT)
        );
    }
}
