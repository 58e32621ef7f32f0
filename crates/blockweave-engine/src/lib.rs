pub mod dev_utils;
pub mod editor;
pub mod lists;
pub mod model;

// Re-export key types for easier usage
pub use editor::{Editor, EditorBuilder, EditorError, Feature};
pub use lists::{ListPostFixer, ListType};
pub use model::{
    AttributeValue, Document, Element, Fragment, Model, ModelError, Path, Position, Range, Schema,
    Writer,
};
