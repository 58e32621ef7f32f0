use crate::model::Path;

/// Structural misuse of the operation engine.
///
/// These are caller bugs (stale paths, impossible moves), not editing
/// outcomes; list repairs never produce them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("No element at path {0:?}")]
    InvalidPath(Path),

    #[error("Offset {offset} is out of bounds for element at {path:?} (max {max})")]
    OffsetOutOfBounds { path: Path, offset: usize, max: usize },

    #[error("Element `{name}` at {path:?} holds child elements, not text")]
    NotATextBlock { path: Path, name: String },

    #[error("Element `{name}` at {path:?} holds text, not child elements")]
    NotAContainer { path: Path, name: String },

    #[error("Cannot move a range into itself")]
    MoveIntoItself,

    #[error("Element at {0:?} has no previous sibling to merge into")]
    NothingToMerge(Path),

    #[error("The root element cannot be {0}")]
    RootOperation(&'static str),
}
