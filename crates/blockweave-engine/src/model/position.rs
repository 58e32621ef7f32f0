/// Child indices from the root down to an element. The empty path is the root.
pub type Path = Vec<usize>;

/// A location inside an element.
///
/// In a container `offset` is a child index (a gap between children); in a
/// text block it is a char offset into the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub parent: Path,
    pub offset: usize,
}

impl Position {
    pub fn new(parent: Path, offset: usize) -> Self {
        Self { parent, offset }
    }

    /// Position in the root container.
    pub fn in_root(offset: usize) -> Self {
        Self::new(Vec::new(), offset)
    }

    /// Position just before the element at `path`.
    pub fn before(path: &[usize]) -> Option<Self> {
        let (last, parent) = path.split_last()?;
        Some(Self::new(parent.to_vec(), *last))
    }

    /// Position just after the element at `path`.
    pub fn after(path: &[usize]) -> Option<Self> {
        let (last, parent) = path.split_last()?;
        Some(Self::new(parent.to_vec(), last + 1))
    }
}

/// Range between two positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn collapsed(position: Position) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Child index range when both ends sit in the same container.
    pub fn flat(&self) -> Option<(Path, std::ops::Range<usize>)> {
        if self.start.parent != self.end.parent || self.start.offset > self.end.offset {
            return None;
        }
        let range = self.start.offset..self.end.offset;
        Some((self.start.parent.clone(), range))
    }
}

/// Parent path and index of the element at `path`.
pub fn split_path(path: &[usize]) -> Option<(&[usize], usize)> {
    let (last, parent) = path.split_last()?;
    Some((parent, *last))
}

/// Rewrite `path` as it reads after `count` children starting at `index` were
/// removed from the container at `parent`.
///
/// Returns `None` if `path` pointed into the removed range.
pub fn path_after_removal(
    path: &[usize],
    parent: &[usize],
    index: usize,
    count: usize,
) -> Option<Path> {
    let mut result = path.to_vec();
    if path.len() > parent.len() && path.starts_with(parent) {
        let step = path[parent.len()];
        if step >= index + count {
            result[parent.len()] = step - count;
        } else if step >= index {
            return None;
        }
    }
    Some(result)
}
