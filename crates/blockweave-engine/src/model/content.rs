use crate::model::{Element, ModelError, Position, Writer};

/// Detached blocks waiting to be inserted, as produced by a paste pipeline
/// or built by hand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub blocks: Vec<Element>,
}

impl Fragment {
    pub fn new(blocks: Vec<Element>) -> Self {
        Self { blocks }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl From<Vec<Element>> for Fragment {
    fn from(blocks: Vec<Element>) -> Self {
        Self::new(blocks)
    }
}

/// Insert `fragment` at `at`.
///
/// At a container position the blocks are inserted as they are. Inside a
/// text block the first fragment block's text joins the host at the offset,
/// the host is split, the remaining blocks land after it and the host's tail
/// text joins the last block when that block holds text. An empty fragment
/// changes nothing.
pub fn insert_content(
    writer: &mut Writer<'_>,
    fragment: Fragment,
    at: &Position,
) -> Result<(), ModelError> {
    let mut blocks = fragment.blocks;
    if blocks.is_empty() {
        return Ok(());
    }
    let host = writer.element(&at.parent)?;
    if !writer.schema().is_text_block(&host.name) {
        return writer.insert(at.clone(), blocks);
    }
    let Some((&host_index, parent)) = at.parent.split_last() else {
        return writer.insert(at.clone(), blocks);
    };
    let parent = parent.to_vec();

    let mut offset = at.offset;
    if writer.schema().is_text_block(&blocks[0].name) {
        let first = blocks.remove(0);
        offset += first.text.chars().count();
        writer.insert_text(at.clone(), first.text)?;
        if blocks.is_empty() {
            return Ok(());
        }
    }

    writer.split(Position::new(at.parent.clone(), offset))?;
    let count = blocks.len();
    let last_holds_text = blocks
        .last()
        .is_some_and(|block| writer.schema().is_text_block(&block.name));
    writer.insert(Position::new(parent.clone(), host_index + 1), blocks)?;
    if last_holds_text {
        let mut tail = parent;
        tail.push(host_index + 1 + count);
        writer.merge(&tail)?;
    }
    Ok(())
}
