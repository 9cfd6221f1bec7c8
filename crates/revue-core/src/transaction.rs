//! Edit transactions over a [`Document`].
//!
//! A transaction applies steps to a working copy of the document and records
//! one [`StepMap`] per step, in order. Consumers that track positions (the
//! modification tracker, the decoration overlay) replay the resulting
//! [`Mapping`] to stay aligned with the new document.

use crate::document::{Block, BlockKind, Document};
use crate::error::EditError;
use crate::mapping::{Mapping, StepMap};

#[derive(Debug, Clone)]
pub struct Transaction {
    doc: Document,
    mapping: Mapping,
}

impl Transaction {
    pub fn new(doc: &Document) -> Self {
        Self {
            doc: doc.clone(),
            mapping: Mapping::new(),
        }
    }

    /// The document with every step applied so far.
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// True when at least one step changed the document shape.
    pub fn doc_changed(&self) -> bool {
        !self.mapping.is_empty()
    }

    /// Replace the text between `from` and `to` with `text`.
    ///
    /// Both positions must lie inside the text of the same block.
    pub fn replace(&mut self, from: usize, to: usize, text: &str) -> Result<&mut Self, EditError> {
        if from > to {
            return Err(EditError::InvertedRange { from, to });
        }
        let (index, start) = self
            .doc
            .resolve(from)
            .ok_or(EditError::OutsideText { pos: from })?;
        let block = &mut self.doc.blocks_mut()[index];
        let content_start = start + 1;
        if to > content_start + block.len() {
            return Err(EditError::CrossesBlock { from, to });
        }

        block.replace_chars(from - content_start, to - content_start, text);
        self.mapping
            .push(StepMap::replace(from, to - from, text.chars().count()));
        Ok(self)
    }

    pub fn insert_text(&mut self, pos: usize, text: &str) -> Result<&mut Self, EditError> {
        self.replace(pos, pos, text)
    }

    pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self, EditError> {
        self.replace(from, to, "")
    }

    /// Split the block containing `pos` in two at `pos`.
    ///
    /// Splitting a heading turns the tail into a paragraph.
    pub fn split_block(&mut self, pos: usize) -> Result<&mut Self, EditError> {
        let (index, start) = self
            .doc
            .resolve(pos)
            .ok_or(EditError::OutsideText { pos })?;
        let blocks = self.doc.blocks_mut();
        let head = &mut blocks[index];
        let tail_kind = match head.kind() {
            BlockKind::Heading { .. } => BlockKind::Paragraph,
            kind => kind,
        };
        let tail = head.split_off(pos - start - 1);
        blocks.insert(index + 1, Block::new(tail_kind, tail));
        self.mapping.push(StepMap::replace(pos, 0, 2));
        Ok(self)
    }

    /// Merge the block at `index` into the block before it.
    pub fn join_backward(&mut self, index: usize) -> Result<&mut Self, EditError> {
        let len = self.doc.blocks().len();
        if index == 0 || index >= len {
            return Err(EditError::BlockIndex { index, len });
        }
        let boundary = self
            .doc
            .block_start(index)
            .ok_or(EditError::BlockIndex { index, len })?
            - 1;
        let blocks = self.doc.blocks_mut();
        let joined = blocks.remove(index);
        blocks[index - 1].push_str(joined.text());
        self.mapping.push(StepMap::replace(boundary, 2, 0));
        Ok(self)
    }

    pub fn insert_block(&mut self, index: usize, block: Block) -> Result<&mut Self, EditError> {
        let len = self.doc.blocks().len();
        let pos = self
            .doc
            .block_start(index)
            .ok_or(EditError::BlockIndex { index, len })?;
        let size = block.node_size();
        self.doc.blocks_mut().insert(index, block);
        self.mapping.push(StepMap::replace(pos, 0, size));
        Ok(self)
    }

    pub fn remove_block(&mut self, index: usize) -> Result<&mut Self, EditError> {
        let len = self.doc.blocks().len();
        if index >= len {
            return Err(EditError::BlockIndex { index, len });
        }
        let pos = self
            .doc
            .block_start(index)
            .ok_or(EditError::BlockIndex { index, len })?;
        let removed = self.doc.blocks_mut().remove(index);
        self.mapping.push(StepMap::replace(pos, removed.node_size(), 0));
        Ok(self)
    }

    /// Consume the transaction, returning the new document and its mapping.
    pub fn finish(self) -> (Document, Mapping) {
        (self.doc, self.mapping)
    }
}
