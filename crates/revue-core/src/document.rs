//! Block document model with character-based positions.
//!
//! A document is a flat sequence of text blocks. Each block occupies
//! `len + 2` positions: an opening token, its text, and a closing token, so
//! the text of a block starting at `pos` spans `pos + 1 ..= pos + 1 + len`.

use serde::{Deserialize, Serialize};

/// Kind of a top-level block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum BlockKind {
    Paragraph,
    Heading { level: u8 },
    CodeBlock,
}

/// A text block. The character length is cached alongside the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    kind: BlockKind,
    text: String,
    len: usize,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self { kind, text, len }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading { level }, text)
    }

    pub fn code_block(text: impl Into<String>) -> Self {
        Self::new(BlockKind::CodeBlock, text)
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text length in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of positions the block occupies, boundary tokens included.
    pub fn node_size(&self) -> usize {
        self.len + 2
    }

    pub(crate) fn replace_chars(&mut self, from: usize, to: usize, text: &str) {
        let start = byte_offset(&self.text, from);
        let end = byte_offset(&self.text, to);
        self.text.replace_range(start..end, text);
        self.len = self.text.chars().count();
    }

    pub(crate) fn split_off(&mut self, at: usize) -> String {
        let byte = byte_offset(&self.text, at);
        let tail = self.text.split_off(byte);
        self.len = at;
        tail
    }

    pub(crate) fn push_str(&mut self, text: &str) {
        self.text.push_str(text);
        self.len += text.chars().count();
    }
}

/// A document: an ordered list of blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a document with one paragraph per item.
    pub fn from_paragraphs<I, S>(paragraphs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(paragraphs.into_iter().map(Block::paragraph).collect())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    /// Walk the blocks together with their start positions.
    pub fn positioned(&self) -> impl Iterator<Item = (usize, &Block)> + '_ {
        self.blocks.iter().scan(0usize, |pos, block| {
            let start = *pos;
            *pos += block.node_size();
            Some((start, block))
        })
    }

    /// Total number of positions in the document.
    pub fn size(&self) -> usize {
        self.blocks.iter().map(Block::node_size).sum()
    }

    /// Start position of the block at `index`, or the document size when
    /// `index` is one past the last block.
    pub fn block_start(&self, index: usize) -> Option<usize> {
        if index > self.blocks.len() {
            return None;
        }
        Some(self.blocks[..index].iter().map(Block::node_size).sum())
    }

    /// Find the block whose text contains `pos` (edges included).
    ///
    /// Returns the block index and the block's start position.
    pub fn resolve(&self, pos: usize) -> Option<(usize, usize)> {
        self.positioned()
            .enumerate()
            .find(|(_, (start, block))| pos > *start && pos <= start + 1 + block.len())
            .map(|(index, (start, _))| (index, start))
    }

    /// Text content between two positions. Block boundaries contribute nothing.
    pub fn text_between(&self, from: usize, to: usize) -> String {
        let mut out = String::new();
        for (start, block) in self.positioned() {
            let content_start = start + 1;
            let content_end = content_start + block.len();
            let lo = from.max(content_start);
            let hi = to.min(content_end);
            if lo < hi {
                out.extend(
                    block
                        .text()
                        .chars()
                        .skip(lo - content_start)
                        .take(hi - lo),
                );
            }
        }
        out
    }
}

/// Byte offset of the `char_idx`-th character, clamped to the string end.
pub(crate) fn byte_offset(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(byte, _)| byte)
        .unwrap_or(s.len())
}
