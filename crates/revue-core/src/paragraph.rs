//! Paragraph extraction and check-batch assembly.

use std::time::Instant;

use crate::document::{BlockKind, Document};

/// Separator placed between paragraphs in a check batch.
pub const BATCH_SEPARATOR: &str = "\n\n";

const SEPARATOR_LEN: usize = BATCH_SEPARATOR.len();

/// One paragraph's text and where it lives.
///
/// `doc_start..doc_end` bounds exactly the paragraph text in document
/// coordinates. `batch_offset` is the paragraph's offset inside whichever
/// text it was laid out in: the whole-document layout produced by
/// [`extract_paragraphs`], or a check batch produced by [`Batch::assemble`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphSpan {
    pub text: String,
    pub batch_offset: usize,
    pub doc_start: usize,
    pub doc_end: usize,
    pub last_modified_at: Option<Instant>,
}

impl ParagraphSpan {
    /// Text length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// True when `offset` falls inside this paragraph's slice of the batch.
    pub fn contains_offset(&self, offset: usize) -> bool {
        self.batch_offset <= offset && offset < self.batch_offset + self.len()
    }

    /// True when `pos` lies inside `[doc_start, doc_end]`.
    pub fn contains_pos(&self, pos: usize) -> bool {
        self.doc_start <= pos && pos <= self.doc_end
    }
}

/// Every non-blank paragraph of `doc`, in document order.
///
/// Offsets accumulate each paragraph's length plus one separator unit and
/// restart at zero on every call.
pub fn extract_paragraphs(doc: &Document) -> Vec<ParagraphSpan> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for (pos, block) in doc.positioned() {
        if block.kind() != BlockKind::Paragraph || block.text().trim().is_empty() {
            continue;
        }
        spans.push(ParagraphSpan {
            text: block.text().to_string(),
            batch_offset: offset,
            doc_start: pos + 1,
            doc_end: pos + block.node_size() - 1,
            last_modified_at: None,
        });
        offset += block.len() + 1;
    }
    spans
}

/// The concatenated text sent in one remote call, with the spans it was
/// built from re-laid out against that text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    text: String,
    spans: Vec<ParagraphSpan>,
}

impl Batch {
    /// Join `paragraphs` with [`BATCH_SEPARATOR`], rewriting each span's
    /// `batch_offset` to its position in the joined text.
    pub fn assemble(paragraphs: impl IntoIterator<Item = ParagraphSpan>) -> Self {
        let mut text = String::new();
        let mut spans = Vec::new();
        let mut offset = 0;
        for mut span in paragraphs {
            if !spans.is_empty() {
                text.push_str(BATCH_SEPARATOR);
                offset += SEPARATOR_LEN;
            }
            span.batch_offset = offset;
            offset += span.len();
            text.push_str(&span.text);
            spans.push(span);
        }
        Self { text, spans }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[ParagraphSpan] {
        &self.spans
    }

    /// True when there is nothing worth sending.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
