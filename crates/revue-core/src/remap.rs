//! Translate batch-relative match offsets into document ranges.

use serde::{Deserialize, Serialize};

use crate::annotation::Match;
use crate::paragraph::ParagraphSpan;

/// A half-open range `[from, to)` in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocRange {
    pub from: usize,
    pub to: usize,
}

impl DocRange {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }

    /// Empty or inverted.
    pub fn is_empty(&self) -> bool {
        self.to <= self.from
    }

    /// True when `other` lies entirely within `self`.
    pub fn contains_range(&self, other: &DocRange) -> bool {
        self.from <= other.from && other.to <= self.to
    }

    /// True when `pos` is inside the half-open range.
    pub fn contains(&self, pos: usize) -> bool {
        self.from <= pos && pos < self.to
    }
}

/// A match placed in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Remapped {
    /// Index into the span list the match was resolved against.
    pub paragraph: usize,
    pub range: DocRange,
}

/// Locate the paragraph that owns `m` and compute its document range.
///
/// Returns `None` when no paragraph contains the match offset, when the
/// match runs past the end of its paragraph, or when the resulting range
/// is empty.
pub fn remap_match(m: &Match, spans: &[ParagraphSpan]) -> Option<Remapped> {
    let (paragraph, span) = spans
        .iter()
        .enumerate()
        .find(|(_, span)| span.contains_offset(m.offset))?;

    let local_start = m.offset.checked_sub(span.batch_offset)?;
    let local_end = local_start + m.length;
    if local_end > span.len() {
        return None;
    }

    let range = DocRange::new(span.doc_start + local_start, span.doc_start + local_end);
    if range.is_empty() {
        return None;
    }
    Some(Remapped { paragraph, range })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::Severity;
    use crate::document::Document;
    use crate::paragraph::{Batch, extract_paragraphs};

    fn finding(offset: usize, length: usize) -> Match {
        Match {
            offset,
            length,
            message: "msg".into(),
            short_message: None,
            severity: Severity::Misspelling,
            replacements: vec![],
            rule_id: "RULE".into(),
        }
    }

    fn batch() -> (Document, Batch) {
        let doc = Document::from_paragraphs(["Hello wrold", "Second line"]);
        let batch = Batch::assemble(extract_paragraphs(&doc));
        (doc, batch)
    }

    #[test]
    fn remaps_into_first_paragraph() {
        let (doc, batch) = batch();
        let first = &batch.spans()[0];
        let remapped = remap_match(&finding(6, 5), batch.spans()).unwrap();
        assert_eq!(remapped.paragraph, 0);
        assert_eq!(
            remapped.range,
            DocRange::new(first.doc_start + 6, first.doc_start + 11)
        );
        assert_eq!(doc.text_between(remapped.range.from, remapped.range.to), "wrold");
    }

    #[test]
    fn remaps_into_second_paragraph_past_separator() {
        let (doc, batch) = batch();
        // "line" sits at 13 + 7 in the batch text.
        let remapped = remap_match(&finding(20, 4), batch.spans()).unwrap();
        assert_eq!(remapped.paragraph, 1);
        assert_eq!(doc.text_between(remapped.range.from, remapped.range.to), "line");
    }

    #[test]
    fn match_overflowing_paragraph_is_discarded() {
        let (_, batch) = batch();
        assert_eq!(remap_match(&finding(8, 6), batch.spans()), None);
    }

    #[test]
    fn match_in_separator_is_discarded() {
        let (_, batch) = batch();
        assert_eq!(remap_match(&finding(11, 1), batch.spans()), None);
        assert_eq!(remap_match(&finding(40, 1), batch.spans()), None);
    }

    #[test]
    fn zero_length_match_is_discarded() {
        let (_, batch) = batch();
        assert_eq!(remap_match(&finding(3, 0), batch.spans()), None);
    }
}
