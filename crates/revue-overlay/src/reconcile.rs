//! Merge check results into the persistent decoration set.

use revue_core::{
    Bias, Decoration, DecorationSet, DocRange, Mapping, Match, ParagraphSpan, remap_match,
};
use tracing::warn;

use crate::scheduler::CheckMode;

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub added: usize,
    pub removed: usize,
    /// Matches that could not be placed in the document.
    pub discarded: usize,
}

/// Owner of the decoration overlay.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    decorations: DecorationSet,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    /// Carry the overlay through one edit.
    pub fn map(&mut self, mapping: &Mapping) {
        self.decorations = self.decorations.map(mapping);
    }

    /// Apply the matches of a finished check.
    ///
    /// `spans` are the checked paragraphs as laid out in the batch, in the
    /// coordinates of the document the check was planned against; `since`
    /// carries those coordinates to the current document. A full check
    /// replaces the whole overlay. An incremental check replaces only the
    /// decorations inside the checked paragraphs.
    pub fn apply(
        &mut self,
        mode: CheckMode,
        spans: &[ParagraphSpan],
        matches: &[Match],
        since: &Mapping,
    ) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();

        let paragraph_ranges: Vec<DocRange> = spans
            .iter()
            .map(|span| {
                DocRange::new(
                    since.map_pos(span.doc_start, Bias::Left),
                    since.map_pos(span.doc_end, Bias::Right),
                )
            })
            .collect();

        let mut fresh = Vec::new();
        for m in matches {
            let Some(remapped) = remap_match(m, spans) else {
                outcome.discarded += 1;
                continue;
            };
            let range = DocRange::new(
                since.map_pos(remapped.range.from, Bias::Right),
                since.map_pos(remapped.range.to, Bias::Left),
            );
            if range.is_empty() {
                outcome.discarded += 1;
                continue;
            }
            // Selective clear relies on no decoration straddling two paragraphs.
            if !paragraph_ranges[remapped.paragraph].contains_range(&range) {
                warn!(
                    from = range.from,
                    to = range.to,
                    rule = %m.rule_id,
                    "decoration escapes its paragraph, dropping"
                );
                outcome.discarded += 1;
                continue;
            }
            fresh.push(Decoration::from_match(m, range));
        }

        match mode {
            CheckMode::Full => {
                outcome.removed = self.decorations.len();
                self.decorations.clear();
            }
            CheckMode::Incremental => {
                for range in &paragraph_ranges {
                    outcome.removed += self.decorations.remove_within(*range);
                }
            }
        }

        outcome.added = fresh.len();
        self.decorations.add(fresh);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use revue_core::{Batch, Document, Severity, Transaction, extract_paragraphs};

    fn finding(offset: usize, length: usize, rule: &str) -> Match {
        Match {
            offset,
            length,
            message: format!("{rule} message"),
            short_message: None,
            severity: Severity::Grammar,
            replacements: vec![],
            rule_id: rule.into(),
        }
    }

    fn texts(doc: &Document, set: &DecorationSet) -> Vec<String> {
        set.iter()
            .map(|d| doc.text_between(d.range.from, d.range.to))
            .collect()
    }

    #[test]
    fn full_check_replaces_everything() {
        let doc = Document::from_paragraphs(["Hello wrold", "Second line"]);
        let batch = Batch::assemble(extract_paragraphs(&doc));
        let mut reconciler = Reconciler::new();
        reconciler.apply(
            CheckMode::Full,
            batch.spans(),
            &[finding(6, 5, "A"), finding(13, 6, "B")],
            &Mapping::new(),
        );
        assert_eq!(texts(&doc, reconciler.decorations()), vec!["wrold", "Second"]);

        let outcome = reconciler.apply(
            CheckMode::Full,
            batch.spans(),
            &[finding(20, 4, "C")],
            &Mapping::new(),
        );
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.added, 1);
        assert_eq!(texts(&doc, reconciler.decorations()), vec!["line"]);
    }

    #[test]
    fn incremental_check_leaves_other_paragraphs_alone() {
        let doc = Document::from_paragraphs(["one erorr", "two erorr", "three erorr"]);
        let all = extract_paragraphs(&doc);
        let mut reconciler = Reconciler::new();
        let full = Batch::assemble(all.clone());
        // "erorr" in each paragraph.
        reconciler.apply(
            CheckMode::Full,
            full.spans(),
            &[finding(4, 5, "P1"), finding(15, 5, "P2"), finding(28, 5, "P3")],
            &Mapping::new(),
        );
        assert_eq!(reconciler.decorations().len(), 3);
        let p2_before = reconciler
            .decorations()
            .iter()
            .find(|d| d.payload.rule_id == "P2")
            .cloned()
            .unwrap();

        // Recheck P1 and P3: P1 comes back clean, P3 reports a new finding.
        let partial = Batch::assemble(vec![all[0].clone(), all[2].clone()]);
        let outcome = reconciler.apply(
            CheckMode::Incremental,
            partial.spans(),
            &[finding(17, 5, "P3-new")],
            &Mapping::new(),
        );
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.added, 1);

        let rules: Vec<&str> = reconciler
            .decorations()
            .iter()
            .map(|d| d.payload.rule_id.as_str())
            .collect();
        assert_eq!(rules, vec!["P2", "P3-new"]);
        let p2_after = reconciler
            .decorations()
            .iter()
            .find(|d| d.payload.rule_id == "P2")
            .unwrap();
        assert_eq!(p2_after, &p2_before);
    }

    #[test]
    fn results_follow_edits_made_during_the_check() {
        let doc = Document::from_paragraphs(["Hello wrold", "Second line"]);
        let batch = Batch::assemble(extract_paragraphs(&doc));

        let mut tr = Transaction::new(&doc);
        tr.insert_text(1, "Oh ").unwrap();
        tr.insert_text(17, "!").unwrap();
        let (doc, since) = tr.finish();

        let mut reconciler = Reconciler::new();
        reconciler.apply(CheckMode::Full, batch.spans(), &[finding(6, 5, "A")], &since);
        assert_eq!(texts(&doc, reconciler.decorations()), vec!["wrold"]);
    }

    #[test]
    fn matches_over_deleted_text_are_discarded() {
        let doc = Document::from_paragraphs(["Hello wrold"]);
        let batch = Batch::assemble(extract_paragraphs(&doc));
        let mut tr = Transaction::new(&doc);
        tr.delete(7, 12).unwrap();
        let (_, since) = tr.finish();

        let mut reconciler = Reconciler::new();
        let outcome = reconciler.apply(
            CheckMode::Full,
            batch.spans(),
            &[finding(6, 5, "A"), finding(40, 2, "B"), finding(8, 9, "C")],
            &since,
        );
        assert_eq!(outcome.discarded, 3);
        assert!(reconciler.decorations().is_empty());
    }
}
