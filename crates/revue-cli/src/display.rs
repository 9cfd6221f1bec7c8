//! Findings report, grouped by paragraph.
//!
//! Each paragraph with at least one decoration gets a header line followed
//! by one entry per finding: the flagged text, its category and range, the
//! message, and up to a few suggestions.

use std::fmt::Write;

use chrono::{DateTime, Local};
use revue_core::{DecorationSet, DocRange, Document, Severity, extract_paragraphs};

const MAX_SUGGESTIONS: usize = 3;
const EXCERPT_CHARS: usize = 60;

// ── Public API ──

/// Render every decoration in `decorations` against `doc`.
pub fn render_report(doc: &Document, decorations: &DecorationSet) -> String {
    let mut out = String::new();
    for (index, span) in extract_paragraphs(doc).iter().enumerate() {
        let range = DocRange::new(span.doc_start, span.doc_end);
        let findings: Vec<_> = decorations.find(range).collect();
        if findings.is_empty() {
            continue;
        }

        let _ = writeln!(out, "¶ {} ({}..{})", index + 1, range.from, range.to);
        let _ = writeln!(out, "  {}", excerpt(&span.text));
        for deco in findings {
            let flagged = doc.text_between(deco.range.from, deco.range.to);
            let _ = writeln!(
                out,
                "  {:<26} {} {}..{}",
                format!("\"{flagged}\""),
                severity_label(deco.severity),
                deco.range.from,
                deco.range.to
            );
            let _ = writeln!(out, "    {}", deco.payload.message);
            if !deco.payload.replacements.is_empty() {
                let shown: Vec<&str> = deco
                    .payload
                    .replacements
                    .iter()
                    .take(MAX_SUGGESTIONS)
                    .map(String::as_str)
                    .collect();
                let _ = write!(out, "    suggestions: {}", shown.join(", "));
                if deco.payload.replacements.len() > MAX_SUGGESTIONS {
                    let _ = write!(
                        out,
                        " (and {} more)",
                        deco.payload.replacements.len() - MAX_SUGGESTIONS
                    );
                }
                out.push('\n');
            }
        }
        out.push('\n');
    }
    out
}

/// One-line summary closing the report.
pub fn render_summary(
    file: &str,
    paragraphs: usize,
    decorations: &DecorationSet,
    at: DateTime<Local>,
) -> String {
    let spelling = decorations
        .iter()
        .filter(|d| d.severity == Severity::Misspelling)
        .count();
    format!(
        "{file}: {} finding(s) ({} spelling, {} grammar) in {paragraphs} paragraph(s), checked {}",
        decorations.len(),
        spelling,
        decorations.len() - spelling,
        at.format("%Y-%m-%d %H:%M:%S")
    )
}

// ── Helpers ──

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Misspelling => "[spelling]",
        Severity::Grammar => "[grammar]",
        Severity::Other => "[style]",
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_CHARS {
        let head: String = text.chars().take(EXCERPT_CHARS - 3).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}
