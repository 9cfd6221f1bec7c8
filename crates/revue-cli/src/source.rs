//! Plain-text files as documents.
//!
//! Blank lines separate blocks. A block whose first line starts with `#`
//! is a heading of that many levels; everything else is a paragraph, with
//! its lines joined by single spaces.

use revue_core::{Block, Document};

const MAX_HEADING_LEVEL: usize = 6;

pub fn parse_document(text: &str) -> Document {
    let mut blocks = Vec::new();
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut lines, &mut blocks);
        } else {
            lines.push(line.trim());
        }
    }
    flush(&mut lines, &mut blocks);
    Document::new(blocks)
}

fn flush(lines: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if lines.is_empty() {
        return;
    }
    let joined = lines.join(" ");
    lines.clear();

    let hashes = joined.chars().take_while(|c| *c == '#').count();
    if (1..=MAX_HEADING_LEVEL).contains(&hashes) {
        let title = joined[hashes..].trim();
        blocks.push(Block::heading(hashes as u8, title));
    } else {
        blocks.push(Block::paragraph(joined));
    }
}
