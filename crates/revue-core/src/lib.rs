//! Document model, position mapping, and annotation types for the grammar overlay.

pub mod annotation;
pub mod decoration;
pub mod document;
mod error;
pub mod mapping;
pub mod paragraph;
pub mod remap;
pub mod transaction;

pub use annotation::{CheckLevel, DecorationPayload, Match, Severity};
pub use decoration::{Decoration, DecorationSet};
pub use document::{Block, BlockKind, Document};
pub use error::EditError;
pub use mapping::{Bias, MapResult, Mapping, StepMap};
pub use paragraph::{BATCH_SEPARATOR, Batch, ParagraphSpan, extract_paragraphs};
pub use remap::{DocRange, Remapped, remap_match};
pub use transaction::Transaction;
