use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("position {pos} is not inside block text")]
    OutsideText { pos: usize },

    #[error("range {from}..{to} crosses a block boundary")]
    CrossesBlock { from: usize, to: usize },

    #[error("inverted range {from}..{to}")]
    InvertedRange { from: usize, to: usize },

    #[error("block index {index} out of bounds ({len} blocks)")]
    BlockIndex { index: usize, len: usize },
}
