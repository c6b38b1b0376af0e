//! Error types for tag tree building, parsing and traversal.

use crate::tag::Tag;

/// Errors that can occur while building, importing, reading or exporting a tag tree.
#[derive(Debug, thiserror::Error)]
pub enum NbtError {
    #[error("invalid structure: {0}")]
    InvalidStructure(String),

    #[error("type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch { expected: Tag, found: Tag },

    #[error("list overread: list holds {count} elements")]
    ListOverread { count: i32 },

    #[error("no {tag:?} tag named {name:?} in the open compound")]
    NotFound { name: String, tag: Tag },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("unexpected end of data: need {needed} bytes but only {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("input of {len} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { len: usize, limit: usize },

    #[error("structure not finalized: containers are still open")]
    NotFinalized,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NbtError {
    pub(crate) fn structure(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Returns true for errors caused by malformed input rather than API misuse.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::UnexpectedEof { .. })
    }
}
