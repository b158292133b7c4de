//! Template parse errors.
//!
//! Template problems are recoverable: the parser records them and keeps
//! building the tree.

use crate::ast::Position;

/// Error codes reported by the template tokenizer and parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    EofInTag,
    EofInComment,
    EofInInterpolation,
    MissingEndTagName,
    MissingEndTag,
    InvalidEndTag,
}

impl ErrorCode {
    pub fn message(self) -> &'static str {
        match self {
            Self::EofInTag => "Unexpected EOF in tag.",
            Self::EofInComment => "Unexpected EOF in comment.",
            Self::EofInInterpolation => "Interpolation end sign was not found.",
            Self::MissingEndTagName => "End tag name was expected.",
            Self::MissingEndTag => "Element is missing end tag.",
            Self::InvalidEndTag => "Invalid end tag.",
        }
    }
}

/// A template error with its location
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} ({}:{})", .code.message(), .loc.line, .loc.column)]
pub struct TemplateError {
    pub code: ErrorCode,
    pub loc: Position,
}

impl TemplateError {
    pub const fn new(code: ErrorCode, loc: Position) -> Self {
        Self { code, loc }
    }
}

/// Fatal problem splitting a single-file component into blocks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} ({}:{})", .loc.line, .loc.column)]
pub struct SfcError {
    pub message: &'static str,
    pub loc: Position,
}
