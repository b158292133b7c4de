//! Extraction errors.
//!
//! Only a failed parse aborts a file. Everything else degrades the affected
//! entry and is reported through `tracing`.

use oxc_diagnostics::OxcDiagnostic;
use portrait_relief::{Position, SfcError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("{path}:{line}:{column}: failed to parse script: {message}")]
    ScriptParse {
        path: String,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("{path}:{line}:{column}: failed to parse template: {message}")]
    TemplateParse {
        path: String,
        line: u32,
        column: u32,
        message: String,
    },

    #[error("invalid metadata code: {0}")]
    ReadError(String),
}

impl ExtractError {
    /// Script parse error from the first diagnostic. `base` is where the
    /// script block starts in the file.
    pub(crate) fn script(path: &str, block: &str, base: Position, diagnostics: &[OxcDiagnostic]) -> Self {
        let Some(diagnostic) = diagnostics.first() else {
            return Self::ScriptParse {
                path: path.to_string(),
                line: base.line,
                column: base.column,
                message: "unrecoverable syntax error".to_string(),
            };
        };
        let offset = diagnostic
            .labels
            .as_ref()
            .and_then(|labels| labels.first())
            .map_or(0, |label| label.offset());
        let position = position_at(block, offset).relative_to(base);
        Self::ScriptParse {
            path: path.to_string(),
            line: position.line,
            column: position.column,
            message: diagnostic.message.to_string(),
        }
    }

    pub(crate) fn sfc(path: &str, error: &SfcError) -> Self {
        Self::TemplateParse {
            path: path.to_string(),
            line: error.loc.line,
            column: error.loc.column,
            message: error.message.to_string(),
        }
    }

    /// 1-based `(line, column)` of a parse error.
    #[inline]
    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            Self::ScriptParse { line, column, .. } | Self::TemplateParse { line, column, .. } => {
                Some((*line, *column))
            }
            Self::ReadError(_) => None,
        }
    }
}

/// 1-based line and column of a byte offset.
fn position_at(source: &str, offset: usize) -> Position {
    let offset = offset.min(source.len());
    let before = source.get(..offset).unwrap_or_default();
    let line = before.matches('\n').count() as u32 + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() as u32 + 1;
    Position::new(offset as u32, line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at() {
        let source = "ab\ncd\nef";
        assert_eq!(position_at(source, 0), Position::new(0, 1, 1));
        assert_eq!(position_at(source, 4), Position::new(4, 2, 2));
        assert_eq!(position_at(source, 100), Position::new(8, 3, 3));
    }

    #[test]
    fn test_display() {
        let err = ExtractError::ScriptParse {
            path: "src/App.vue".to_string(),
            line: 3,
            column: 7,
            message: "Unexpected token".to_string(),
        };
        assert_eq!(err.to_string(), "src/App.vue:3:7: failed to parse script: Unexpected token");
        assert_eq!(err.position(), Some((3, 7)));
    }
}
