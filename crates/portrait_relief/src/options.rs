//! Parser options.

use crate::ast::Position;
use portrait_carton::String;

/// Template parser options
#[derive(Debug, Clone)]
pub struct TemplateParseOptions {
    /// Custom delimiters for interpolation (default: `{{` / `}}`)
    pub delimiters: (String, String),
    /// File position of the first template byte; node locations are reported
    /// in file coordinates.
    pub base: Position,
}

impl Default for TemplateParseOptions {
    fn default() -> Self {
        Self {
            delimiters: (String::const_new("{{"), String::const_new("}}")),
            base: Position::new(0, 1, 1),
        }
    }
}
