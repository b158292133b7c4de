//! Template AST node types.
//!
//! The tree is owned and mirrors the markup 1:1. Comments and whitespace-only
//! text are kept; deciding what to drop is the consumer's job.

use portrait_carton::String;
use serde::Serialize;

/// Node type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum NodeType {
    Root = 0,
    Element = 1,
    Text = 2,
    Comment = 3,
    Interpolation = 5,
    Attribute = 6,
}

/// Source position in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub struct Position {
    /// Byte offset from start of file
    pub offset: u32,
    /// 1-indexed line number
    pub line: u32,
    /// 1-indexed column number
    pub column: u32,
}

impl Position {
    pub const fn new(offset: u32, line: u32, column: u32) -> Self {
        Self {
            offset,
            line,
            column,
        }
    }

    /// Translate a position computed relative to a block into file coordinates.
    pub const fn relative_to(self, base: Position) -> Self {
        let column = if self.line == 1 {
            base.column + self.column - 1
        } else {
            self.column
        };
        Self {
            offset: base.offset + self.offset,
            line: base.line + self.line - 1,
            column,
        }
    }
}

/// Source location span [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
}

impl SourceLocation {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    #[inline]
    pub const fn start_offset(&self) -> u32 {
        self.start.offset
    }

    #[inline]
    pub const fn end_offset(&self) -> u32 {
        self.end.offset
    }
}

/// Root of a parsed template
#[derive(Debug, Default)]
pub struct TemplateRoot {
    pub children: Vec<TemplateChild>,
    pub loc: SourceLocation,
}

/// All template child node types
#[derive(Debug)]
pub enum TemplateChild {
    Element(Box<ElementNode>),
    Text(TextNode),
    Comment(CommentNode),
    Interpolation(InterpolationNode),
}

impl TemplateChild {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Element(_) => NodeType::Element,
            Self::Text(_) => NodeType::Text,
            Self::Comment(_) => NodeType::Comment,
            Self::Interpolation(_) => NodeType::Interpolation,
        }
    }

    pub fn loc(&self) -> &SourceLocation {
        match self {
            Self::Element(n) => &n.loc,
            Self::Text(n) => &n.loc,
            Self::Comment(n) => &n.loc,
            Self::Interpolation(n) => &n.loc,
        }
    }
}

/// Element node
#[derive(Debug)]
pub struct ElementNode {
    /// Tag as written in the source
    pub tag: String,
    pub attrs: Vec<AttributeNode>,
    pub children: Vec<TemplateChild>,
    pub is_self_closing: bool,
    /// Whole element, from `<` to the end of the closing tag
    pub loc: SourceLocation,
    /// Opening tag only, `<tag ...>`
    pub open_tag_loc: SourceLocation,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>, loc: SourceLocation) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            is_self_closing: false,
            loc,
            open_tag_loc: loc,
        }
    }

    /// Find a plain or bound attribute by its raw name.
    pub fn find_attr(&self, name: &str) -> Option<&AttributeNode> {
        self.attrs.iter().find(|a| a.name == name)
    }
}

/// Attribute node. Directive syntax (`:x`, `@x`, `v-x`, `#x`) is kept in `name`.
#[derive(Debug, Clone)]
pub struct AttributeNode {
    pub name: String,
    pub name_loc: SourceLocation,
    pub value: Option<String>,
    pub value_loc: Option<SourceLocation>,
    pub loc: SourceLocation,
}

/// Text node
#[derive(Debug)]
pub struct TextNode {
    pub content: String,
    pub loc: SourceLocation,
}

/// Comment node
#[derive(Debug)]
pub struct CommentNode {
    pub content: String,
    pub loc: SourceLocation,
}

/// Interpolation node (`{{ expr }}`)
#[derive(Debug)]
pub struct InterpolationNode {
    pub content: String,
    pub content_loc: SourceLocation,
    pub loc: SourceLocation,
}
