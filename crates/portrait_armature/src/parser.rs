//! Template parser.
//!
//! Drives the tokenizer and assembles a [`TemplateRoot`]. Nothing is dropped
//! or condensed here: whitespace text and comments stay in the tree with their
//! exact locations, since comment attribution downstream depends on them.

use memchr::memchr_iter;
use portrait_carton::{is_void_tag, String};
use portrait_relief::{
    AttributeNode, CommentNode, ElementNode, ErrorCode, InterpolationNode, Position,
    SourceLocation, TemplateChild, TemplateError, TemplateParseOptions, TemplateRoot, TextNode,
};

use crate::tokenizer::{Callbacks, QuoteType, Tokenizer};

/// Parse a template with default options.
pub fn parse_template(source: &str) -> (TemplateRoot, Vec<TemplateError>) {
    Parser::new(source).parse()
}

/// Parse a template with custom delimiters or a file base position.
pub fn parse_template_with_options(
    source: &str,
    options: TemplateParseOptions,
) -> (TemplateRoot, Vec<TemplateError>) {
    Parser::with_options(source, options).parse()
}

/// Parser context for building the tree
pub struct Parser<'a> {
    source: &'a str,
    options: TemplateParseOptions,
    /// Open elements, innermost last
    stack: Vec<ElementNode>,
    root: TemplateRoot,
    current_element: Option<ElementNode>,
    current_attr: Option<CurrentAttribute>,
    errors: Vec<TemplateError>,
    /// Newline offsets for line/column calculation
    newlines: Vec<usize>,
}

/// Attribute being parsed
struct CurrentAttribute {
    name: String,
    name_start: usize,
    name_end: usize,
    value: Option<(usize, usize)>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_options(source, TemplateParseOptions::default())
    }

    pub fn with_options(source: &'a str, options: TemplateParseOptions) -> Self {
        Self {
            source,
            options,
            stack: Vec::new(),
            root: TemplateRoot::default(),
            current_element: None,
            current_attr: None,
            errors: Vec::new(),
            newlines: memchr_iter(b'\n', source.as_bytes()).collect(),
        }
    }

    /// Parse the source and return the tree with any recovered errors
    pub fn parse(mut self) -> (TemplateRoot, Vec<TemplateError>) {
        self.root.loc = self.loc(0, self.source.len());

        let delimiter_open = self.options.delimiters.0.clone();
        let delimiter_close = self.options.delimiters.1.clone();
        let source = self.source;

        Tokenizer::with_delimiters(
            source,
            ParserCallbacks { parser: &mut self },
            delimiter_open.as_bytes(),
            delimiter_close.as_bytes(),
        )
        .tokenize();

        (self.root, self.errors)
    }

    /// Position of a byte offset, in file coordinates
    fn pos(&self, index: usize) -> Position {
        let line = match self.newlines.binary_search(&index) {
            Ok(i) => i + 1,
            Err(i) => i + 1,
        };

        let column = if line == 1 {
            index + 1
        } else {
            index - self.newlines[line - 2]
        };

        Position::new(index as u32, line as u32, column as u32).relative_to(self.options.base)
    }

    fn loc(&self, start: usize, end: usize) -> SourceLocation {
        SourceLocation::new(self.pos(start), self.pos(end))
    }

    fn push_child(&mut self, child: TemplateChild) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(child),
            None => self.root.children.push(child),
        }
    }

    fn error(&mut self, code: ErrorCode, index: usize) {
        self.error_at(code, self.pos(index));
    }

    /// Report at a position already in file coordinates.
    fn error_at(&mut self, code: ErrorCode, loc: Position) {
        let err = TemplateError::new(code, loc);
        tracing::warn!("template: {}", err);
        self.errors.push(err);
    }

    fn close_element(&mut self, mut element: ElementNode, end: usize) {
        element.loc.end = self.pos(end);
        self.push_child(TemplateChild::Element(Box::new(element)));
    }

    fn on_text(&mut self, start: usize, end: usize) {
        let node = TextNode {
            content: String::from(&self.source[start..end]),
            loc: self.loc(start, end),
        };
        self.push_child(TemplateChild::Text(node));
    }

    fn on_interpolation(&mut self, start: usize, end: usize) {
        let open = self.options.delimiters.0.len();
        let close = self.options.delimiters.1.len();
        let node = InterpolationNode {
            content: String::from(&self.source[start..end]),
            content_loc: self.loc(start, end),
            loc: self.loc(start - open, end + close),
        };
        self.push_child(TemplateChild::Interpolation(node));
    }

    fn on_open_tag_name(&mut self, start: usize, end: usize) {
        // `start` is the first name byte; the element starts at `<`
        let loc = self.loc(start - 1, end);
        self.current_element = Some(ElementNode::new(&self.source[start..end], loc));
    }

    fn on_open_tag_end(&mut self, end: usize) {
        let Some(mut element) = self.current_element.take() else {
            return;
        };
        element.open_tag_loc.end = self.pos(end + 1);

        if is_void_tag(&element.tag) {
            self.close_element(element, end + 1);
        } else {
            self.stack.push(element);
        }
    }

    fn on_self_closing_tag(&mut self, end: usize) {
        let Some(mut element) = self.current_element.take() else {
            return;
        };
        element.is_self_closing = true;
        element.open_tag_loc.end = self.pos(end + 1);
        self.close_element(element, end + 1);
    }

    fn on_close_tag(&mut self, start: usize, end: usize, gt: usize) {
        let name = &self.source[start..end];
        let Some(depth) = self
            .stack
            .iter()
            .rposition(|el| el.tag.eq_ignore_ascii_case(name))
        else {
            self.error(ErrorCode::InvalidEndTag, start);
            return;
        };

        // `start` is after `</`
        let close_start = start - 2;
        while self.stack.len() > depth + 1 {
            if let Some(unclosed) = self.stack.pop() {
                self.error_at(ErrorCode::MissingEndTag, unclosed.loc.start);
                self.close_element(unclosed, close_start);
            }
        }
        if let Some(element) = self.stack.pop() {
            self.close_element(element, gt + 1);
        }
    }

    fn on_attrib_name(&mut self, start: usize, end: usize) {
        self.current_attr = Some(CurrentAttribute {
            name: String::from(&self.source[start..end]),
            name_start: start,
            name_end: end,
            value: None,
        });
    }

    fn on_attrib_data(&mut self, start: usize, end: usize) {
        if let Some(attr) = self.current_attr.as_mut() {
            attr.value = Some((start, end));
        }
    }

    fn on_attrib_end(&mut self, quote: QuoteType, end: usize) {
        let Some(attr) = self.current_attr.take() else {
            return;
        };
        let attr_end = match quote {
            QuoteType::Single | QuoteType::Double => end + 1,
            QuoteType::NoValue | QuoteType::Unquoted => end,
        };
        let node = AttributeNode {
            name: attr.name,
            name_loc: self.loc(attr.name_start, attr.name_end),
            value: attr
                .value
                .map(|(start, end)| String::from(&self.source[start..end])),
            value_loc: attr.value.map(|(start, end)| self.loc(start, end)),
            loc: self.loc(attr.name_start, attr_end),
        };
        if let Some(element) = self.current_element.as_mut() {
            element.attrs.push(node);
        }
    }

    fn on_comment(&mut self, start: usize, end: usize) {
        // Body range excludes `<!--` and `-->`
        let node_end = (end + 3).min(self.source.len());
        let node = CommentNode {
            content: String::from(&self.source[start..end]),
            loc: self.loc(start.saturating_sub(4), node_end),
        };
        self.push_child(TemplateChild::Comment(node));
    }

    fn on_end(&mut self) {
        let len = self.source.len();
        while let Some(element) = self.stack.pop() {
            self.error_at(ErrorCode::MissingEndTag, element.loc.start);
            self.close_element(element, len);
        }
    }
}

/// Adapter handing tokenizer events to the parser
struct ParserCallbacks<'p, 'a> {
    parser: &'p mut Parser<'a>,
}

impl Callbacks for ParserCallbacks<'_, '_> {
    fn on_text(&mut self, start: usize, end: usize) {
        self.parser.on_text(start, end);
    }

    fn on_interpolation(&mut self, start: usize, end: usize) {
        self.parser.on_interpolation(start, end);
    }

    fn on_open_tag_name(&mut self, start: usize, end: usize) {
        self.parser.on_open_tag_name(start, end);
    }

    fn on_open_tag_end(&mut self, end: usize) {
        self.parser.on_open_tag_end(end);
    }

    fn on_self_closing_tag(&mut self, end: usize) {
        self.parser.on_self_closing_tag(end);
    }

    fn on_close_tag(&mut self, start: usize, end: usize, gt: usize) {
        self.parser.on_close_tag(start, end, gt);
    }

    fn on_attrib_name(&mut self, start: usize, end: usize) {
        self.parser.on_attrib_name(start, end);
    }

    fn on_attrib_data(&mut self, start: usize, end: usize) {
        self.parser.on_attrib_data(start, end);
    }

    fn on_attrib_end(&mut self, quote: QuoteType, end: usize) {
        self.parser.on_attrib_end(quote, end);
    }

    fn on_comment(&mut self, start: usize, end: usize) {
        self.parser.on_comment(start, end);
    }

    fn on_end(&mut self) {
        self.parser.on_end();
    }

    fn on_error(&mut self, code: ErrorCode, index: usize) {
        self.parser.error(code, index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portrait_relief::NodeType;

    fn element(child: &TemplateChild) -> &ElementNode {
        match child {
            TemplateChild::Element(el) => el,
            other => panic!("expected element, got {:?}", other.node_type()),
        }
    }

    #[test]
    fn test_parse_nested_elements() {
        let (root, errors) = parse_template("<div><span>hi</span><br></div>");
        assert!(errors.is_empty());
        assert_eq!(root.children.len(), 1);

        let div = element(&root.children[0]);
        assert_eq!(div.tag, "div");
        assert_eq!(div.children.len(), 2);
        assert_eq!(div.open_tag_loc.end.offset, 5);
        assert_eq!(div.loc.end.offset, 30);

        let span = element(&div.children[0]);
        assert_eq!(span.children[0].node_type(), NodeType::Text);
        assert_eq!(element(&div.children[1]).tag, "br");
    }

    #[test]
    fn test_parse_keeps_comments_and_whitespace() {
        let (root, _) = parse_template("<div>\n  <!--c-->\n  <span/>\n</div>");
        let div = element(&root.children[0]);
        let kinds: Vec<_> = div.children.iter().map(|c| c.node_type()).collect();
        assert_eq!(
            kinds,
            [
                NodeType::Text,
                NodeType::Comment,
                NodeType::Text,
                NodeType::Element,
                NodeType::Text,
            ]
        );
        match &div.children[1] {
            TemplateChild::Comment(c) => {
                assert_eq!(c.content, "c");
                assert_eq!(c.loc.start.offset, 8);
                assert_eq!(c.loc.end.offset, 16);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_attributes() {
        let (root, _) = parse_template(r#"<my-comp v-for="(a, i) in list" :x="y | f" @click="go" flag/>"#);
        let comp = element(&root.children[0]);
        assert!(comp.is_self_closing);
        let names: Vec<_> = comp.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["v-for", ":x", "@click", "flag"]);
        assert_eq!(
            comp.find_attr("v-for").and_then(|a| a.value.as_deref()),
            Some("(a, i) in list")
        );
        assert_eq!(comp.find_attr("flag").and_then(|a| a.value.as_deref()), None);
    }

    #[test]
    fn test_parse_interpolation_location() {
        let (root, _) = parse_template("<p>{{ msg }}</p>");
        let p = element(&root.children[0]);
        match &p.children[0] {
            TemplateChild::Interpolation(i) => {
                assert_eq!(i.content, " msg ");
                assert_eq!(i.loc.start.offset, 3);
                assert_eq!(i.loc.end.offset, 12);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_base_position() {
        let options = TemplateParseOptions {
            base: Position::new(10, 2, 11),
            ..Default::default()
        };
        let (root, _) = parse_template_with_options("\n<div></div>", options);
        let div = element(&root.children[1]);
        assert_eq!(div.loc.start, Position::new(11, 3, 1));
    }

    #[test]
    fn test_parse_unclosed_element() {
        let (root, errors) = parse_template("<div><span></div>");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::MissingEndTag);
        let div = element(&root.children[0]);
        assert_eq!(element(&div.children[0]).tag, "span");
    }

    #[test]
    fn test_unclosed_element_error_uses_base() {
        let options = TemplateParseOptions {
            base: Position::new(10, 2, 11),
            ..Default::default()
        };
        let (_, errors) = parse_template_with_options("<div><span></div>", options.clone());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].loc, Position::new(15, 2, 16));

        let (_, errors) = parse_template_with_options("\n<p>", options);
        assert_eq!(errors[0].code, ErrorCode::MissingEndTag);
        assert_eq!(errors[0].loc, Position::new(11, 3, 1));
    }
}
