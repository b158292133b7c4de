//! Comment attribution.
//!
//! Comments are collected once per source into a [`CommentTable`] sorted by
//! start offset. Attribution is a pure interval query: every comment lying
//! fully inside a window belongs to the node that ends the window.

use oxc_ast::ast::Comment;
use portrait_carton::String;

/// A comment with its cleaned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRange {
    /// Offset of the comment opener
    pub start: u32,
    /// Offset just past the comment closer
    pub end: u32,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct CommentTable {
    comments: Vec<CommentRange>,
}

impl CommentTable {
    /// Build from arbitrary ranges, sorting by start.
    pub fn new(mut comments: Vec<CommentRange>) -> Self {
        comments.sort_by_key(|c| c.start);
        Self { comments }
    }

    /// Collect the comments of a parsed script, in script coordinates.
    pub fn from_script(source: &str, comments: &[Comment]) -> Self {
        let ranges = comments
            .iter()
            .map(|comment| {
                let content = comment.content_span();
                let raw = &source[content.start as usize..content.end as usize];
                CommentRange {
                    start: comment.span.start,
                    end: comment.span.end,
                    text: if comment.is_block() {
                        clean_block_comment(raw)
                    } else {
                        String::from(raw.trim())
                    },
                }
            })
            .collect();
        Self::new(ranges)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Newline-joined text of every comment within `[start, end]`.
    pub fn between(&self, start: u32, end: u32) -> Option<String> {
        if start > end {
            return None;
        }
        let first = self.comments.partition_point(|c| c.start < start);
        let mut result: Option<String> = None;
        for comment in &self.comments[first..] {
            if comment.start >= end {
                break;
            }
            if comment.end > end || comment.text.is_empty() {
                continue;
            }
            match &mut result {
                Some(text) => {
                    text.push('\n');
                    text.push_str(&comment.text);
                }
                None => result = Some(comment.text.clone()),
            }
        }
        result
    }

    /// Comments attached directly above `start`.
    ///
    /// Walks backwards over comments separated from the node only by
    /// whitespace and declaration keywords, for nodes without a usable sibling.
    pub fn attached_before(&self, source: &str, start: u32) -> Option<String> {
        let upto = self.comments.partition_point(|c| c.end <= start);
        let mut cursor = start as usize;
        let mut first = upto;
        for (i, comment) in self.comments[..upto].iter().enumerate().rev() {
            let gap = source.get(comment.end as usize..cursor)?;
            if !is_declaration_gap(gap) {
                break;
            }
            first = i;
            cursor = comment.start as usize;
        }
        if first == upto {
            return None;
        }
        let start_offset = self.comments[first].start;
        self.between(start_offset, start)
    }
}

fn is_declaration_gap(gap: &str) -> bool {
    gap.split_whitespace()
        .all(|word| matches!(word, "const" | "let" | "var" | "export" | "async"))
}

/// Strip the leading `*` decoration from each line of a block comment body.
pub fn clean_block_comment(body: &str) -> String {
    let mut result = String::default();
    for line in body.lines() {
        let line = line.trim();
        let line = line.strip_prefix('*').unwrap_or(line).trim();
        if line.is_empty() {
            continue;
        }
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(line);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: u32, end: u32, text: &str) -> CommentRange {
        CommentRange {
            start,
            end,
            text: text.into(),
        }
    }

    #[test]
    fn test_clean_block_comment() {
        assert_eq!(clean_block_comment("*\n * Hello\n *   world\n "), "Hello\nworld");
        assert_eq!(clean_block_comment(" plain "), "plain");
    }

    #[test]
    fn test_between_window() {
        let table = CommentTable::new(vec![range(20, 30, "b"), range(0, 10, "a"), range(40, 50, "c")]);
        assert_eq!(table.between(0, 35).as_deref(), Some("a\nb"));
        assert_eq!(table.between(11, 35).as_deref(), Some("b"));
        assert_eq!(table.between(31, 39), None);
        // Partially covered comments are not attributed
        assert_eq!(table.between(0, 45).as_deref(), Some("a\nb"));
    }

    #[test]
    fn test_attached_before() {
        let source = "// one\n// two\nconst a = 1\n// three\n\nb()";
        let table = CommentTable::new(vec![range(0, 6, "one"), range(7, 13, "two"), range(26, 34, "three")]);
        // `a` starts after `const `
        assert_eq!(table.attached_before(source, 20).as_deref(), Some("one\ntwo"));
        assert_eq!(table.attached_before(source, 36).as_deref(), Some("three"));
        assert_eq!(table.attached_before(source, 0), None);
    }
}
