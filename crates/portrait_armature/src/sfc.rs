//! Single-file-component block splitting.
//!
//! Byte-level scan over the top level of a `.vue` file. Only `<template>`,
//! `<script>` and `<script setup>` are kept; style and custom blocks are
//! skipped over by their closing tag.

use memchr::{memchr, memchr_iter};
use portrait_relief::{Position, SfcBlock, SfcDescriptor, SfcError, SourceLocation};

const TAG_TEMPLATE: &[u8] = b"template";
const TAG_SCRIPT: &[u8] = b"script";
const CLOSING_TEMPLATE: &[u8] = b"</template>";

/// Split a `.vue` source into its blocks.
pub fn parse_sfc<'a>(source: &'a str, filename: &str) -> Result<SfcDescriptor<'a>, SfcError> {
    let mut descriptor = SfcDescriptor {
        filename: filename.to_string(),
        source,
        ..Default::default()
    };

    let lines = LineIndex::new(source);
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut pos = 0;

    while pos < len {
        // Use memchr to find next '<' quickly
        let Some(next_lt) = memchr(b'<', &bytes[pos..]) else {
            break;
        };
        pos += next_lt;

        if bytes[pos..].starts_with(b"<!--") {
            pos = match find_bytes(bytes, pos + 4, b"-->") {
                Some(end) => end + 3,
                None => len,
            };
            continue;
        }

        let Some(block) = read_block(source, pos) else {
            pos += 1;
            continue;
        };

        let sfc_block = SfcBlock {
            content: &source[block.content_start..block.content_end],
            loc: SourceLocation::new(
                lines.position(block.content_start),
                lines.position(block.content_end),
            ),
            lang: block
                .attrs
                .iter()
                .find(|(key, _)| *key == "lang")
                .and_then(|(_, value)| *value),
            attrs: block.attrs,
        };

        if block.tag.eq_ignore_ascii_case(TAG_TEMPLATE) {
            if descriptor.template.is_some() {
                return Err(SfcError {
                    message: "SFC can only contain one <template> block",
                    loc: lines.position(pos),
                });
            }
            descriptor.template = Some(sfc_block);
        } else if block.tag.eq_ignore_ascii_case(TAG_SCRIPT) {
            let slot = if sfc_block.has_attr("setup") {
                &mut descriptor.script_setup
            } else {
                &mut descriptor.script
            };
            if slot.is_some() {
                return Err(SfcError {
                    message: "SFC can only contain one <script> block of each kind",
                    loc: lines.position(pos),
                });
            }
            *slot = Some(sfc_block);
        } else {
            tracing::trace!(
                "skipping <{}> block",
                String::from_utf8_lossy(block.tag)
            );
        }

        pos = block.end;
    }

    Ok(descriptor)
}

/// Offset to line/column conversion over precomputed newlines
struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        Self {
            newlines: memchr_iter(b'\n', source.as_bytes()).collect(),
        }
    }

    fn position(&self, offset: usize) -> Position {
        let line = self.newlines.partition_point(|&nl| nl < offset);
        let column = if line == 0 {
            offset + 1
        } else {
            offset - self.newlines[line - 1]
        };
        Position::new(offset as u32, line as u32 + 1, column as u32)
    }
}

struct RawBlock<'a> {
    tag: &'a [u8],
    attrs: Vec<(&'a str, Option<&'a str>)>,
    content_start: usize,
    content_end: usize,
    /// Offset just past the closing tag
    end: usize,
}

/// Read a block starting at `start` (which points at `<`).
fn read_block(source: &str, start: usize) -> Option<RawBlock<'_>> {
    let bytes = source.as_bytes();
    let len = bytes.len();

    let mut pos = start + 1;
    let tag_start = pos;
    while pos < len && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'-') {
        pos += 1;
    }
    if pos == tag_start {
        return None;
    }
    let tag = &bytes[tag_start..pos];

    let mut attrs = Vec::new();
    loop {
        while pos < len && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= len {
            return None;
        }
        match bytes[pos] {
            b'>' => {
                pos += 1;
                break;
            }
            b'/' if bytes.get(pos + 1) == Some(&b'>') => {
                // Self-closing block has no content
                return Some(RawBlock {
                    tag,
                    attrs,
                    content_start: pos + 2,
                    content_end: pos + 2,
                    end: pos + 2,
                });
            }
            _ => {}
        }

        let name_start = pos;
        while pos < len && !matches!(bytes[pos], b'=' | b'>' | b'/') && !bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos == name_start {
            pos += 1;
            continue;
        }
        let name = &source[name_start..pos];

        let mut value = None;
        if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            match bytes.get(pos) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    let value_start = pos + 1;
                    let value_end = memchr(quote, &bytes[value_start..])
                        .map_or(len, |i| value_start + i);
                    value = Some(&source[value_start..value_end]);
                    pos = (value_end + 1).min(len);
                }
                _ => {
                    let value_start = pos;
                    while pos < len && bytes[pos] != b'>' && !bytes[pos].is_ascii_whitespace() {
                        pos += 1;
                    }
                    value = Some(&source[value_start..pos]);
                }
            }
        }
        attrs.push((name, value));
    }

    let content_start = pos;
    let content_end = if tag.eq_ignore_ascii_case(TAG_TEMPLATE) {
        find_template_end(bytes, content_start)?
    } else {
        let mut closing = Vec::with_capacity(tag.len() + 3);
        closing.extend_from_slice(b"</");
        closing.extend_from_slice(tag);
        closing.push(b'>');
        find_bytes(bytes, content_start, &closing)?
    };
    let close_len = tag.len() + 3;

    Some(RawBlock {
        tag,
        attrs,
        content_start,
        content_end,
        end: content_end + close_len,
    })
}

/// Find the `</template>` that closes the block, skipping nested templates.
fn find_template_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut depth = 1;
    let mut pos = from;

    while let Some(offset) = memchr(b'<', &bytes[pos..]) {
        pos += offset;
        let rest = &bytes[pos..];
        if rest.starts_with(CLOSING_TEMPLATE) {
            depth -= 1;
            if depth == 0 {
                return Some(pos);
            }
            pos += CLOSING_TEMPLATE.len();
            continue;
        }
        if rest.len() > TAG_TEMPLATE.len() + 1
            && rest[1..].starts_with(TAG_TEMPLATE)
            && matches!(rest[TAG_TEMPLATE.len() + 1], b' ' | b'>' | b'\n' | b'\t' | b'\r')
        {
            let tag_end = memchr(b'>', rest).unwrap_or(rest.len());
            let self_closing = tag_end > 0 && rest[tag_end - 1] == b'/';
            if !self_closing {
                depth += 1;
            }
        }
        pos += 1;
    }

    None
}

fn find_bytes(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    let mut pos = from;
    while let Some(offset) = memchr(needle[0], &haystack[pos..]) {
        pos += offset;
        if haystack[pos..].starts_with(needle) {
            return Some(pos);
        }
        pos += 1;
    }
    None
}
