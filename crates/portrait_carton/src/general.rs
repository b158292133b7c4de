//! General string helpers shared across crates.

use compact_str::CompactString;
use phf::phf_set;

/// HTML elements that never have children or a closing tag.
static VOID_TAGS: phf::Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
};

/// Check if a tag is an HTML void element.
#[inline]
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(tag)
}

/// Convert `kebab-case` to `camelCase`.
pub fn camelize(s: &str) -> CompactString {
    let mut result = CompactString::with_capacity(s.len());
    let mut upper_next = false;

    for c in s.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Uppercase the first character.
pub fn capitalize(s: &str) -> CompactString {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut result = CompactString::with_capacity(s.len());
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
            result
        }
        None => CompactString::default(),
    }
}

/// Lowercase the first character.
pub fn uncapitalize(s: &str) -> CompactString {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut result = CompactString::with_capacity(s.len());
            result.extend(first.to_lowercase());
            result.push_str(chars.as_str());
            result
        }
        None => CompactString::default(),
    }
}

/// Convert `PascalCase` / `camelCase` to `kebab-case`.
///
/// Already-dashed names are returned lowercased and otherwise untouched.
pub fn hyphenate(s: &str) -> CompactString {
    let mut result = CompactString::with_capacity(s.len() + 4);
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            // An acronym stays one word until its last capital starts the next word.
            let word_start = i > 0
                && (chars[i - 1].is_ascii_lowercase()
                    || chars[i - 1].is_ascii_digit()
                    || (chars[i - 1].is_ascii_uppercase() && chars.get(i + 1).is_some_and(char::is_ascii_lowercase)));
            if word_start && !result.ends_with('-') {
                result.push('-');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Check if text is all whitespace.
#[inline]
pub fn is_whitespace_only(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace())
}

/// Collapse every whitespace run into a single space.
pub fn condense_whitespace(text: &str) -> CompactString {
    let mut result = CompactString::with_capacity(text.len());
    let mut prev_was_space = false;

    for c in text.chars() {
        if c.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            result.push(c);
            prev_was_space = false;
        }
    }

    result
}

/// Check if a string is a plain JavaScript identifier.
pub fn is_simple_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camelize() {
        assert_eq!(camelize("foo-bar"), "fooBar");
        assert_eq!(camelize("foo-bar-baz"), "fooBarBaz");
        assert_eq!(camelize("foo"), "foo");
    }

    #[test]
    fn test_hyphenate() {
        assert_eq!(hyphenate("MyButton"), "my-button");
        assert_eq!(hyphenate("fooBarBaz"), "foo-bar-baz");
        assert_eq!(hyphenate("my-button"), "my-button");
        assert_eq!(hyphenate("div"), "div");
    }

    #[test]
    fn test_hyphenate_acronyms() {
        assert_eq!(hyphenate("HTMLView"), "html-view");
        assert_eq!(hyphenate("MyHTMLView"), "my-html-view");
        assert_eq!(hyphenate("loadURL"), "load-url");
        assert_eq!(hyphenate("IO"), "io");
        assert_eq!(hyphenate("Step2Form"), "step2-form");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("mounted"), "Mounted");
        assert_eq!(uncapitalize("Mounted"), "mounted");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_condense_whitespace() {
        assert_eq!(condense_whitespace("  a \n\t b  "), " a b ");
        assert!(is_whitespace_only("\n  \t"));
        assert!(!is_whitespace_only(" a "));
    }

    #[test]
    fn test_void_tags() {
        assert!(is_void_tag("input"));
        assert!(is_void_tag("br"));
        assert!(!is_void_tag("div"));
    }

    #[test]
    fn test_is_simple_identifier() {
        assert!(is_simple_identifier("foo"));
        assert!(is_simple_identifier("$emit"));
        assert!(!is_simple_identifier("foo-bar"));
        assert!(!is_simple_identifier("1abc"));
        assert!(!is_simple_identifier(""));
    }
}
