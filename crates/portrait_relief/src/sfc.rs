//! Single-file-component descriptor types.

use crate::ast::SourceLocation;

/// The blocks of one `.vue` file that matter for extraction.
///
/// Style and custom blocks are not represented.
#[derive(Debug, Default)]
pub struct SfcDescriptor<'a> {
    pub filename: std::string::String,
    pub source: &'a str,
    pub template: Option<SfcBlock<'a>>,
    pub script: Option<SfcBlock<'a>>,
    pub script_setup: Option<SfcBlock<'a>>,
}

/// One top-level block. `content` borrows from the file source.
#[derive(Debug, Clone)]
pub struct SfcBlock<'a> {
    pub content: &'a str,
    /// Location of `content` inside the file
    pub loc: SourceLocation,
    pub attrs: Vec<(&'a str, Option<&'a str>)>,
    pub lang: Option<&'a str>,
}

impl<'a> SfcBlock<'a> {
    pub fn attr(&self, name: &str) -> Option<Option<&'a str>> {
        self.attrs
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    #[inline]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}
