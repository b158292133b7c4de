//! Armature - The skeleton under the surface.
//!
//! Turns raw `.vue` source into the structures `portrait_relief` describes:
//!
//! - [`parse_sfc`] splits a file into template and script blocks
//! - [`parse_template`] builds a [`TemplateRoot`] from template markup
//!
//! The template side is a byte-scanning [`tokenizer`] driving a tree-building
//! [`parser`] through the [`tokenizer::Callbacks`] trait.

pub mod parser;
pub mod sfc;
pub mod tokenizer;

pub use parser::{parse_template, parse_template_with_options, Parser};
pub use portrait_relief::{TemplateError, TemplateParseOptions, TemplateRoot};
pub use sfc::parse_sfc;
