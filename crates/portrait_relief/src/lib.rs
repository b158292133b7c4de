//! Relief - The sculptured surface Portrait reads.
//!
//! Plain data types shared by the parser (`portrait_armature`) and the
//! extraction engine (`portrait_croquis`):
//!
//! - the template AST (elements, text, comments, interpolations)
//! - source positions
//! - the single-file-component descriptor
//! - template parse error codes

pub mod ast;
pub mod errors;
pub mod options;
pub mod sfc;

pub use ast::*;
pub use errors::{ErrorCode, SfcError, TemplateError};
pub use options::TemplateParseOptions;
pub use sfc::{SfcBlock, SfcDescriptor};
