//! # portrait_croquis
//!
//! Croquis - The component metadata extraction engine for Portrait.
//!
//! ## Name Origin
//!
//! **Croquis** (/kʁɔ.ki/) is a French term for a quick, sketchy drawing that captures
//! the essential features of a subject. `portrait_croquis` sketches the public
//! shape of a component (its props, events, state, slots and template) without
//! ever running it.
//!
//! ## Purpose
//!
//! - **Classification**: Decide whether an export is a component, and in which style
//! - **Style Analysis**: Config objects, annotated classes, setup functions and blocks
//! - **Type Inference**: Runtime type tags from constructors, literals and annotations
//! - **Comment Attribution**: Attach the nearest leading comment to each entry
//! - **Template Walking**: Element tree, expressions, slots and implicit registrations
//! - **Code Generation**: An object literal that reads back into the same metadata
//!
//! ## Architecture
//!
//! ```text
//! portrait_armature (Template + SFC parse)     oxc (Script parse + semantic)
//!                 ↓                                       ↓
//!        portrait_relief (AST)                 classify → analyzer
//!                 ↓                                       ↓
//!              template ───────→ MetadataBuilder ←────────┘
//!                                        ↓
//!                              codegen ⇄ reader
//! ```

// Core modules
mod error;
mod extract;

// Analysis modules
pub mod analyzer;
pub mod classify;
pub mod codegen;
pub mod comment;
pub mod expression;
pub mod infer;
pub mod metadata;
pub mod pattern;
pub mod reader;
pub mod resolve;
pub mod template;
pub mod util;

pub use codegen::generate;
pub use error::ExtractError;
pub use extract::{extract_components, ExtractOptions, ExtractedComponent, DEFAULT_EXPORT};
pub use metadata::*;
pub use reader::read_metadata;

// Re-export for callers choosing a script dialect
pub use oxc_span::SourceType;

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    fn extract_export(source: &str, filename: &str, export_name: &str) -> ComponentMetadata {
        let options = ExtractOptions {
            filename: filename.to_string(),
            ..Default::default()
        };
        let components = extract_components(source, &options).unwrap();
        components
            .into_iter()
            .find(|component| component.export_name == export_name)
            .unwrap_or_else(|| panic!("no component exported as `{export_name}`"))
            .metadata
    }

    /// Metadata of the default export of a TypeScript module.
    pub fn with_default_export(source: &str) -> ComponentMetadata {
        extract_export(source, "test.ts", DEFAULT_EXPORT)
    }

    pub fn with_export(source: &str, export_name: &str) -> ComponentMetadata {
        extract_export(source, "test.ts", export_name)
    }

    /// Metadata of a `<script setup lang="ts">` block.
    pub fn with_setup_block(source: &str) -> ComponentMetadata {
        let sfc = format!("<script setup lang=\"ts\">\n{source}\n</script>\n");
        extract_export(&sfc, "test.vue", DEFAULT_EXPORT)
    }
}
