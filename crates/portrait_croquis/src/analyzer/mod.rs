//! Style analyzers.
//!
//! One analyzer per authoring style, each a function from an AST subtree to a
//! [`ComponentMetadata`] delta:
//!
//! - [`options`]: configuration objects (`export default { ... }`)
//! - [`class`]: annotated classes (`@Component class X extends Vue`)
//! - [`setup`]: setup functions and `<script setup>` blocks
//!
//! All of them share an [`AnalysisContext`] for source text, comments,
//! declaration lookup and type inference.

pub mod class;
pub mod options;
pub mod setup;

use oxc_ast::ast::{Argument, CallExpression, Expression, ObjectExpression, ObjectPropertyKind};
use oxc_ast_visit::{walk, Visit};
use oxc_span::{GetSpan, Span};
use portrait_carton::{FxHashSet, String};

use crate::comment::CommentTable;
use crate::infer::TypeInferencer;
use crate::metadata::{ComponentMetadata, EmitEntry, MetadataBuilder, TypeTag};
use crate::resolve::Resolve;
use crate::util::{self, string_value};

pub use class::analyze_class;
pub use options::analyze_options;
pub use setup::{analyze_setup_block, analyze_setup_function};

/// Everything an analyzer reads besides the node it analyzes.
pub struct AnalysisContext<'r, 'a> {
    /// Script source the AST spans point into
    pub source: &'a str,
    pub comments: &'r CommentTable,
    pub resolver: &'r dyn Resolve<'a>,
    pub types: TypeInferencer<'r, 'a>,
}

impl<'r, 'a> AnalysisContext<'r, 'a> {
    pub fn new(source: &'a str, comments: &'r CommentTable, resolver: &'r dyn Resolve<'a>) -> Self {
        Self {
            source,
            comments,
            resolver,
            types: TypeInferencer::new(resolver),
        }
    }

    #[inline]
    pub fn text(&self, span: Span) -> &'a str {
        util::text(self.source, span)
    }

    /// Comments between a previous sibling (or container start) and `span`.
    #[inline]
    pub fn comment_between(&self, window_start: u32, span: Span) -> Option<String> {
        self.comments.between(window_start, span.start)
    }

    /// Comments directly above `span`.
    #[inline]
    pub fn comment_above(&self, span: Span) -> Option<String> {
        self.comments.attached_before(self.source, span.start)
    }

    /// Source text of an expression, or `None` for `undefined`.
    pub fn value_text(&self, expr: &Expression<'a>) -> Option<String> {
        if expr.is_specific_id("undefined") {
            return None;
        }
        Some(String::from(self.text(expr.span())))
    }

    /// Argument types of an emit-style call, one tag set per position.
    pub fn argument_types(&self, arguments: &[Argument<'a>]) -> Vec<Vec<TypeTag>> {
        arguments
            .iter()
            .map(|argument| match argument.as_expression() {
                Some(expr) => self.types.expression(expr),
                None => Vec::new(),
            })
            .collect()
    }
}

/// Iterate the plain properties of an object literal with each one's leading comment.
///
/// The first window opens right after `{`; later ones after the previous property.
pub fn properties_with_comments<'o, 'a>(
    ctx: &AnalysisContext<'_, 'a>,
    object: &'o ObjectExpression<'a>,
) -> Vec<(String, &'o oxc_ast::ast::ObjectProperty<'a>, Option<String>)> {
    let mut result = Vec::with_capacity(object.properties.len());
    let mut window_start = object.span.start + 1;
    for property in &object.properties {
        let span = property.span();
        if let ObjectPropertyKind::ObjectProperty(prop) = property {
            if let Some(name) = util::property_name(&prop.key) {
                let comment = ctx.comment_between(window_start, span);
                result.push((name, &**prop, comment));
            } else {
                tracing::debug!("skipping computed key `{}`", ctx.text(prop.key.span()));
            }
        }
        window_start = span.end;
    }
    result
}

/// Collects `this.$emit('x', ...)`, `emit('x', ...)` and `ctx.emit('x', ...)`
/// calls into emit entries.
pub struct EmitCallCollector<'c, 'r, 'a> {
    ctx: &'c AnalysisContext<'r, 'a>,
    builder: &'c mut MetadataBuilder,
    /// Identifiers bound to an emit function
    emit_functions: FxHashSet<&'a str>,
    /// Identifiers whose `.emit` member emits
    emit_objects: FxHashSet<&'a str>,
}

impl<'c, 'r, 'a> EmitCallCollector<'c, 'r, 'a> {
    pub fn new(ctx: &'c AnalysisContext<'r, 'a>, builder: &'c mut MetadataBuilder) -> Self {
        Self {
            ctx,
            builder,
            emit_functions: FxHashSet::default(),
            emit_objects: FxHashSet::default(),
        }
    }

    pub fn with_emit_function(mut self, name: &'a str) -> Self {
        self.emit_functions.insert(name);
        self
    }

    pub fn with_emit_object(mut self, name: &'a str) -> Self {
        self.emit_objects.insert(name);
        self
    }

    fn is_emitter(&self, callee: &Expression<'a>) -> bool {
        match callee.without_parentheses() {
            Expression::Identifier(ident) => self.emit_functions.contains(ident.name.as_str()),
            Expression::StaticMemberExpression(member) => match &member.object {
                Expression::ThisExpression(_) => member.property.name == "$emit",
                Expression::Identifier(object) => {
                    member.property.name == "emit" && self.emit_objects.contains(object.name.as_str())
                }
                _ => false,
            },
            _ => false,
        }
    }
}

impl<'a> Visit<'a> for EmitCallCollector<'_, '_, 'a> {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if self.is_emitter(&it.callee) {
            let event = it.arguments.first().and_then(|arg| arg.as_expression()).and_then(string_value);
            match event {
                Some(event) => {
                    let entry = EmitEntry {
                        types: self.ctx.argument_types(&it.arguments[1..]),
                        comment: self.ctx.comment_above(it.span),
                        validator: None,
                    };
                    self.builder.add_emit(event, entry);
                }
                None => tracing::debug!("emit call with a dynamic event name at {}", it.span.start),
            }
        }
        walk::walk_call_expression(self, it);
    }
}

/// Run a closure over a fresh builder and return the delta it produced.
pub fn delta(analyze: impl FnOnce(&mut MetadataBuilder)) -> ComponentMetadata {
    let mut builder = MetadataBuilder::new();
    analyze(&mut builder);
    builder.finish()
}
