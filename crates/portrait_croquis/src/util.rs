//! Small AST helpers shared by the analyzers.

use oxc_ast::ast::{
    ArrowFunctionExpression, CallExpression, Expression, FormalParameters, Function, FunctionBody,
    ObjectExpression, PropertyKey, Statement,
};
use oxc_semantic::ScopeId;
use oxc_span::Span;
use portrait_carton::String;

/// Source text covered by `span`.
#[inline]
pub fn text(source: &str, span: Span) -> &str {
    source.get(span.start as usize..span.end as usize).unwrap_or_default()
}

/// Static name of a non-computed key, or a computed string literal key.
pub fn property_name(key: &PropertyKey<'_>) -> Option<String> {
    key.static_name().map(|name| String::from(name.as_ref()))
}

/// Value of a string literal or a template literal without substitutions.
pub fn string_value<'a>(expr: &Expression<'a>) -> Option<&'a str> {
    match expr.without_parentheses() {
        Expression::StringLiteral(lit) => Some(lit.value.as_str()),
        Expression::TemplateLiteral(lit) => lit.single_quasi().map(|quasi| quasi.as_str()),
        _ => None,
    }
}

/// Name of a plain identifier callee, `foo(...)`.
pub fn callee_ident<'a>(call: &CallExpression<'a>) -> Option<&'a str> {
    match call.callee.without_parentheses() {
        Expression::Identifier(ident) => Some(ident.name.as_str()),
        _ => None,
    }
}

/// Whether an expression is a constant literal that carries no state.
pub fn is_constant_literal(expr: &Expression<'_>) -> bool {
    match expr.without_parentheses() {
        Expression::BooleanLiteral(_)
        | Expression::NullLiteral(_)
        | Expression::NumericLiteral(_)
        | Expression::BigIntLiteral(_)
        | Expression::StringLiteral(_)
        | Expression::RegExpLiteral(_) => true,
        Expression::TemplateLiteral(lit) => lit.expressions.is_empty(),
        Expression::UnaryExpression(unary) => is_constant_literal(&unary.argument),
        _ => false,
    }
}

/// A function expression, arrow or declaration, seen uniformly.
#[derive(Debug, Clone, Copy)]
pub enum FunctionLike<'a> {
    Function(&'a Function<'a>),
    Arrow(&'a ArrowFunctionExpression<'a>),
}

impl<'a> FunctionLike<'a> {
    pub fn from_expression(expr: &'a Expression<'a>) -> Option<Self> {
        match expr.without_parentheses() {
            Expression::FunctionExpression(func) => Some(Self::Function(func)),
            Expression::ArrowFunctionExpression(arrow) => Some(Self::Arrow(arrow)),
            _ => None,
        }
    }

    pub fn params(self) -> &'a FormalParameters<'a> {
        match self {
            Self::Function(func) => &func.params,
            Self::Arrow(arrow) => &arrow.params,
        }
    }

    pub fn body(self) -> Option<&'a FunctionBody<'a>> {
        match self {
            Self::Function(func) => func.body.as_deref(),
            Self::Arrow(arrow) => Some(&arrow.body),
        }
    }

    pub fn scope_id(self) -> Option<ScopeId> {
        match self {
            Self::Function(func) => func.scope_id.get(),
            Self::Arrow(arrow) => arrow.scope_id.get(),
        }
    }

    /// The expression body of an arrow, or the first top-level `return` argument.
    pub fn returned(self) -> Option<&'a Expression<'a>> {
        if let Self::Arrow(arrow) = self {
            if arrow.expression {
                return arrow.get_expression();
            }
        }
        first_return(self.body()?)
    }
}

/// Argument of the first top-level `return` statement.
pub fn first_return<'a>(body: &'a FunctionBody<'a>) -> Option<&'a Expression<'a>> {
    body.statements.iter().find_map(|statement| match statement {
        Statement::ReturnStatement(ret) => Some(ret.argument.as_ref()),
        _ => None,
    })?
}

/// Object literal an expression evaluates to, directly or as a returned value.
pub fn object_or_returned_object<'a>(expr: &'a Expression<'a>) -> Option<&'a ObjectExpression<'a>> {
    match expr.without_parentheses() {
        Expression::ObjectExpression(object) => Some(object),
        other => match FunctionLike::from_expression(other)?.returned()?.without_parentheses() {
            Expression::ObjectExpression(object) => Some(object),
            _ => None,
        },
    }
}

/// Unwrap `defineComponent(x)`, `Vue.extend(x)` and `Vue.component('name', x)`.
pub fn unwrap_component_wrapper<'a>(expr: &'a Expression<'a>) -> &'a Expression<'a> {
    let Expression::CallExpression(call) = expr.without_parentheses() else {
        return expr;
    };
    let is_wrapper = match &call.callee {
        Expression::Identifier(ident) => ident.name == "defineComponent",
        Expression::StaticMemberExpression(member) => {
            member.object.is_specific_id("Vue") && matches!(member.property.name.as_str(), "extend" | "component")
        }
        _ => false,
    };
    if !is_wrapper {
        return expr;
    }
    match call.arguments.last().and_then(|argument| argument.as_expression()) {
        Some(inner) => unwrap_component_wrapper(inner),
        None => expr,
    }
}
