//! Classification of template-bound expressions.

use oxc_allocator::Allocator;
use oxc_ast::ast::Expression;
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use portrait_carton::{SmallVec, String};

use crate::metadata::{ExpressionInfo, ExpressionKind};
use crate::pattern::flatten_pattern;
use crate::util::text;

/// Classify a bound expression such as an attribute value or interpolation.
pub fn classify_expression(source: &str) -> ExpressionInfo {
    let segments = split_filters(source);
    if segments.len() > 1 {
        let mut info = ExpressionInfo::new(ExpressionKind::Filter);
        info.arguments.push(String::from(segments[0].trim()));
        for segment in &segments[1..] {
            let segment = segment.trim();
            let name = segment.split('(').next().unwrap_or(segment).trim();
            info.call_chain.push(String::from(name));
        }
        return info;
    }

    let allocator = Allocator::default();
    let source = source.trim();
    let Ok(expr) = Parser::new(&allocator, source, SourceType::ts()).parse_expression() else {
        tracing::trace!("unparsable template expression `{source}`");
        return ExpressionInfo::new(ExpressionKind::Expression);
    };
    classify_parsed(source, expr.without_parentheses())
}

fn classify_parsed(source: &str, expr: &Expression<'_>) -> ExpressionInfo {
    match expr {
        Expression::StringLiteral(_)
        | Expression::NumericLiteral(_)
        | Expression::BigIntLiteral(_)
        | Expression::BooleanLiteral(_)
        | Expression::NullLiteral(_)
        | Expression::RegExpLiteral(_) => ExpressionInfo::new(ExpressionKind::Literal),
        Expression::TemplateLiteral(lit) if lit.expressions.is_empty() => {
            ExpressionInfo::new(ExpressionKind::Literal)
        }
        Expression::Identifier(ident) if ident.name == "undefined" => {
            ExpressionInfo::new(ExpressionKind::Literal)
        }
        Expression::Identifier(_) => ExpressionInfo::new(ExpressionKind::Identifier),
        Expression::StaticMemberExpression(_)
        | Expression::ComputedMemberExpression(_)
        | Expression::PrivateFieldExpression(_) => ExpressionInfo::new(ExpressionKind::Member),
        Expression::CallExpression(_) => {
            let mut info = ExpressionInfo::new(ExpressionKind::Call);
            collect_call_chain(source, expr, &mut info);
            info
        }
        _ => ExpressionInfo::new(ExpressionKind::Expression),
    }
}

/// `f(g(x))` yields chain `[g, f]` and arguments `[x]`. Calls with several
/// arguments stop the chain and keep each argument as text.
fn collect_call_chain(source: &str, expr: &Expression<'_>, info: &mut ExpressionInfo) {
    let Expression::CallExpression(call) = expr.without_parentheses() else {
        return;
    };

    match call.arguments.as_slice() {
        [single] if matches!(single.as_expression(), Some(Expression::CallExpression(_))) => {
            if let Some(inner) = single.as_expression() {
                collect_call_chain(source, inner, info);
            }
        }
        arguments => {
            info.arguments = arguments
                .iter()
                .map(|argument| String::from(text(source, argument.span()).trim()))
                .collect();
        }
    }
    info.call_chain.push(String::from(text(source, call.callee.span()).trim()));
}

/// Split on top-level `|`, leaving `||` and nested or quoted pipes alone.
pub fn split_filters(source: &str) -> SmallVec<[&str; 4]> {
    let bytes = source.as_bytes();
    let mut segments = SmallVec::new();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if let Some(q) = quote {
            if c == b'\\' {
                i += 1;
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'\'' | b'"' | b'`' => quote = Some(c),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'|' if bytes.get(i + 1) == Some(&b'|') => i += 1,
            b'|' if depth == 0 && (i == 0 || bytes[i - 1] != b'|') => {
                segments.push(&source[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    segments.push(&source[start..]);
    segments
}

/// Parse a `v-for` value: `(item, index) in list` or `item of list`.
pub fn classify_loop(source: &str) -> ExpressionInfo {
    let mut info = ExpressionInfo::new(ExpressionKind::Loop);
    let Some((alias, iterated)) = split_loop(source) else {
        return info;
    };
    let alias = alias.trim();
    let alias = alias
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(alias);
    info.scope = parameter_names(alias);
    info.source = Some(String::from(iterated.trim()));
    info
}

fn split_loop(source: &str) -> Option<(&str, &str)> {
    [" in ", " of "]
        .iter()
        .filter_map(|separator| source.find(separator).map(|at| (at, separator.len())))
        .min_by_key(|(at, _)| *at)
        .map(|(at, len)| (&source[..at], &source[at + len..]))
}

/// Parse a slot scope such as `{ item, index }` or `props`.
pub fn classify_scope(source: &str) -> ExpressionInfo {
    let mut info = ExpressionInfo::new(ExpressionKind::Scope);
    info.scope = parameter_names(source.trim());
    info
}

/// Leaf names of a parameter list, parsed as the parameters of an arrow.
fn parameter_names(params: &str) -> Vec<String> {
    let allocator = Allocator::default();
    let wrapped = format!("({params}) => 0");
    let Ok(expr) = Parser::new(&allocator, &wrapped, SourceType::ts()).parse_expression() else {
        tracing::trace!("unparsable scope parameters `{params}`");
        return Vec::new();
    };
    let Expression::ArrowFunctionExpression(arrow) = &expr else {
        return Vec::new();
    };

    let mut names = Vec::new();
    for param in &arrow.params.items {
        names.extend(flatten_pattern(&param.pattern).iter().map(|leaf| String::from(leaf.name)));
    }
    if let Some(rest) = &arrow.params.rest {
        names.extend(
            flatten_pattern(&rest.rest.argument)
                .iter()
                .map(|leaf| String::from(leaf.name)),
        );
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| String::from(*s)).collect()
    }

    #[test]
    fn test_classify_simple_kinds() {
        assert_eq!(classify_expression("'x'").kind, ExpressionKind::Literal);
        assert_eq!(classify_expression("42").kind, ExpressionKind::Literal);
        assert_eq!(classify_expression("count").kind, ExpressionKind::Identifier);
        assert_eq!(classify_expression("user.name").kind, ExpressionKind::Member);
        assert_eq!(classify_expression("items[0]").kind, ExpressionKind::Member);
        assert_eq!(classify_expression("a + b").kind, ExpressionKind::Expression);
        assert_eq!(classify_expression("a ||").kind, ExpressionKind::Expression);
    }

    #[test]
    fn test_call_chain_application_order() {
        let info = classify_expression("format(trim(name))");
        assert_eq!(info.kind, ExpressionKind::Call);
        assert_eq!(info.call_chain, strings(&["trim", "format"]));
        assert_eq!(info.arguments, strings(&["name"]));
    }

    #[test]
    fn test_multi_argument_call_keeps_arguments() {
        let info = classify_expression("pick(user, 'name')");
        assert_eq!(info.call_chain, strings(&["pick"]));
        assert_eq!(info.arguments, strings(&["user", "'name'"]));
    }

    #[test]
    fn test_filter_pipeline_order() {
        let info = classify_expression("propA | filterA | filterB");
        assert_eq!(info.kind, ExpressionKind::Filter);
        assert_eq!(info.call_chain, strings(&["filterA", "filterB"]));
        assert_eq!(info.arguments, strings(&["propA"]));
    }

    #[test]
    fn test_logical_or_is_not_a_filter() {
        assert_eq!(split_filters("a || b").as_slice(), ["a || b"]);
        assert_eq!(split_filters("f('|') | g").as_slice(), ["f('|') ", " g"]);
        assert_eq!(classify_expression("a || b").kind, ExpressionKind::Expression);
    }

    #[test]
    fn test_loop_expression() {
        let info = classify_loop("({ id, label }, index) in items");
        assert_eq!(info.kind, ExpressionKind::Loop);
        assert_eq!(info.scope, strings(&["id", "label", "index"]));
        assert_eq!(info.source.as_deref(), Some("items"));

        let info = classify_loop("n of 10");
        assert_eq!(info.scope, strings(&["n"]));
        assert_eq!(info.source.as_deref(), Some("10"));
    }

    #[test]
    fn test_scope_expression() {
        let info = classify_scope("{ item, meta: { index } }");
        assert_eq!(info.kind, ExpressionKind::Scope);
        assert_eq!(info.scope, strings(&["item", "index"]));
        assert_eq!(classify_scope("props").scope, strings(&["props"]));
    }
}
