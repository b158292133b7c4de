//! Destructuring pattern flattening.

use oxc_ast::ast::{BindingIdentifier, BindingPattern, Expression};
use portrait_carton::String;

/// One name bound by a pattern.
#[derive(Debug, Clone, Copy)]
pub struct PatternLeaf<'n, 'a> {
    pub name: &'a str,
    pub node: &'n BindingIdentifier<'a>,
    /// `= expr` default directly applied to this leaf
    pub default: Option<&'n Expression<'a>>,
}

/// Leaf names of any pattern, in source order.
pub fn flatten_pattern<'n, 'a>(pattern: &'n BindingPattern<'a>) -> Vec<PatternLeaf<'n, 'a>> {
    let mut leaves = Vec::new();
    collect(pattern, None, &mut leaves);
    leaves
}

fn collect<'n, 'a>(
    pattern: &'n BindingPattern<'a>,
    default: Option<&'n Expression<'a>>,
    leaves: &mut Vec<PatternLeaf<'n, 'a>>,
) {
    match pattern {
        BindingPattern::BindingIdentifier(ident) => leaves.push(PatternLeaf {
            name: ident.name.as_str(),
            node: ident,
            default,
        }),
        BindingPattern::AssignmentPattern(assign) => collect(&assign.left, Some(&assign.right), leaves),
        BindingPattern::ObjectPattern(object) => {
            for property in &object.properties {
                collect(&property.value, None, leaves);
            }
            if let Some(rest) = &object.rest {
                collect(&rest.argument, None, leaves);
            }
        }
        BindingPattern::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                collect(element, None, leaves);
            }
            if let Some(rest) = &array.rest {
                collect(&rest.argument, None, leaves);
            }
        }
    }
}

/// Top-level keys of an object pattern paired with their local leaf.
///
/// `{ a, b: renamed = 1 }` yields `("a", a)` and `("b", renamed)`.
pub fn object_pattern_keys<'n, 'a>(pattern: &'n BindingPattern<'a>) -> Vec<(String, PatternLeaf<'n, 'a>)> {
    let BindingPattern::ObjectPattern(object) = pattern else {
        return Vec::new();
    };
    object
        .properties
        .iter()
        .filter_map(|property| {
            let key = property.key.static_name()?;
            let leaf = match &property.value {
                BindingPattern::BindingIdentifier(_) | BindingPattern::AssignmentPattern(_) => {
                    flatten_pattern(&property.value).into_iter().next()?
                }
                _ => return None,
            };
            Some((String::from(key.as_ref()), leaf))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_ast::ast::Statement;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn with_pattern(source: &str, check: impl FnOnce(&BindingPattern)) {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();
        let Some(Statement::VariableDeclaration(decl)) = ret.program.body.first() else {
            panic!("expected a declaration");
        };
        check(&decl.declarations[0].id);
    }

    #[test]
    fn test_flatten_nested_pattern() {
        with_pattern("const { a, b: { c, d: [e, , f = 1] }, ...rest } = x", |pattern| {
            let names: Vec<_> = flatten_pattern(pattern).iter().map(|leaf| leaf.name).collect();
            assert_eq!(names, ["a", "c", "e", "f", "rest"]);
        });
    }

    #[test]
    fn test_leaf_default() {
        with_pattern("const [a = 1, b] = x", |pattern| {
            let leaves = flatten_pattern(pattern);
            assert!(leaves[0].default.is_some());
            assert!(leaves[1].default.is_none());
        });
    }

    #[test]
    fn test_object_pattern_keys() {
        with_pattern("const { a, b: renamed = 2, c: { d } } = x", |pattern| {
            let keys: Vec<_> = object_pattern_keys(pattern)
                .into_iter()
                .map(|(key, leaf)| (key, leaf.name))
                .collect();
            assert_eq!(keys, [(String::from("a"), "a"), (String::from("b"), "renamed")]);
        });
    }
}
