//! Coarse runtime-type inference.
//!
//! Maps type annotations and expression shapes to [`TypeTag`]s. Anything that
//! cannot be pinned down yields [`TypeTag::Null`], meaning "no runtime check".

use oxc_ast::ast::{
    BinaryOperator, Expression, TSLiteral, TSSignature, TSType, TSTypeName, TSTypeOperatorOperator,
    TSTypeReference, UnaryOperator,
};
use portrait_carton::FxHashSet;

use crate::metadata::{union_tags, TypeTag};
use crate::resolve::{Binding, Resolve};
use crate::util::FunctionLike;

/// Identifier chains deeper than this are not followed.
const MAX_DEPTH: u32 = 8;

/// Tag for a built-in type or constructor name.
fn builtin_tag(name: &str) -> Option<TypeTag> {
    Some(match name {
        "String" => TypeTag::String,
        "Number" | "BigInt" => TypeTag::Number,
        "Boolean" => TypeTag::Boolean,
        "Array" | "ReadonlyArray" => TypeTag::Array,
        "Function" | "CallableFunction" | "NewableFunction" => TypeTag::Function,
        "RegExp" => TypeTag::RegExp,
        "Object" | "Record" | "Partial" | "Required" | "Readonly" | "Pick" | "Omit" | "Set"
        | "ReadonlySet" | "WeakSet" | "Map" | "ReadonlyMap" | "WeakMap" | "Date" | "Promise"
        | "Error" => TypeTag::Object,
        _ => return None,
    })
}

/// Generic wrappers whose runtime shape is their first type argument.
fn is_transparent_wrapper(name: &str) -> bool {
    matches!(name, "PropType" | "NonNullable")
}

pub struct TypeInferencer<'r, 'a> {
    resolver: &'r dyn Resolve<'a>,
}

impl<'r, 'a> TypeInferencer<'r, 'a> {
    pub fn new(resolver: &'r dyn Resolve<'a>) -> Self {
        Self { resolver }
    }

    /// Tags for a type annotation.
    pub fn annotation(&self, ty: &TSType<'a>) -> Vec<TypeTag> {
        let mut visited = FxHashSet::default();
        self.annotation_inner(ty, &mut visited)
    }

    fn annotation_inner(&self, ty: &TSType<'a>, visited: &mut FxHashSet<&'a str>) -> Vec<TypeTag> {
        let tag = match ty {
            TSType::TSStringKeyword(_) | TSType::TSTemplateLiteralType(_) => TypeTag::String,
            TSType::TSNumberKeyword(_) | TSType::TSBigIntKeyword(_) => TypeTag::Number,
            TSType::TSBooleanKeyword(_) => TypeTag::Boolean,
            TSType::TSObjectKeyword(_) | TSType::TSTypeLiteral(_) | TSType::TSMappedType(_) => {
                TypeTag::Object
            }
            TSType::TSIntersectionType(_) => TypeTag::Object,
            TSType::TSArrayType(_) | TSType::TSTupleType(_) => TypeTag::Array,
            TSType::TSFunctionType(_) | TSType::TSConstructorType(_) => TypeTag::Function,
            TSType::TSLiteralType(lit) => match &lit.literal {
                TSLiteral::StringLiteral(_) | TSLiteral::TemplateLiteral(_) => TypeTag::String,
                TSLiteral::NumericLiteral(_) | TSLiteral::BigIntLiteral(_) => TypeTag::Number,
                TSLiteral::UnaryExpression(_) => TypeTag::Number,
                TSLiteral::BooleanLiteral(_) => TypeTag::Boolean,
            },
            TSType::TSParenthesizedType(paren) => {
                return self.annotation_inner(&paren.type_annotation, visited);
            }
            TSType::TSTypeOperatorType(op) => match op.operator {
                TSTypeOperatorOperator::Readonly => {
                    return self.annotation_inner(&op.type_annotation, visited);
                }
                TSTypeOperatorOperator::Keyof => TypeTag::String,
                TSTypeOperatorOperator::Unique => TypeTag::Null,
            },
            TSType::TSUnionType(union) => {
                let mut tags = Vec::new();
                for member in &union.types {
                    // `T | undefined` only marks optionality
                    if matches!(member, TSType::TSUndefinedKeyword(_) | TSType::TSVoidKeyword(_))
                        && union.types.len() > 1
                    {
                        continue;
                    }
                    union_tags(&mut tags, self.annotation_inner(member, visited));
                }
                return tags;
            }
            TSType::TSTypeReference(reference) => return self.reference(reference, visited),
            _ => TypeTag::Null,
        };
        vec![tag]
    }

    fn reference(&self, reference: &TSTypeReference<'a>, visited: &mut FxHashSet<&'a str>) -> Vec<TypeTag> {
        let has_arguments = reference.type_arguments.is_some();
        let TSTypeName::IdentifierReference(ident) = &reference.type_name else {
            return vec![if has_arguments { TypeTag::Object } else { TypeTag::Null }];
        };
        let name = ident.name.as_str();

        match self.resolver.resolve(name, None) {
            Some(Binding::TypeAlias(alias)) => {
                if !visited.insert(name) {
                    tracing::debug!("type alias cycle through `{name}`");
                    return vec![TypeTag::Null];
                }
                let tags = self.annotation_inner(&alias.type_annotation, visited);
                visited.remove(name);
                return tags;
            }
            Some(Binding::Interface(_)) => return vec![TypeTag::Object],
            _ => {}
        }

        if is_transparent_wrapper(name) {
            if let Some(inner) = reference.type_arguments.as_ref().and_then(|args| args.params.first()) {
                return self.annotation_inner(inner, visited);
            }
        }
        match builtin_tag(name) {
            Some(tag) => vec![tag],
            None if has_arguments => vec![TypeTag::Object],
            None => vec![TypeTag::Null],
        }
    }

    /// Tags for the value an expression evaluates to.
    pub fn expression(&self, expr: &Expression<'a>) -> Vec<TypeTag> {
        self.expression_inner(expr, 0)
    }

    fn expression_inner(&self, expr: &Expression<'a>, depth: u32) -> Vec<TypeTag> {
        let tag = match expr {
            Expression::StringLiteral(_) | Expression::TemplateLiteral(_) => TypeTag::String,
            Expression::NumericLiteral(_) | Expression::BigIntLiteral(_) => TypeTag::Number,
            Expression::BooleanLiteral(_) => TypeTag::Boolean,
            Expression::NullLiteral(_) => TypeTag::Null,
            Expression::RegExpLiteral(_) => TypeTag::RegExp,
            Expression::ArrayExpression(_) => TypeTag::Array,
            Expression::ObjectExpression(_) => TypeTag::Object,
            Expression::FunctionExpression(_)
            | Expression::ArrowFunctionExpression(_)
            | Expression::ClassExpression(_) => TypeTag::Function,
            Expression::ParenthesizedExpression(paren) => {
                return self.expression_inner(&paren.expression, depth);
            }
            Expression::TSAsExpression(cast) => {
                if is_const_assertion(&cast.type_annotation) {
                    return self.expression_inner(&cast.expression, depth);
                }
                return self.annotation(&cast.type_annotation);
            }
            Expression::TSSatisfiesExpression(inner) => {
                return self.expression_inner(&inner.expression, depth);
            }
            Expression::TSNonNullExpression(inner) => {
                return self.expression_inner(&inner.expression, depth);
            }
            Expression::UnaryExpression(unary) => match unary.operator {
                UnaryOperator::LogicalNot | UnaryOperator::Delete => TypeTag::Boolean,
                UnaryOperator::Typeof => TypeTag::String,
                UnaryOperator::Void => TypeTag::Null,
                _ => TypeTag::Number,
            },
            Expression::BinaryExpression(binary) => match binary.operator {
                BinaryOperator::Addition => {
                    let left = self.expression_inner(&binary.left, depth);
                    let right = self.expression_inner(&binary.right, depth);
                    if left.contains(&TypeTag::String) || right.contains(&TypeTag::String) {
                        TypeTag::String
                    } else if left == [TypeTag::Number] && right == [TypeTag::Number] {
                        TypeTag::Number
                    } else {
                        TypeTag::Null
                    }
                }
                op if op.is_equality() || op.is_compare() => TypeTag::Boolean,
                BinaryOperator::In | BinaryOperator::Instanceof => TypeTag::Boolean,
                _ => TypeTag::Number,
            },
            Expression::LogicalExpression(logical) => {
                let mut tags = self.expression_inner(&logical.left, depth);
                union_tags(&mut tags, self.expression_inner(&logical.right, depth));
                return tags;
            }
            Expression::ConditionalExpression(cond) => {
                let mut tags = self.expression_inner(&cond.consequent, depth);
                union_tags(&mut tags, self.expression_inner(&cond.alternate, depth));
                return tags;
            }
            Expression::NewExpression(new) => match &new.callee {
                Expression::Identifier(ident) => match ident.name.as_str() {
                    "Array" => TypeTag::Array,
                    "RegExp" => TypeTag::RegExp,
                    "Function" => TypeTag::Function,
                    _ => TypeTag::Object,
                },
                _ => TypeTag::Object,
            },
            Expression::CallExpression(call) => match &call.callee {
                Expression::Identifier(ident) => match ident.name.as_str() {
                    "String" => TypeTag::String,
                    "Number" | "parseInt" | "parseFloat" => TypeTag::Number,
                    "Boolean" => TypeTag::Boolean,
                    _ => TypeTag::Null,
                },
                _ => TypeTag::Null,
            },
            Expression::Identifier(ident) => {
                return self.identifier(ident.name.as_str(), depth);
            }
            _ => TypeTag::Null,
        };
        vec![tag]
    }

    fn identifier(&self, name: &str, depth: u32) -> Vec<TypeTag> {
        match name {
            "undefined" => return vec![TypeTag::Null],
            "NaN" | "Infinity" => return vec![TypeTag::Number],
            _ => {}
        }
        if depth >= MAX_DEPTH {
            return vec![TypeTag::Null];
        }
        match self.resolver.resolve(name, None) {
            Some(Binding::Variable(decl)) => {
                if let Some(annotation) = &decl.type_annotation {
                    self.annotation(&annotation.type_annotation)
                } else if let Some(init) = &decl.init {
                    self.expression_inner(init, depth + 1)
                } else {
                    vec![TypeTag::Null]
                }
            }
            Some(Binding::Function(_) | Binding::Class(_)) => vec![TypeTag::Function],
            _ => vec![TypeTag::Null],
        }
    }

    /// Tags for a prop default. Function defaults are factories, so the
    /// returned value is what counts.
    pub fn default_value(&self, expr: &'a Expression<'a>) -> Vec<TypeTag> {
        match FunctionLike::from_expression(expr) {
            Some(func) => match func.returned() {
                Some(returned) => self.expression(returned),
                None => vec![TypeTag::Function],
            },
            None => self.expression(expr),
        }
    }

    /// Tags for a runtime `type:` option such as `Number` or `[String, Array]`.
    ///
    /// `Object as PropType<T>` keeps the runtime constructor; the annotation is ignored.
    pub fn runtime_type(&self, expr: &Expression<'a>) -> Vec<TypeTag> {
        match expr {
            Expression::Identifier(ident) => vec![constructor_tag(ident.name.as_str())],
            Expression::ArrayExpression(array) => {
                let mut tags = Vec::new();
                for element in &array.elements {
                    match element.as_expression() {
                        Some(expr) => union_tags(&mut tags, self.runtime_type(expr)),
                        None => union_tags(&mut tags, [TypeTag::Null]),
                    }
                }
                tags
            }
            Expression::TSAsExpression(cast) => self.runtime_type(&cast.expression),
            Expression::TSSatisfiesExpression(inner) => self.runtime_type(&inner.expression),
            Expression::ParenthesizedExpression(paren) => self.runtime_type(&paren.expression),
            _ => vec![TypeTag::Null],
        }
    }

    /// Property and method signatures of an object-like type, following
    /// local aliases, interfaces (with their local `extends`) and intersections.
    pub fn type_members(&self, ty: &'a TSType<'a>) -> Vec<&'a TSSignature<'a>> {
        let mut members = Vec::new();
        let mut visited = FxHashSet::default();
        self.collect_members(ty, &mut members, &mut visited);
        members
    }

    fn collect_members(
        &self,
        ty: &'a TSType<'a>,
        members: &mut Vec<&'a TSSignature<'a>>,
        visited: &mut FxHashSet<&'a str>,
    ) {
        match ty {
            TSType::TSTypeLiteral(lit) => members.extend(lit.members.iter()),
            TSType::TSParenthesizedType(paren) => self.collect_members(&paren.type_annotation, members, visited),
            TSType::TSIntersectionType(intersection) => {
                for ty in &intersection.types {
                    self.collect_members(ty, members, visited);
                }
            }
            TSType::TSTypeReference(reference) => {
                let TSTypeName::IdentifierReference(ident) = &reference.type_name else {
                    return;
                };
                self.collect_named_members(ident.name.as_str(), members, visited);
            }
            _ => {}
        }
    }

    fn collect_named_members(
        &self,
        name: &'a str,
        members: &mut Vec<&'a TSSignature<'a>>,
        visited: &mut FxHashSet<&'a str>,
    ) {
        if !visited.insert(name) {
            return;
        }
        match self.resolver.resolve(name, None) {
            Some(Binding::TypeAlias(alias)) => {
                self.collect_members(&alias.type_annotation, members, visited);
            }
            Some(Binding::Interface(interface)) => {
                for heritage in &interface.extends {
                    if let Expression::Identifier(base) = &heritage.expression {
                        self.collect_named_members(base.name.as_str(), members, visited);
                    }
                }
                members.extend(interface.body.body.iter());
            }
            _ => tracing::debug!("cannot resolve members of `{name}`"),
        }
    }
}

/// Tag for a constructor used as a runtime prop type.
fn constructor_tag(name: &str) -> TypeTag {
    match name {
        "Symbol" | "undefined" => TypeTag::Null,
        _ => builtin_tag(name).unwrap_or(TypeTag::Object),
    }
}

fn is_const_assertion(ty: &TSType<'_>) -> bool {
    matches!(
        ty,
        TSType::TSTypeReference(reference)
            if matches!(&reference.type_name, TSTypeName::IdentifierReference(ident) if ident.name == "const")
    )
}
