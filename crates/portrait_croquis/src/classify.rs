//! Component-shape classification.
//!
//! Each authoring style has its own classifier returning a
//! [`Classification`]. Sites are tried class form first, then config form;
//! functions count only when passed to a component wrapper.
//! Anything that matches none of them is not a component.

use oxc_ast::ast::{
    Argument, AssignmentTarget, CallExpression, Class, Decorator, Expression, IdentifierReference,
    ObjectExpression, ObjectPropertyKind, Program, Statement,
};
use oxc_ast_visit::{walk, Visit};
use phf::phf_set;
use portrait_carton::{FxHashMap, String};

use crate::metadata::is_lifecycle_hook;
use crate::util::{property_name, FunctionLike};

/// Option keys a config object may use, besides lifecycle hooks.
static CONFIG_KEYS: phf::Set<&'static str> = phf_set! {
    "name",
    "extends",
    "mixins",
    "components",
    "filters",
    "provide",
    "inject",
    "emits",
    "methods",
    "setup",
    "computed",
    "data",
    "props",
    "model",
};

/// Names of the class component annotation.
static COMPONENT_DECORATORS: phf::Set<&'static str> = phf_set! {
    "Component",
    "Options",
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub matches: bool,
    pub reason: String,
}

impl Classification {
    fn yes(reason: impl Into<String>) -> Self {
        Self {
            matches: true,
            reason: reason.into(),
        }
    }

    fn no(reason: impl Into<String>) -> Self {
        Self {
            matches: false,
            reason: reason.into(),
        }
    }
}

/// A definition site, by authoring style.
#[derive(Debug, Clone, Copy)]
pub enum ComponentSource<'a> {
    Config(&'a ObjectExpression<'a>),
    Class {
        class: &'a Class<'a>,
        /// Registered by a decorate call outside the class body
        registered: bool,
    },
    /// Function passed directly to a component wrapper
    SetupFunction(FunctionLike<'a>),
    /// A `<script setup>` program
    SetupBlock(&'a Program<'a>),
}

/// Config form: every key must be a known option.
pub fn classify_object(object: &ObjectExpression<'_>) -> Classification {
    if object.properties.is_empty() {
        return Classification::yes("empty options object");
    }
    for property in &object.properties {
        let ObjectPropertyKind::ObjectProperty(property) = property else {
            return Classification::no("spread in options object");
        };
        if property.computed {
            return Classification::no("computed option key");
        }
        let Some(key) = property_name(&property.key) else {
            return Classification::no("unnamed option key");
        };
        if !CONFIG_KEYS.contains(key.as_str()) && !is_lifecycle_hook(&key) {
            return Classification::no(format!("unknown option `{key}`"));
        }
    }
    Classification::yes("all keys are component options")
}

/// Setup-function form: the function must return its bindings or a render function.
pub fn classify_setup_function(func: FunctionLike<'_>) -> Classification {
    if func.returned().is_some() {
        Classification::yes("setup function with a return value")
    } else {
        Classification::no("setup function returns nothing")
    }
}

/// Class form: base class, component annotation, or a decorate call.
pub fn classify_class(class: &Class<'_>, registered: bool) -> Classification {
    if let Some(base) = &class.super_class {
        match base.without_parentheses() {
            Expression::Identifier(ident) if ident.name == "Vue" => {
                return Classification::yes("extends Vue");
            }
            Expression::CallExpression(call) if is_mixins_call(call) => {
                return Classification::yes("extends a mixins composition");
            }
            _ => {}
        }
    }
    if class.decorators.iter().any(is_component_decorator) {
        return Classification::yes("component annotation");
    }
    if registered {
        return Classification::yes("registered by a decorate call");
    }

    let mut finder = DecorateFinder::default();
    finder.visit_class_body(&class.body);
    if finder.found {
        return Classification::yes("decorate call in class body");
    }
    Classification::no("no component base, annotation or registration")
}

/// `mixins(A, B)` or `Mixins(A, B)`.
pub fn is_mixins_call(call: &CallExpression<'_>) -> bool {
    matches!(&call.callee, Expression::Identifier(ident) if ident.name == "mixins" || ident.name == "Mixins")
}

/// `@Component` or `@Component({ ... })`.
pub fn is_component_decorator(decorator: &Decorator<'_>) -> bool {
    decorator_name(decorator).is_some_and(|name| COMPONENT_DECORATORS.contains(name))
}

/// Name of a decorator, called or bare.
pub fn decorator_name<'a>(decorator: &Decorator<'a>) -> Option<&'a str> {
    match &decorator.expression {
        Expression::Identifier(ident) => Some(ident.name.as_str()),
        Expression::CallExpression(call) => match &call.callee {
            Expression::Identifier(ident) => Some(ident.name.as_str()),
            _ => None,
        },
        _ => None,
    }
}

/// `__decorate([Component(...)], X)` as emitted by decorator transforms.
pub fn is_decorate_call(call: &CallExpression<'_>) -> bool {
    let Expression::Identifier(callee) = &call.callee else {
        return false;
    };
    if !callee.name.as_str().to_ascii_lowercase().contains("decorate") {
        return false;
    }
    let mut finder = ComponentReferenceFinder::default();
    for argument in &call.arguments {
        finder.visit_argument(argument);
    }
    finder.found
}

/// Class names registered by top-level `X = __decorate([Component], X)`,
/// with the registering call.
pub fn decorate_registered_classes<'a>(program: &'a Program<'a>) -> FxHashMap<&'a str, &'a CallExpression<'a>> {
    let mut names = FxHashMap::default();
    for statement in &program.body {
        let Statement::ExpressionStatement(statement) = statement else {
            continue;
        };
        let Expression::AssignmentExpression(assign) = &statement.expression else {
            continue;
        };
        let (AssignmentTarget::AssignmentTargetIdentifier(target), Expression::CallExpression(call)) =
            (&assign.left, &assign.right)
        else {
            continue;
        };
        if is_decorate_call(call) {
            names.insert(target.name.as_str(), &**call);
        }
    }
    names
}

/// The class a decorate call registers: its last argument.
pub fn decorated_class_name<'a>(call: &CallExpression<'a>) -> Option<&'a str> {
    match call.arguments.last()? {
        Argument::Identifier(ident) => Some(ident.name.as_str()),
        _ => None,
    }
}

#[derive(Default)]
struct DecorateFinder {
    found: bool,
}

impl<'a> Visit<'a> for DecorateFinder {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if is_decorate_call(it) {
            self.found = true;
            return;
        }
        walk::walk_call_expression(self, it);
    }
}

#[derive(Default)]
struct ComponentReferenceFinder {
    found: bool,
}

impl<'a> Visit<'a> for ComponentReferenceFinder {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if COMPONENT_DECORATORS.contains(it.name.as_str()) {
            self.found = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_ast::ast::ExportDefaultDeclarationKind;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn classify_default(source: &str) -> Classification {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        let registered = decorate_registered_classes(&ret.program);
        for statement in &ret.program.body {
            if let Statement::ExportDefaultDeclaration(export) = statement {
                return match &export.declaration {
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                        let is_registered = class
                            .id
                            .as_ref()
                            .is_some_and(|id| registered.contains_key(id.name.as_str()));
                        classify_class(class, is_registered)
                    }
                    ExportDefaultDeclarationKind::ObjectExpression(object) => classify_object(object),
                    _ => Classification::no("other"),
                };
            }
        }
        Classification::no("no default export")
    }

    #[test]
    fn test_config_object() {
        assert!(classify_default("export default { name: 'A', data() { return {} }, mounted() {} }").matches);
        assert!(classify_default("export default { model: { prop: 'v' } }").matches);
        assert!(classify_default("export default {}").matches);

        let rejected = classify_default("export default { name: 'A', watch: {} }");
        assert!(!rejected.matches);
        assert_eq!(rejected.reason, "unknown option `watch`");
        assert!(!classify_default("export default { ...base }").matches);
    }

    #[test]
    fn test_class_forms() {
        assert!(classify_default("export default class A extends Vue {}").matches);
        assert!(classify_default("@Component export default class A extends Base {}").matches);
        assert!(classify_default("@Component({ name: 'x' }) export default class A {}").matches);
        assert!(classify_default("export default class A extends mixins(M) {}").matches);
        assert!(
            classify_default("export default class A { static { __decorate([Component({})], A) } }").matches
        );
        assert!(!classify_default("export default class A extends Base {}").matches);
    }

    #[test]
    fn test_top_level_decorate_registration() {
        let allocator = Allocator::default();
        let source = "let A = class A {}\nA = __decorate([Component({ name: 'a' })], A)\nB = __decorate([Other], B)";
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        let names = decorate_registered_classes(&ret.program);
        assert!(names.contains_key("A"));
        assert!(!names.contains_key("B"));
    }
}
