//! Setup-function and setup-block analyzer.
//!
//! Both forms expose bindings to the template. A setup function does so
//! through its returned object; a setup block through every top-level
//! declaration. Bindings initialized by a pass-through helper or a constant
//! literal are left out.

use oxc_ast::ast::{
    BindingPattern, CallExpression, Expression, FormalParameters, ObjectExpression, Program, Statement,
    TSSignature, TSTupleElement, TSType, VariableDeclarator,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::GetSpan;
use phf::phf_set;
use portrait_carton::{FxHashMap, String};

use super::options::{self, parameter_types, provide_value};
use super::{delta, properties_with_comments, AnalysisContext, EmitCallCollector};
use crate::metadata::{ComponentMetadata, EmitEntry, KeyKind, MetadataBuilder, PropEntry, ProvideEntry, TypeTag};
use crate::pattern::{flatten_pattern, object_pattern_keys};
use crate::resolve::{Binding, Resolve};
use crate::util::{callee_ident, is_constant_literal, string_value, FunctionLike};

/// Helpers that hand back what the framework already provides.
static PASS_THROUGH_HELPERS: phf::Set<&'static str> = phf_set! {
    "defineProps",
    "withDefaults",
    "defineEmits",
    "useSlots",
    "useAttrs",
    "useContext",
    "getCurrentInstance",
};

#[inline]
pub fn is_pass_through_helper(name: &str) -> bool {
    PASS_THROUGH_HELPERS.contains(name)
}

/// Whether a binding initialized with `init` should stay out of the setup map.
fn is_excluded_initializer(init: &Expression<'_>) -> bool {
    if is_constant_literal(init) {
        return true;
    }
    match init.without_parentheses() {
        Expression::CallExpression(call) => callee_ident(call).is_some_and(is_pass_through_helper),
        Expression::AwaitExpression(await_expr) => is_excluded_initializer(&await_expr.argument),
        _ => false,
    }
}

/// Analyze a `setup(props, ctx)` function.
pub fn analyze_setup_function<'a>(ctx: &AnalysisContext<'_, 'a>, func: FunctionLike<'a>) -> ComponentMetadata {
    delta(|builder| {
        let scope = func.scope_id();
        match func.returned().map(Expression::without_parentheses) {
            Some(Expression::ObjectExpression(object)) => {
                for (name, property, comment) in properties_with_comments(ctx, object) {
                    let init = match property.value.without_parentheses() {
                        Expression::Identifier(ident) => match ctx.resolver.resolve(ident.name.as_str(), scope) {
                            Some(Binding::Variable(decl)) => decl.init.as_ref().map(|init| (init, decl)),
                            _ => None,
                        },
                        _ => None,
                    };
                    let (excluded, comment) = match init {
                        Some((init, decl)) => (
                            is_excluded_initializer(init),
                            comment.or_else(|| ctx.comment_above(decl.span)),
                        ),
                        None => (is_excluded_initializer(&property.value), comment),
                    };
                    if excluded {
                        tracing::debug!("setup binding `{name}` is a pass-through or a constant");
                        continue;
                    }
                    builder.add_setup(name, comment);
                }
            }
            Some(_) => tracing::debug!("setup returns something other than an object literal"),
            None => tracing::debug!("setup has no return statement"),
        }

        let Some(body) = func.body() else {
            return;
        };
        SetupCallCollector { ctx, builder }.visit_function_body(body);

        let mut emits = EmitCallCollector::new(ctx, builder);
        if let Some(context) = func.params().items.get(1) {
            match &context.pattern {
                BindingPattern::BindingIdentifier(ident) => emits = emits.with_emit_object(ident.name.as_str()),
                pattern => {
                    for (key, leaf) in object_pattern_keys(pattern) {
                        if key == "emit" {
                            emits = emits.with_emit_function(leaf.name);
                        }
                    }
                }
            }
        }
        emits.visit_function_body(body);
    })
}

/// Analyze a `<script setup>` program.
pub fn analyze_setup_block<'a>(ctx: &AnalysisContext<'_, 'a>, program: &'a Program<'a>) -> ComponentMetadata {
    delta(|builder| {
        let mut emit_functions = Vec::new();
        let mut window_start = 0;

        for statement in &program.body {
            let span = statement.span();
            let comment = ctx.comment_between(window_start, span);
            match statement {
                Statement::VariableDeclaration(declaration) => {
                    for declarator in &declaration.declarations {
                        if let Some(emit) = macro_declarator(ctx, declarator, comment.as_deref(), builder) {
                            emit_functions.push(emit);
                        }
                        if declarator.init.as_ref().is_some_and(is_excluded_initializer) {
                            continue;
                        }
                        for leaf in flatten_pattern(&declarator.id) {
                            builder.add_setup(leaf.name, comment.clone());
                        }
                    }
                }
                Statement::FunctionDeclaration(func) => {
                    if let Some(id) = &func.id {
                        builder.add_setup(id.name.as_str(), comment);
                    }
                }
                Statement::ExpressionStatement(statement) => {
                    if let Expression::CallExpression(call) = &statement.expression {
                        compiler_macro(ctx, call, &FxHashMap::default(), comment.as_deref(), builder);
                    }
                }
                _ => {}
            }
            window_start = span.end;
        }

        SetupCallCollector { ctx, builder }.visit_program(program);

        let mut emits = EmitCallCollector::new(ctx, builder);
        for name in emit_functions {
            emits = emits.with_emit_function(name);
        }
        emits.visit_program(program);
    })
}

/// Handle `const x = defineProps(...)` and friends. Returns the local name
/// bound to `defineEmits`, if this declarator binds one.
fn macro_declarator<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    declarator: &'a VariableDeclarator<'a>,
    comment: Option<&str>,
    builder: &mut MetadataBuilder,
) -> Option<&'a str> {
    let Some(Expression::CallExpression(call)) = declarator.init.as_ref().map(Expression::without_parentheses) else {
        return None;
    };
    let defaults: FxHashMap<String, Option<String>> = object_pattern_keys(&declarator.id)
        .into_iter()
        .map(|(key, leaf)| (key, leaf.default.and_then(|expr| ctx.value_text(expr))))
        .collect();
    let is_emits = compiler_macro(ctx, call, &defaults, comment, builder);
    match &declarator.id {
        BindingPattern::BindingIdentifier(ident) if is_emits => Some(ident.name.as_str()),
        _ => None,
    }
}

/// Returns true if `call` declares emits.
fn compiler_macro<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    call: &'a CallExpression<'a>,
    destructured: &FxHashMap<String, Option<String>>,
    comment: Option<&str>,
    builder: &mut MetadataBuilder,
) -> bool {
    match callee_ident(call) {
        Some("defineProps") => {
            define_props(ctx, call, None, destructured, builder);
            false
        }
        Some("withDefaults") => {
            let defaults = call.arguments.get(1).and_then(|argument| match argument.as_expression() {
                Some(Expression::ObjectExpression(object)) => Some(&**object),
                _ => None,
            });
            match call.arguments.first().and_then(|argument| argument.as_expression()) {
                Some(Expression::CallExpression(inner)) if callee_ident(inner) == Some("defineProps") => {
                    define_props(ctx, inner, defaults, destructured, builder);
                }
                _ => tracing::debug!("withDefaults without a defineProps call"),
            }
            false
        }
        Some("defineEmits") => {
            define_emits(ctx, call, comment, builder);
            true
        }
        _ => false,
    }
}

fn define_props<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    call: &'a CallExpression<'a>,
    defaults: Option<&'a ObjectExpression<'a>>,
    destructured: &FxHashMap<String, Option<String>>,
    builder: &mut MetadataBuilder,
) {
    if let Some(argument) = call.arguments.first().and_then(|argument| argument.as_expression()) {
        options::props(ctx, argument, builder);
        return;
    }
    let Some(ty) = call.type_arguments.as_ref().and_then(|args| args.params.first()) else {
        return;
    };

    let mut default_texts: FxHashMap<String, Option<String>> = FxHashMap::default();
    if let Some(defaults) = defaults {
        for (name, property, _) in properties_with_comments(ctx, defaults) {
            default_texts.insert(name, ctx.value_text(&property.value));
        }
    }

    for signature in ctx.types.type_members(ty) {
        let (key, optional, types) = match signature {
            TSSignature::TSPropertySignature(property) => (
                &property.key,
                property.optional,
                property
                    .type_annotation
                    .as_ref()
                    .map(|annotation| ctx.types.annotation(&annotation.type_annotation))
                    .unwrap_or_default(),
            ),
            TSSignature::TSMethodSignature(method) => (&method.key, method.optional, vec![TypeTag::Function]),
            _ => continue,
        };
        let Some(name) = crate::util::property_name(key) else {
            continue;
        };
        let default = default_texts
            .get(&name)
            .or_else(|| destructured.get(&name))
            .cloned()
            .flatten();
        builder.add_prop(
            name,
            PropEntry {
                default,
                types,
                required: Some(!optional),
                comment: ctx.comment_above(signature.span()),
            },
        );
    }
}

fn define_emits<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    call: &'a CallExpression<'a>,
    comment: Option<&str>,
    builder: &mut MetadataBuilder,
) {
    if let Some(argument) = call.arguments.first().and_then(|argument| argument.as_expression()) {
        options::emits(ctx, argument, builder);
        return;
    }
    let Some(ty) = call.type_arguments.as_ref().and_then(|args| args.params.first()) else {
        tracing::debug!("defineEmits without declarations");
        return;
    };

    for signature in ctx.types.type_members(ty) {
        let signature_comment = ctx.comment_above(signature.span()).or_else(|| comment.map(String::from));
        match signature {
            TSSignature::TSCallSignatureDeclaration(call_signature) => {
                let Some((events, payload)) = call_signature_events(ctx, &call_signature.params) else {
                    continue;
                };
                for event in events {
                    let entry = EmitEntry {
                        types: payload.clone(),
                        comment: signature_comment.clone(),
                        validator: None,
                    };
                    builder.add_emit(event, entry);
                }
            }
            TSSignature::TSPropertySignature(property) => {
                let Some(name) = crate::util::property_name(&property.key) else {
                    continue;
                };
                let types = match property.type_annotation.as_ref().map(|a| &a.type_annotation) {
                    Some(TSType::TSTupleType(tuple)) => tuple.element_types.iter().map(|el| tuple_element(ctx, el)).collect(),
                    _ => Vec::new(),
                };
                builder.add_emit(
                    name,
                    EmitEntry {
                        types,
                        comment: signature_comment,
                        validator: None,
                    },
                );
            }
            _ => {}
        }
    }
}

/// Event names of `(e: 'a' | 'b', ...payload)` and the payload types.
fn call_signature_events<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    params: &FormalParameters<'a>,
) -> Option<(Vec<&'a str>, Vec<Vec<TypeTag>>)> {
    let first = params.items.first()?;
    let annotation = &first.type_annotation.as_ref()?.type_annotation;
    let mut events = Vec::new();
    literal_strings(annotation, &mut events);
    if events.is_empty() {
        tracing::debug!("emit signature without literal event names");
        return None;
    }
    let mut payload = parameter_types(ctx, params);
    payload.remove(0);
    Some((events, payload))
}

fn literal_strings<'a>(ty: &TSType<'a>, out: &mut Vec<&'a str>) {
    match ty {
        TSType::TSLiteralType(literal) => {
            if let oxc_ast::ast::TSLiteral::StringLiteral(string) = &literal.literal {
                out.push(string.value.as_str());
            }
        }
        TSType::TSUnionType(union) => {
            for member in &union.types {
                literal_strings(member, out);
            }
        }
        TSType::TSParenthesizedType(paren) => literal_strings(&paren.type_annotation, out),
        _ => {}
    }
}

fn tuple_element<'a>(ctx: &AnalysisContext<'_, 'a>, element: &TSTupleElement<'a>) -> Vec<TypeTag> {
    if let TSTupleElement::TSNamedTupleMember(member) = element {
        return tuple_element(ctx, &member.element_type);
    }
    match element.as_ts_type() {
        Some(ty) => ctx.types.annotation(ty),
        None => Vec::new(),
    }
}

/// Lifecycle hook registrations and `provide(key, value)` calls.
struct SetupCallCollector<'c, 'r, 'a> {
    ctx: &'c AnalysisContext<'r, 'a>,
    builder: &'c mut MetadataBuilder,
}

impl<'a> Visit<'a> for SetupCallCollector<'_, '_, 'a> {
    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        match callee_ident(it) {
            Some("provide") => self.provide(it),
            Some(name) if name.starts_with("on") => {
                let comment = self.ctx.comment_above(it.span);
                if !self.builder.add_lifecycle(name, comment) {
                    tracing::trace!("`{name}` is not a lifecycle hook");
                }
            }
            _ => {}
        }
        walk::walk_call_expression(self, it);
    }
}

impl<'a> SetupCallCollector<'_, '_, 'a> {
    fn provide(&mut self, call: &CallExpression<'a>) {
        let Some(key) = call.arguments.first().and_then(|argument| argument.as_expression()) else {
            return;
        };
        let (key, key_kind) = match string_value(key) {
            Some(literal) => (String::from(literal), KeyKind::Literal),
            None => (String::from(self.ctx.text(key.span())), KeyKind::Dynamic),
        };
        let (value, value_kind) = match call.arguments.get(1).and_then(|argument| argument.as_expression()) {
            Some(value) => provide_value(self.ctx, value),
            None => (None, Default::default()),
        };
        let entry = ProvideEntry {
            key_kind,
            value,
            value_kind,
            comment: self.ctx.comment_above(call.span),
        };
        self.builder.add_provide(key, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TypeTag::{Array, Boolean, Function, Number};
    use crate::metadata::ValueKind;
    use crate::test_utils::{with_default_export, with_setup_block};

    #[test]
    fn test_setup_function_bindings() {
        let meta = with_default_export(
            r#"export default {
  setup(props, context) {
    // Visible count
    const count = ref(0)
    const attrs = useAttrs()
    const label = 'fixed'
    function reset() {}
    onMounted(() => {})
    context.emit('ready')
    return {
      count,
      attrs,
      label,
      reset,
      /** Doubled */
      double: computed(() => count.value * 2),
      version: 3,
    }
  },
}"#,
        );
        assert_eq!(meta.setup.keys().collect::<Vec<_>>(), ["count", "reset", "double"]);
        assert_eq!(meta.setup.get("count").unwrap().comment.as_deref(), Some("Visible count"));
        assert_eq!(meta.setup.get("double").unwrap().comment.as_deref(), Some("Doubled"));
        assert!(meta.lifecycle.contains_key("mounted"));
        assert!(meta.emits.contains_key("ready"));
    }

    #[test]
    fn test_setup_block_bindings() {
        let meta = with_setup_block(
            r#"import { ref } from 'vue'
// Counter state
const count = ref(0)
const { a, b: [c, d = 1] } = useThing()
const max = 10
const slots = useSlots()
function increment() {}
"#,
        );
        assert_eq!(
            meta.setup.keys().collect::<Vec<_>>(),
            ["count", "a", "c", "d", "increment"]
        );
        assert_eq!(meta.setup.get("count").unwrap().comment.as_deref(), Some("Counter state"));
    }

    #[test]
    fn test_type_based_props() {
        let meta = with_setup_block(
            r#"interface Base { id: number }
type Props = Base & {
  /** Title text */
  title: string
  items?: string[]
  onSelect(item: string): void
  mode: 'a' | 'b'
}
const props = withDefaults(defineProps<Props>(), { title: 'Untitled' })
"#,
        );
        assert_eq!(
            meta.props.keys().collect::<Vec<_>>(),
            ["id", "title", "items", "onSelect", "mode"]
        );
        let title = meta.props.get("title").unwrap();
        assert_eq!(title.types, vec![TypeTag::String]);
        assert_eq!(title.required, Some(true));
        assert_eq!(title.default.as_deref(), Some("'Untitled'"));
        assert_eq!(title.comment.as_deref(), Some("Title text"));

        let items = meta.props.get("items").unwrap();
        assert_eq!(items.types, vec![Array]);
        assert_eq!(items.required, Some(false));
        assert_eq!(meta.props.get("onSelect").unwrap().types, vec![Function]);
        assert_eq!(meta.props.get("mode").unwrap().types, vec![TypeTag::String]);
        assert!(meta.setup.is_empty());
    }

    #[test]
    fn test_destructured_prop_defaults_and_runtime_props() {
        let meta = with_setup_block("const { size = 10 } = defineProps<{ size?: number }>()");
        let size = meta.props.get("size").unwrap();
        assert_eq!(size.default.as_deref(), Some("10"));
        assert_eq!(size.types, vec![Number]);

        let meta = with_setup_block("defineProps({ open: Boolean })");
        assert_eq!(meta.props.get("open").unwrap().types, vec![Boolean]);
    }

    #[test]
    fn test_type_based_emits() {
        let meta = with_setup_block(
            r#"const emit = defineEmits<{
  (e: 'change' | 'input', id: number): void
  (e: 'close'): void
}>()
function save() {
  emit('change', 1)
  emit('saved', 'x')
}
"#,
        );
        assert_eq!(meta.emits.keys().collect::<Vec<_>>(), ["change", "input", "close", "saved"]);
        assert_eq!(meta.emits.get("change").unwrap().types, vec![vec![Number]]);
        assert!(meta.emits.get("close").unwrap().types.is_empty());
        assert_eq!(meta.emits.get("saved").unwrap().types, vec![vec![TypeTag::String]]);
        assert_eq!(meta.setup.keys().collect::<Vec<_>>(), ["save"]);

        let meta = with_setup_block("const emit = defineEmits<{ update: [value: string], clear: [] }>()");
        assert_eq!(meta.emits.get("update").unwrap().types, vec![vec![TypeTag::String]]);
        assert!(meta.emits.get("clear").unwrap().types.is_empty());
    }

    #[test]
    fn test_lifecycle_and_provide_calls() {
        let meta = with_setup_block(
            r#"const theme = ref('dark')
// Share theme
provide('theme', theme)
provide(KEY, { a: 1 })
// Load data
onMounted(() => {})
onBeforeUnmount(() => {})
onClickOutside(el, () => {})
"#,
        );
        let theme = meta.provide.get("theme").unwrap();
        assert_eq!(theme.comment.as_deref(), Some("Share theme"));
        assert_eq!(theme.value_kind, ValueKind::Reference);
        let dynamic = meta.provide.get("KEY").unwrap();
        assert_eq!(dynamic.key_kind, KeyKind::Dynamic);
        assert_eq!(dynamic.value_kind, ValueKind::Expression);

        assert_eq!(meta.lifecycle.keys().collect::<Vec<_>>(), ["mounted", "beforeUnmount"]);
        assert_eq!(meta.lifecycle.get("mounted").unwrap().comment.as_deref(), Some("Load data"));
    }
}
