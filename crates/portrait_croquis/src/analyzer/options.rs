//! Configuration-object analyzer.

use oxc_ast::ast::{
    ArrayExpression, Expression, FormalParameters, ObjectExpression, ObjectPropertyKind, PropertyKind, TSType,
};
use oxc_ast_visit::Visit;
use oxc_span::GetSpan;
use portrait_carton::String;

use super::{delta, properties_with_comments, AnalysisContext, EmitCallCollector};
use crate::classify::classify_object;
use crate::codegen::generate;
use crate::metadata::{
    is_lifecycle_hook, ComponentMetadata, ComputedPart, EmitEntry, FilterEntry, FromKind, InjectEntry,
    KeyKind, MetadataBuilder, ModelOption, PropEntry, ProvideEntry, TypeTag, ValueKind,
};
use crate::resolve::{Binding, Resolve};
use crate::util::{is_constant_literal, object_or_returned_object, string_value, unwrap_component_wrapper, FunctionLike};

use super::setup::analyze_setup_function;

/// Analyze a component options object.
pub fn analyze_options<'a>(ctx: &AnalysisContext<'_, 'a>, object: &'a ObjectExpression<'a>) -> ComponentMetadata {
    delta(|builder| {
        let properties = properties_with_comments(ctx, object);
        for (key, property, comment) in &properties {
            let value = &property.value;
            match key.as_str() {
                "name" => match string_value(value) {
                    Some(name) => builder.set_name(name),
                    None => builder.set_name(ctx.text(value.span())),
                },
                "extends" => builder.set_extends(ctx.text(value.span())),
                "model" => model(value, builder),
                "mixins" => mixins(ctx, value, builder),
                "components" => components(ctx, value, builder),
                "filters" => filters(ctx, value, builder),
                "provide" => provide(ctx, value, builder),
                "inject" => inject(ctx, value, builder),
                "emits" => emits(ctx, value, builder),
                "methods" => methods(ctx, value, builder),
                "computed" => computed(ctx, value, builder),
                "data" => data(ctx, value, builder),
                "props" => props(ctx, value, builder),
                "setup" => match FunctionLike::from_expression(value) {
                    Some(func) => builder.merge(analyze_setup_function(ctx, func)),
                    None => tracing::debug!("`setup` is not a function"),
                },
                hook if is_lifecycle_hook(hook) => {
                    builder.add_lifecycle(hook, comment.clone());
                }
                other => tracing::debug!("ignoring option `{other}`"),
            }
        }

        let mut collector = EmitCallCollector::new(ctx, builder);
        for (key, property, _) in &properties {
            if key != "components" {
                collector.visit_expression(&property.value);
            }
        }
    })
}

fn model(value: &Expression<'_>, builder: &mut MetadataBuilder) {
    let Expression::ObjectExpression(object) = value.without_parentheses() else {
        return;
    };
    let mut model = ModelOption::default();
    for property in object.properties.iter().filter_map(ObjectPropertyKind::as_property) {
        let Some(text) = string_value(&property.value) else {
            continue;
        };
        match crate::util::property_name(&property.key).as_deref() {
            Some("prop") => model.prop = String::from(text),
            Some("event") => model.event = String::from(text),
            _ => {}
        }
    }
    builder.set_model(model);
}

fn mixins<'a>(ctx: &AnalysisContext<'_, 'a>, value: &Expression<'a>, builder: &mut MetadataBuilder) {
    let Expression::ArrayExpression(array) = value.without_parentheses() else {
        tracing::debug!("`mixins` is not an array");
        return;
    };
    for element in array.elements.iter().filter_map(|element| element.as_expression()) {
        builder.add_mixin(ctx.text(element.span()));
    }
}

fn components<'a>(ctx: &AnalysisContext<'_, 'a>, value: &'a Expression<'a>, builder: &mut MetadataBuilder) {
    let Expression::ObjectExpression(object) = value.without_parentheses() else {
        return;
    };
    for (name, property, _) in properties_with_comments(ctx, object) {
        let code = nested_component(ctx, &property.value)
            .unwrap_or_else(|| std::string::String::from(ctx.text(property.value.span())));
        builder.add_component(name, code);
    }
}

/// Generated code for an inline (or locally declared) options object.
fn nested_component<'a>(ctx: &AnalysisContext<'_, 'a>, value: &'a Expression<'a>) -> Option<std::string::String> {
    let object = match unwrap_component_wrapper(value).without_parentheses() {
        Expression::ObjectExpression(object) => object,
        Expression::Identifier(ident) => match ctx.resolver.resolve(ident.name.as_str(), None)? {
            Binding::Variable(decl) => match unwrap_component_wrapper(decl.init.as_ref()?).without_parentheses() {
                Expression::ObjectExpression(object) => object,
                _ => return None,
            },
            _ => return None,
        },
        _ => return None,
    };
    let classification = classify_object(object);
    if !classification.matches {
        tracing::debug!("nested component skipped: {}", classification.reason);
        return None;
    }
    Some(generate(&analyze_options(ctx, object)))
}

fn filters<'a>(ctx: &AnalysisContext<'_, 'a>, value: &Expression<'a>, builder: &mut MetadataBuilder) {
    let Expression::ObjectExpression(object) = value.without_parentheses() else {
        return;
    };
    for (name, property, comment) in properties_with_comments(ctx, object) {
        let reexported = match property.value.without_parentheses() {
            Expression::Identifier(ident) => ctx
                .resolver
                .resolve(ident.name.as_str(), None)
                .is_some_and(|binding| binding.is_import()),
            _ => false,
        };
        builder.add_filter(name, FilterEntry { comment, reexported });
    }
}

fn provide<'a>(ctx: &AnalysisContext<'_, 'a>, value: &'a Expression<'a>, builder: &mut MetadataBuilder) {
    let Some(object) = object_or_returned_object(value) else {
        tracing::debug!("`provide` has no object to read");
        return;
    };
    let mut window_start = object.span.start + 1;
    for property in &object.properties {
        let span = property.span();
        if let ObjectPropertyKind::ObjectProperty(property) = property {
            let comment = ctx.comment_between(window_start, span);
            let (key, key_kind) = if property.computed {
                (String::from(ctx.text(property.key.span())), KeyKind::Dynamic)
            } else {
                match crate::util::property_name(&property.key) {
                    Some(name) => (name, KeyKind::Literal),
                    None => (String::from(ctx.text(property.key.span())), KeyKind::Dynamic),
                }
            };
            let (value, value_kind) = provide_value(ctx, &property.value);
            builder.add_provide(
                key,
                ProvideEntry {
                    key_kind,
                    value,
                    value_kind,
                    comment,
                },
            );
        }
        window_start = span.end;
    }
}

/// Source text and kind of a provided value.
pub fn provide_value<'a>(ctx: &AnalysisContext<'_, 'a>, value: &Expression<'a>) -> (Option<String>, ValueKind) {
    let kind = match value.without_parentheses() {
        expr if is_constant_literal(expr) => ValueKind::Literal,
        Expression::Identifier(_)
        | Expression::ThisExpression(_)
        | Expression::StaticMemberExpression(_)
        | Expression::ComputedMemberExpression(_) => ValueKind::Reference,
        _ => ValueKind::Expression,
    };
    (ctx.value_text(value), kind)
}

fn inject<'a>(ctx: &AnalysisContext<'_, 'a>, value: &Expression<'a>, builder: &mut MetadataBuilder) {
    match value.without_parentheses() {
        Expression::ArrayExpression(array) => {
            for (name, comment) in string_elements(ctx, array) {
                let entry = InjectEntry {
                    from: Some(name.clone()),
                    from_kind: FromKind::Literal,
                    default: None,
                    comment,
                };
                builder.add_inject(name, entry);
            }
        }
        Expression::ObjectExpression(object) => {
            for (name, property, comment) in properties_with_comments(ctx, object) {
                let mut entry = inject_entry(ctx, &name, Some(&property.value));
                entry.comment = comment;
                builder.add_inject(name, entry);
            }
        }
        _ => tracing::debug!("`inject` is neither an array nor an object"),
    }
}

/// Resolve an inject source: a key string, a symbol identifier, or a
/// `{ from, default }` descriptor. Without one the bound name is the key.
pub fn inject_entry<'a>(ctx: &AnalysisContext<'_, 'a>, name: &str, source: Option<&Expression<'a>>) -> InjectEntry {
    let mut entry = InjectEntry {
        from: Some(String::from(name)),
        ..Default::default()
    };
    let Some(source) = source else {
        return entry;
    };
    match source.without_parentheses() {
        Expression::ObjectExpression(object) => {
            for property in object.properties.iter().filter_map(ObjectPropertyKind::as_property) {
                match crate::util::property_name(&property.key).as_deref() {
                    Some("from") => set_inject_from(ctx, &mut entry, &property.value),
                    Some("default") => entry.default = ctx.value_text(&property.value),
                    _ => {}
                }
            }
        }
        other => set_inject_from(ctx, &mut entry, other),
    }
    entry
}

fn set_inject_from<'a>(ctx: &AnalysisContext<'_, 'a>, entry: &mut InjectEntry, value: &Expression<'a>) {
    if let Some(key) = string_value(value) {
        entry.from = Some(String::from(key));
        entry.from_kind = FromKind::Literal;
    } else if let Expression::Identifier(ident) = value.without_parentheses() {
        entry.from = Some(String::from(ident.name.as_str()));
        entry.from_kind = FromKind::Identifier;
    } else {
        tracing::debug!("unsupported inject source `{}`", ctx.text(value.span()));
        entry.from = None;
    }
}

/// Declare emits from an array of names or an object of validators.
pub fn emits<'a>(ctx: &AnalysisContext<'_, 'a>, value: &'a Expression<'a>, builder: &mut MetadataBuilder) {
    match value.without_parentheses() {
        Expression::ArrayExpression(array) => {
            for (name, comment) in string_elements(ctx, array) {
                builder.add_emit(
                    name,
                    EmitEntry {
                        comment,
                        ..Default::default()
                    },
                );
            }
        }
        Expression::ObjectExpression(object) => {
            for (name, property, comment) in properties_with_comments(ctx, object) {
                let mut entry = EmitEntry {
                    comment,
                    ..Default::default()
                };
                if let Some(func) = FunctionLike::from_expression(&property.value) {
                    entry.types = parameter_types(ctx, func.params());
                    entry.validator = Some(String::from(ctx.text(property.value.span())));
                }
                builder.add_emit(name, entry);
            }
        }
        _ => tracing::debug!("`emits` is neither an array nor an object"),
    }
}

/// One tag set per parameter, empty where a parameter has no annotation.
pub fn parameter_types<'a>(ctx: &AnalysisContext<'_, 'a>, params: &FormalParameters<'a>) -> Vec<Vec<TypeTag>> {
    let mut types: Vec<Vec<TypeTag>> = params
        .items
        .iter()
        .map(|param| match &param.type_annotation {
            Some(annotation) => ctx.types.annotation(&annotation.type_annotation),
            None => Vec::new(),
        })
        .collect();
    if let Some(rest) = &params.rest {
        types.push(match &rest.type_annotation {
            Some(annotation) => ctx.types.annotation(&annotation.type_annotation),
            None => Vec::new(),
        });
    }
    types
}

fn methods<'a>(ctx: &AnalysisContext<'_, 'a>, value: &Expression<'a>, builder: &mut MetadataBuilder) {
    let Expression::ObjectExpression(object) = value.without_parentheses() else {
        return;
    };
    for (name, _, comment) in properties_with_comments(ctx, object) {
        builder.add_method(name, comment);
    }
}

fn computed<'a>(ctx: &AnalysisContext<'_, 'a>, value: &Expression<'a>, builder: &mut MetadataBuilder) {
    let Expression::ObjectExpression(object) = value.without_parentheses() else {
        return;
    };
    for (name, property, comment) in properties_with_comments(ctx, object) {
        match property.kind {
            PropertyKind::Get => builder.add_computed(name, ComputedPart::Get, comment),
            PropertyKind::Set => builder.add_computed(name, ComputedPart::Set, comment),
            PropertyKind::Init => match property.value.without_parentheses() {
                Expression::ObjectExpression(accessors) => {
                    builder.add_computed(name.clone(), ComputedPart::All, comment);
                    for (side, _, side_comment) in properties_with_comments(ctx, accessors) {
                        let part = match side.as_str() {
                            "get" => ComputedPart::Get,
                            "set" => ComputedPart::Set,
                            _ => continue,
                        };
                        builder.add_computed(name.clone(), part, side_comment);
                    }
                }
                _ => builder.add_computed(name, ComputedPart::All, comment),
            },
        }
    }
}

fn data<'a>(ctx: &AnalysisContext<'_, 'a>, value: &'a Expression<'a>, builder: &mut MetadataBuilder) {
    match object_or_returned_object(value) {
        Some(object) => flatten_data(ctx, object, None, None, builder),
        None => tracing::debug!("`data` returns no object literal"),
    }
}

/// Register every property as a dot-path data entry, recursing into nested
/// object literals. Comments accumulate from parent to child.
pub fn flatten_data<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    object: &ObjectExpression<'a>,
    prefix: Option<&str>,
    parent_comment: Option<&str>,
    builder: &mut MetadataBuilder,
) {
    for (name, property, comment) in properties_with_comments(ctx, object) {
        let path = match prefix {
            Some(prefix) => {
                let mut path = String::from(prefix);
                path.push('.');
                path.push_str(&name);
                path
            }
            None => name,
        };
        let comment = join_comments(parent_comment, comment);
        builder.add_data(path.clone(), comment.clone());
        if let Expression::ObjectExpression(nested) = property.value.without_parentheses() {
            flatten_data(ctx, nested, Some(&path), comment.as_deref(), builder);
        }
    }
}

fn join_comments(parent: Option<&str>, own: Option<String>) -> Option<String> {
    match (parent, own) {
        (Some(parent), Some(own)) => {
            let mut joined = String::from(parent);
            joined.push('\n');
            joined.push_str(&own);
            Some(joined)
        }
        (Some(parent), None) => Some(String::from(parent)),
        (None, own) => own,
    }
}

/// Declare props from an array of names or an object of descriptors.
pub fn props<'a>(ctx: &AnalysisContext<'_, 'a>, value: &'a Expression<'a>, builder: &mut MetadataBuilder) {
    match value.without_parentheses() {
        Expression::ArrayExpression(array) => {
            for (name, comment) in string_elements(ctx, array) {
                builder.add_prop(
                    name,
                    PropEntry {
                        comment,
                        ..Default::default()
                    },
                );
            }
        }
        Expression::ObjectExpression(object) => {
            for (name, property, comment) in properties_with_comments(ctx, object) {
                let mut entry = prop_entry(ctx, Some(&property.value), None);
                entry.comment = comment;
                builder.add_prop(name, entry);
            }
        }
        _ => tracing::debug!("`props` is neither an array nor an object"),
    }
}

/// Build a prop from its option value (a type, a type array, or a
/// descriptor) and the annotation of its declaration, if any.
///
/// Type priority: explicit runtime type, then annotation, then the default's shape.
pub fn prop_entry<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    option: Option<&'a Expression<'a>>,
    annotation: Option<&TSType<'a>>,
) -> PropEntry {
    let mut entry = PropEntry::default();
    let mut explicit = None;
    let mut default = None;

    match option.map(Expression::without_parentheses) {
        Some(Expression::ObjectExpression(descriptor)) => {
            for property in descriptor.properties.iter().filter_map(ObjectPropertyKind::as_property) {
                match crate::util::property_name(&property.key).as_deref() {
                    Some("type") => explicit = Some(ctx.types.runtime_type(&property.value)),
                    Some("default") => {
                        entry.default = ctx.value_text(&property.value);
                        default = Some(&property.value);
                    }
                    Some("required") => {
                        if let Expression::BooleanLiteral(lit) = &property.value {
                            entry.required = Some(lit.value);
                        }
                    }
                    _ => {}
                }
            }
        }
        Some(other) => explicit = Some(ctx.types.runtime_type(other)),
        None => {}
    }

    entry.types = match (explicit, annotation, default) {
        (Some(explicit), _, _) => explicit,
        (None, Some(annotation), _) => ctx.types.annotation(annotation),
        (None, None, Some(default)) => ctx.types.default_value(default),
        (None, None, None) => Vec::new(),
    };
    entry
}

/// String elements of an array literal with their leading comments.
fn string_elements<'a>(ctx: &AnalysisContext<'_, 'a>, array: &ArrayExpression<'a>) -> Vec<(String, Option<String>)> {
    let mut result = Vec::new();
    let mut window_start = array.span.start + 1;
    for element in &array.elements {
        let span = element.span();
        if let Some(name) = element.as_expression().and_then(string_value) {
            result.push((String::from(name), ctx.comment_between(window_start, span)));
        }
        window_start = span.end;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TypeTag::{Array, Number};
    use crate::test_utils::with_default_export;

    #[test]
    fn test_props_forms() {
        let meta = with_default_export(
            r#"export default {
  props: {
    // Count of items
    count: Number,
    label: [String, Number],
    items: { type: Array, default: () => [], required: true },
    size: { default: 10 },
    loose: {},
  },
}"#,
        );
        let count = meta.props.get("count").unwrap();
        assert_eq!(count.types, vec![Number]);
        assert_eq!(count.comment.as_deref(), Some("Count of items"));
        assert_eq!(meta.props.get("label").unwrap().types, vec![TypeTag::String, Number]);

        let items = meta.props.get("items").unwrap();
        assert_eq!(items.types, vec![Array]);
        assert_eq!(items.default.as_deref(), Some("() => []"));
        assert_eq!(items.required, Some(true));

        assert_eq!(meta.props.get("size").unwrap().types, vec![Number]);
        assert!(meta.props.get("loose").unwrap().types.is_empty());
    }

    #[test]
    fn test_props_array_form() {
        let meta = with_default_export("export default { props: ['a', /* second */ 'b'] }");
        assert_eq!(meta.props.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(meta.props.get("b").unwrap().comment.as_deref(), Some("second"));
    }

    #[test]
    fn test_data_flattening_inherits_comments() {
        let meta = with_default_export(
            r#"export default {
  data() {
    return {
      // Outer
      a: {
        // Inner
        b: 1,
        c: { d: true },
      },
      e: 'x',
    }
  },
}"#,
        );
        assert_eq!(meta.data.keys().collect::<Vec<_>>(), ["a", "a.b", "a.c", "a.c.d", "e"]);
        let a = meta.data.get("a").unwrap().comment.clone().unwrap();
        let ab = meta.data.get("a.b").unwrap().comment.clone().unwrap();
        assert_eq!(a, "Outer");
        assert_eq!(ab, "Outer\nInner");
        assert!(ab.starts_with(a.as_str()));
        assert_eq!(meta.data.get("a.c.d").unwrap().comment.as_deref(), Some("Outer"));
        assert_eq!(meta.data.get("e").unwrap().comment, None);
    }

    #[test]
    fn test_computed_and_methods() {
        let meta = with_default_export(
            r#"export default {
  computed: {
    // Doubled
    double() { return 2 },
    full: {
      // Reads
      get() { return '' },
      // Writes
      set(v) {},
    },
  },
  methods: {
    /** Save it */
    save() { this.$emit('saved', 1, 'ok') },
  },
  mounted() {},
}"#,
        );
        assert_eq!(
            meta.computed.get("double").unwrap().comment.as_deref(),
            Some("all: Doubled")
        );
        assert_eq!(
            meta.computed.get("full").unwrap().comment.as_deref(),
            Some("get: Reads\nset: Writes")
        );
        assert_eq!(meta.methods.get("save").unwrap().comment.as_deref(), Some("Save it"));
        assert!(meta.lifecycle.contains_key("mounted"));
        assert_eq!(meta.emits.get("saved").unwrap().types, vec![vec![Number], vec![TypeTag::String]]);
    }

    #[test]
    fn test_emits_forms() {
        let meta = with_default_export(
            r#"export default {
  emits: {
    change: (id: number, label: string) => true,
    close: null,
  },
}"#,
        );
        let change = meta.emits.get("change").unwrap();
        assert_eq!(change.types, vec![vec![Number], vec![TypeTag::String]]);
        assert_eq!(
            change.validator.as_deref(),
            Some("(id: number, label: string) => true")
        );
        assert!(meta.emits.get("close").unwrap().validator.is_none());

        let meta = with_default_export("export default { emits: ['a', 'b'] }");
        assert_eq!(meta.emits.keys().collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn test_provide_inject() {
        let meta = with_default_export(
            r#"const key = Symbol()
export default {
  provide() {
    return {
      theme: 'dark',
      user: this.user,
      [key]: compute(),
    }
  },
  inject: {
    theme: 'appTheme',
    store: key,
    locale: { from: 'i18n', default: 'en' },
    plain: {},
  },
}"#,
        );
        let theme = meta.provide.get("theme").unwrap();
        assert_eq!(theme.key_kind, KeyKind::Literal);
        assert_eq!(theme.value.as_deref(), Some("'dark'"));
        assert_eq!(theme.value_kind, ValueKind::Literal);
        assert_eq!(meta.provide.get("user").unwrap().value_kind, ValueKind::Reference);
        let dynamic = meta.provide.get("key").unwrap();
        assert_eq!(dynamic.key_kind, KeyKind::Dynamic);
        assert_eq!(dynamic.value_kind, ValueKind::Expression);

        assert_eq!(meta.inject.get("theme").unwrap().from.as_deref(), Some("appTheme"));
        let store = meta.inject.get("store").unwrap();
        assert_eq!(store.from_kind, FromKind::Identifier);
        assert_eq!(store.from.as_deref(), Some("key"));
        let locale = meta.inject.get("locale").unwrap();
        assert_eq!(locale.from.as_deref(), Some("i18n"));
        assert_eq!(locale.default.as_deref(), Some("'en'"));
        assert_eq!(meta.inject.get("plain").unwrap().from.as_deref(), Some("plain"));

        let meta = with_default_export("export default { inject: ['a'] }");
        assert_eq!(meta.inject.get("a").unwrap().from.as_deref(), Some("a"));
    }

    #[test]
    fn test_scalars_mixins_filters_components() {
        let meta = with_default_export(
            r#"import Base from './Base'
import { currency } from './filters'
import Child from './Child.vue'
const Local = { name: 'Local', props: ['x'] }
export default {
  name: 'Demo',
  extends: Base,
  mixins: [Base, other],
  model: { prop: 'checked', event: 'change' },
  filters: {
    currency,
    // Upper-cases
    upper(value) { return value.toUpperCase() },
  },
  components: { Child, Local, Inline: { props: ['y'] }, Lazy: () => import('./Lazy.vue') },
}"#,
        );
        assert_eq!(meta.name.as_deref(), Some("Demo"));
        assert_eq!(meta.extends.as_deref(), Some("Base"));
        assert_eq!(meta.mixins, vec![String::from("Base"), String::from("other")]);
        let model = meta.model.as_ref().unwrap();
        assert_eq!((model.prop.as_str(), model.event.as_str()), ("checked", "change"));

        assert!(meta.filters.get("currency").unwrap().reexported);
        let upper = meta.filters.get("upper").unwrap();
        assert!(!upper.reexported);
        assert_eq!(upper.comment.as_deref(), Some("Upper-cases"));

        assert_eq!(meta.components.get("Child").map(String::as_str), Some("Child"));
        assert!(meta.components.get("Local").unwrap().contains("name: \"Local\""));
        assert!(meta.components.get("Inline").unwrap().contains("props: {"));
        assert_eq!(
            meta.components.get("Lazy").map(String::as_str),
            Some("() => import('./Lazy.vue')")
        );
    }

    #[test]
    fn test_setup_option() {
        let meta = with_default_export(
            r#"export default {
  props: { a: Number },
  setup(props, { emit }) {
    const count = ref(0)
    const max = 10
    emit('ready', 1)
    return { count, max, double: computed(() => count.value * 2) }
  },
}"#,
        );
        assert_eq!(meta.setup.keys().collect::<Vec<_>>(), ["count", "double"]);
        assert_eq!(meta.emits.get("ready").unwrap().types, vec![vec![Number]]);
    }
}
