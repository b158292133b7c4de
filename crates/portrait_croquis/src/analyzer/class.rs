//! Annotated-class analyzer.
//!
//! Reads a class component: its `@Component` options, its base class, and
//! one outcome per member according to the member's kind and decorators.

use oxc_ast::ast::{
    Argument, CallExpression, Class, ClassElement, Decorator, Expression, MethodDefinition, MethodDefinitionKind,
    ObjectExpression, PropertyDefinition, Statement,
};
use oxc_ast_visit::Visit;
use oxc_span::GetSpan;
use portrait_carton::{hyphenate, String};

use super::options::{flatten_data, inject_entry, parameter_types, prop_entry};
use super::{analyze_options, delta, AnalysisContext, EmitCallCollector};
use crate::classify::{decorator_name, is_component_decorator, is_decorate_call, is_mixins_call};
use crate::metadata::{
    ComponentMetadata, ComputedPart, EmitEntry, KeyKind, MetadataBuilder, ModelOption, ProvideEntry, TypeTag, ValueKind,
};
use crate::resolve::Resolve;
use crate::util::{callee_ident, object_or_returned_object, property_name, string_value, FunctionLike};

/// Analyze a class component. `registration` is the decorate call that
/// registers the class from outside its body, if any.
pub fn analyze_class<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    class: &'a Class<'a>,
    registration: Option<&'a CallExpression<'a>>,
) -> ComponentMetadata {
    delta(|builder| {
        for options in component_options(class, registration) {
            builder.merge(analyze_options(ctx, options));
        }
        if let Some(id) = &class.id {
            builder.set_name(id.name.as_str());
        }
        base_class(ctx, class, builder);

        let mut window_start = class.body.span.start + 1;
        for element in &class.body.body {
            let span = element.span();
            let comment = ctx.comment_between(window_start, span);
            match element {
                ClassElement::PropertyDefinition(field) if !field.r#static => {
                    property(ctx, field, comment, builder);
                }
                ClassElement::MethodDefinition(method) if !method.r#static => {
                    self::method(ctx, method, comment, builder);
                }
                _ => {}
            }
            window_start = span.end;
        }

        EmitCallCollector::new(ctx, builder).visit_class_body(&class.body);
    })
}

/// Options objects passed to the component annotation, from decorators,
/// from decorate calls in static blocks, and from the outside registration.
fn component_options<'a>(
    class: &'a Class<'a>,
    registration: Option<&'a CallExpression<'a>>,
) -> Vec<&'a ObjectExpression<'a>> {
    let mut options: Vec<_> = class
        .decorators
        .iter()
        .filter(|decorator| is_component_decorator(decorator))
        .filter_map(|decorator| first_object_argument(&decorator.expression))
        .collect();

    let mut calls: Vec<&'a CallExpression<'a>> = registration.into_iter().collect();
    for element in &class.body.body {
        if let ClassElement::StaticBlock(block) = element {
            for statement in &block.body {
                if let Statement::ExpressionStatement(statement) = statement {
                    if let Expression::CallExpression(call) = &statement.expression {
                        if is_decorate_call(call) {
                            calls.push(call);
                        }
                    }
                }
            }
        }
    }
    for call in calls {
        let Some(Argument::ArrayExpression(decorators)) = call.arguments.first() else {
            continue;
        };
        for decorator in decorators.elements.iter().filter_map(|element| element.as_expression()) {
            let is_component = match decorator {
                Expression::CallExpression(call) => {
                    callee_ident(call).is_some_and(|name| matches!(name, "Component" | "Options"))
                }
                _ => false,
            };
            if is_component {
                options.extend(first_object_argument(decorator));
            }
        }
    }
    options
}

fn first_object_argument<'a>(expr: &'a Expression<'a>) -> Option<&'a ObjectExpression<'a>> {
    let Expression::CallExpression(call) = expr else {
        return None;
    };
    match call.arguments.first()? {
        Argument::ObjectExpression(object) => Some(object),
        _ => None,
    }
}

fn base_class<'a>(ctx: &AnalysisContext<'_, 'a>, class: &'a Class<'a>, builder: &mut MetadataBuilder) {
    let Some(base) = &class.super_class else {
        return;
    };
    let is_import = |name: &str| ctx.resolver.resolve(name, None).is_some_and(|binding| binding.is_import());
    match base.without_parentheses() {
        Expression::CallExpression(call) if is_mixins_call(call) => {
            for argument in &call.arguments {
                match argument {
                    Argument::Identifier(ident) if is_import(&ident.name) => builder.add_mixin(ident.name.as_str()),
                    other => tracing::debug!("mixin `{}` is not an import", ctx.text(other.span())),
                }
            }
        }
        Expression::Identifier(ident) if ident.name != "Vue" => {
            if is_import(&ident.name) {
                builder.set_extends(ident.name.as_str());
            } else {
                tracing::debug!("base class `{}` is not an import", ident.name);
            }
        }
        _ => {}
    }
}

/// Arguments of a called decorator. A bare decorator has none.
fn decorator_arguments<'a>(decorator: &'a Decorator<'a>) -> &'a [Argument<'a>] {
    match &decorator.expression {
        Expression::CallExpression(call) => &call.arguments,
        _ => &[],
    }
}

fn nth_expression<'a>(arguments: &'a [Argument<'a>], n: usize) -> Option<&'a Expression<'a>> {
    arguments.get(n).and_then(|argument| argument.as_expression())
}

fn property<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    field: &'a PropertyDefinition<'a>,
    comment: Option<String>,
    builder: &mut MetadataBuilder,
) {
    let Some(name) = property_name(&field.key) else {
        tracing::debug!("skipping field `{}`", ctx.text(field.key.span()));
        return;
    };
    let annotation = field.type_annotation.as_ref().map(|annotation| &annotation.type_annotation);

    if field.decorators.is_empty() {
        field_data(ctx, &name, field.value.as_ref(), comment, builder);
        return;
    }

    for decorator in &field.decorators {
        let arguments = decorator_arguments(decorator);
        match decorator_name(decorator).unwrap_or_default() {
            "Prop" => {
                let mut entry = prop_entry(ctx, nth_expression(arguments, 0), annotation);
                entry.comment = comment.clone();
                builder.add_prop(name.clone(), entry);
            }
            "PropSync" => {
                // Prop, accessor and event are all keyed by the field.
                let mut entry = prop_entry(ctx, nth_expression(arguments, 1), annotation);
                entry.comment = comment.clone();
                let payload = entry.types.clone();
                builder.add_prop(name.clone(), entry);
                builder.add_computed(name.clone(), ComputedPart::All, comment.clone());
                builder.add_emit(format!("update:{name}"), sync_emit(payload, comment.clone()));
            }
            "Model" => {
                let event = nth_expression(arguments, 0).and_then(string_value);
                let mut entry = prop_entry(ctx, nth_expression(arguments, 1), annotation);
                entry.comment = comment.clone();
                builder.add_prop(name.clone(), entry);
                builder.set_model(model_option(Some(&name), event));
            }
            "ModelSync" => {
                let Some(prop) = nth_expression(arguments, 0).and_then(string_value) else {
                    tracing::debug!("@ModelSync on `{name}` has no prop name");
                    continue;
                };
                let event = nth_expression(arguments, 1).and_then(string_value);
                let mut entry = prop_entry(ctx, nth_expression(arguments, 2), annotation);
                entry.comment = comment.clone();
                let payload = entry.types.clone();
                builder.add_prop(prop, entry);
                builder.add_computed(name.clone(), ComputedPart::All, comment.clone());
                let model = model_option(Some(prop), event);
                builder.add_emit(model.event.clone(), sync_emit(payload, comment.clone()));
                builder.set_model(model);
            }
            "VModel" => {
                let model = ModelOption::default();
                let mut entry = prop_entry(ctx, nth_expression(arguments, 0), annotation);
                entry.comment = comment.clone();
                let payload = entry.types.clone();
                builder.add_prop(model.prop.clone(), entry);
                builder.add_computed(name.clone(), ComputedPart::All, comment.clone());
                builder.add_emit(model.event.clone(), sync_emit(payload, comment.clone()));
                builder.set_model(model);
            }
            "Provide" | "ProvideReactive" => {
                let (key, key_kind) = match nth_expression(arguments, 0) {
                    Some(expr) => match string_value(expr) {
                        Some(key) => (String::from(key), KeyKind::Literal),
                        None => (String::from(ctx.text(expr.span())), KeyKind::Dynamic),
                    },
                    None => (name.clone(), KeyKind::Literal),
                };
                builder.add_provide(
                    key,
                    ProvideEntry {
                        key_kind,
                        value: Some(name.clone()),
                        value_kind: ValueKind::Reference,
                        comment: comment.clone(),
                    },
                );
                field_data(ctx, &name, field.value.as_ref(), comment.clone(), builder);
            }
            "Inject" | "InjectReactive" => {
                let mut entry = inject_entry(ctx, &name, nth_expression(arguments, 0));
                entry.comment = comment.clone();
                builder.add_inject(name.clone(), entry);
            }
            other => {
                tracing::debug!("unrecognized decorator `@{other}` on `{name}`");
                builder.add_misc(name.clone(), comment.clone());
            }
        }
    }
}

/// A data field, flattened if its initializer is an object literal.
fn field_data<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    name: &str,
    value: Option<&'a Expression<'a>>,
    comment: Option<String>,
    builder: &mut MetadataBuilder,
) {
    builder.add_data(name, comment.clone());
    if let Some(Expression::ObjectExpression(object)) = value.map(Expression::without_parentheses) {
        flatten_data(ctx, object, Some(name), comment.as_deref(), builder);
    }
}

fn model_option(prop: Option<&str>, event: Option<&str>) -> ModelOption {
    let mut model = ModelOption::default();
    if let Some(prop) = prop {
        model.prop = String::from(prop);
    }
    if let Some(event) = event {
        model.event = String::from(event);
    }
    model
}

/// Emit synthesized for a synced prop: one payload of the prop's type.
fn sync_emit(payload: Vec<TypeTag>, comment: Option<String>) -> EmitEntry {
    EmitEntry {
        types: vec![payload],
        comment,
        validator: None,
    }
}

fn method<'a>(
    ctx: &AnalysisContext<'_, 'a>,
    method: &'a MethodDefinition<'a>,
    comment: Option<String>,
    builder: &mut MetadataBuilder,
) {
    let Some(name) = property_name(&method.key) else {
        tracing::debug!("skipping method `{}`", ctx.text(method.key.span()));
        return;
    };
    let func = FunctionLike::Function(&method.value);
    match method.kind {
        MethodDefinitionKind::Constructor => return,
        MethodDefinitionKind::Get => return builder.add_computed(name, ComputedPart::Get, comment),
        MethodDefinitionKind::Set => return builder.add_computed(name, ComputedPart::Set, comment),
        MethodDefinitionKind::Method => {}
    }

    if !method.decorators.is_empty() {
        for decorator in &method.decorators {
            match decorator_name(decorator).unwrap_or_default() {
                "Emit" => {
                    let event = nth_expression(decorator_arguments(decorator), 0)
                        .and_then(string_value)
                        .map_or_else(|| hyphenate(&name), String::from);
                    let mut types = Vec::new();
                    if let Some(returned) = func.returned() {
                        types.push(ctx.types.expression(returned));
                    }
                    types.extend(parameter_types(ctx, func.params()));
                    builder.add_emit(
                        event,
                        EmitEntry {
                            types,
                            comment: comment.clone(),
                            validator: None,
                        },
                    );
                    builder.add_method(name.clone(), comment.clone());
                }
                other => {
                    tracing::debug!("unrecognized decorator `@{other}` on `{name}`");
                    builder.add_misc(name.clone(), comment.clone());
                }
            }
        }
        return;
    }

    if name == "data" {
        match func.returned().and_then(object_or_returned_object) {
            Some(object) => flatten_data(ctx, object, None, None, builder),
            None => tracing::debug!("`data()` returns no object literal"),
        }
    } else if !builder.add_lifecycle(&name, comment.clone()) {
        builder.add_method(name, comment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{with_default_export, with_export};
    use crate::metadata::TypeTag::{Array, Boolean, Number, Object};

    #[test]
    fn test_prop_matches_config_form() {
        let class = with_default_export(
            r#"import { Component, Prop, Vue } from 'vue-property-decorator'
@Component
export default class Counter extends Vue {
  @Prop(Number) readonly count!: number
}"#,
        );
        let config = with_default_export("export default { props: { count: { type: Number } } }");
        assert_eq!(class.props.get("count"), config.props.get("count"));
        assert_eq!(class.props.get("count").unwrap().types, vec![Number]);
        assert_eq!(class.name.as_deref(), Some("Counter"));
    }

    #[test]
    fn test_prop_type_priority() {
        let meta = with_default_export(
            r#"@Component
export default class A extends Vue {
  @Prop() label!: string
  @Prop({ type: Boolean, default: false }) flag!: string
  @Prop({ default: () => [] }) items
}"#,
        );
        assert_eq!(meta.props.get("label").unwrap().types, vec![TypeTag::String]);
        let flag = meta.props.get("flag").unwrap();
        assert_eq!(flag.types, vec![Boolean]);
        assert_eq!(flag.default.as_deref(), Some("false"));
        assert_eq!(meta.props.get("items").unwrap().types, vec![Array]);
    }

    #[test]
    fn test_members() {
        let meta = with_default_export(
            r#"@Component({ name: 'Fancy', components: { Child } })
export default class A extends Vue {
  // Current page
  page = 1
  // Options
  config = { size: 10 }
  static version = 2

  // Page label
  get label() { return '' }
  set label(v) {}

  /** Reload everything */
  reload() { this.$emit('reloaded', true) }
  mounted() {}
  constructor() { super() }
}"#,
        );
        assert_eq!(meta.name.as_deref(), Some("Fancy"));
        assert_eq!(meta.components.get("Child").map(String::as_str), Some("Child"));
        assert_eq!(meta.data.keys().collect::<Vec<_>>(), ["page", "config", "config.size"]);
        assert_eq!(
            meta.data.get("config.size").unwrap().comment.as_deref(),
            Some("Options")
        );
        assert_eq!(
            meta.computed.get("label").unwrap().comment.as_deref(),
            Some("get: Page label")
        );
        assert_eq!(meta.methods.keys().collect::<Vec<_>>(), ["reload"]);
        assert!(meta.lifecycle.contains_key("mounted"));
        assert_eq!(meta.emits.get("reloaded").unwrap().types, vec![vec![Boolean]]);
    }

    #[test]
    fn test_sync_and_model_decorators() {
        let meta = with_default_export(
            r#"@Component
export default class A extends Vue {
  @Model('change', { type: Boolean }) readonly checked!: boolean
}"#,
        );
        assert_eq!(meta.props.keys().collect::<Vec<_>>(), ["checked"]);
        let model = meta.model.as_ref().unwrap();
        assert_eq!((model.prop.as_str(), model.event.as_str()), ("checked", "change"));

        let meta = with_default_export(
            r#"@Component
export default class A extends Vue {
  @ModelSync('checked', 'toggle', { type: Boolean }) readonly isChecked!: boolean
}"#,
        );
        assert!(meta.props.contains_key("checked"));
        assert!(meta.computed.contains_key("isChecked"));
        assert_eq!(meta.emits.get("toggle").unwrap().types, vec![vec![Boolean]]);
        assert_eq!(meta.model.as_ref().unwrap().prop, "checked");

        let meta = with_default_export(
            r#"@Component
export default class A extends Vue {
  @VModel({ type: String }) name!: string
}"#,
        );
        assert!(meta.props.contains_key("value"));
        assert!(meta.emits.contains_key("input"));
        assert!(meta.computed.contains_key("name"));
    }

    #[test]
    fn test_prop_sync_names_follow_field() {
        let meta = with_default_export(
            r#"@Component
export default class A extends Vue {
  /** Synced label */
  @PropSync('value', { type: String }) syncedValue!: string
}"#,
        );
        assert_eq!(meta.props.keys().collect::<Vec<_>>(), ["syncedValue"]);
        assert_eq!(meta.props.get("syncedValue").unwrap().types, vec![TypeTag::String]);
        assert_eq!(meta.computed.keys().collect::<Vec<_>>(), ["syncedValue"]);
        assert_eq!(meta.emits.keys().collect::<Vec<_>>(), ["update:syncedValue"]);
        let emit = meta.emits.get("update:syncedValue").unwrap();
        assert_eq!(emit.types, vec![vec![TypeTag::String]]);
        assert_eq!(emit.comment.as_deref(), Some("Synced label"));
    }

    #[test]
    fn test_provide_inject_emit_and_misc() {
        let meta = with_default_export(
            r#"const symbol = Symbol()
@Component
export default class A extends Vue {
  @Provide() theme = { dark: true }
  @ProvideReactive(symbol) store = null
  @Inject('i18n') readonly locale!: string
  @InjectReactive() readonly user!: object
  @Watch('page') onPageChanged() {}
  @Ref() readonly input!: HTMLInputElement

  @Emit()
  addToCount(n: number) {
    return { n }
  }
  @Emit('reset') resetCount() {}
}"#,
        );
        let theme = meta.provide.get("theme").unwrap();
        assert_eq!(theme.key_kind, KeyKind::Literal);
        assert_eq!(theme.value.as_deref(), Some("theme"));
        assert_eq!(theme.value_kind, ValueKind::Reference);
        assert_eq!(meta.provide.get("symbol").unwrap().key_kind, KeyKind::Dynamic);
        assert_eq!(meta.data.keys().collect::<Vec<_>>(), ["theme", "theme.dark", "store"]);

        assert_eq!(meta.inject.get("locale").unwrap().from.as_deref(), Some("i18n"));
        assert_eq!(meta.inject.get("user").unwrap().from.as_deref(), Some("user"));

        assert_eq!(meta.misc.keys().collect::<Vec<_>>(), ["onPageChanged", "input"]);

        assert_eq!(meta.emits.get("add-to-count").unwrap().types, vec![vec![Object], vec![Number]]);
        assert!(meta.emits.get("reset").unwrap().types.is_empty());
        assert_eq!(meta.methods.keys().collect::<Vec<_>>(), ["addToCount", "resetCount"]);
    }

    #[test]
    fn test_base_class() {
        let meta = with_default_export(
            r#"import Base from './Base'
import { Logging, Paging } from './mixins'
const Local = {}
@Component
export default class A extends mixins(Logging, Paging, Local) {}"#,
        );
        assert_eq!(meta.mixins, vec![String::from("Logging"), String::from("Paging")]);

        let meta = with_default_export(
            "import Base from './Base'\n@Component\nexport default class A extends Base {}",
        );
        assert_eq!(meta.extends.as_deref(), Some("Base"));
    }

    #[test]
    fn test_decorate_registration() {
        let meta = with_export(
            r#"let Legacy = class Legacy extends Vue {
  count = 0
}
Legacy = __decorate([Component({ name: 'legacy' })], Legacy)
export { Legacy }"#,
            "Legacy",
        );
        assert_eq!(meta.name.as_deref(), Some("legacy"));
        assert!(meta.data.contains_key("count"));
    }
}
