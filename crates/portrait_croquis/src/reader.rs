//! Reading generated code back into metadata.
//!
//! The inverse of [`crate::codegen::generate`]. Sub-component values are kept
//! as their raw source text, mixins as their identifier text.

use oxc_allocator::Allocator;
use oxc_ast::ast::{ArrayExpression, Expression, ObjectExpression, ObjectPropertyKind};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType};
use portrait_carton::{OrderedMap, String};

use crate::error::ExtractError;
use crate::metadata::{
    ComponentMetadata, EmitEntry, ExpressionInfo, ExpressionKind, FilterEntry, FromKind, InjectEntry, KeyKind,
    ModelOption, NamedEntry, PropEntry, ProvideEntry, SlotEntry, TemplateAttr, TemplateNode, TemplateNodeKind,
    TypeTag, ValueKind,
};
use crate::util::{property_name, text};

type Result<T> = std::result::Result<T, ExtractError>;

/// Parse generated metadata code.
pub fn read_metadata(code: &str) -> Result<ComponentMetadata> {
    let allocator = Allocator::default();
    let expr = Parser::new(&allocator, code, SourceType::mjs())
        .parse_expression()
        .map_err(|errors| {
            let message = errors.first().map_or_else(|| "syntax error".to_string(), |e| e.message.to_string());
            ExtractError::ReadError(message)
        })?;
    let reader = Reader { code };
    reader.component(&expr)
}

struct Reader<'c> {
    code: &'c str,
}

fn invalid<T>(what: &str) -> Result<T> {
    Err(ExtractError::ReadError(format!("expected {what}")))
}

impl Reader<'_> {
    fn component(&self, expr: &Expression<'_>) -> Result<ComponentMetadata> {
        let object = as_object(expr, "component object")?;
        let mut meta = ComponentMetadata::default();
        for (key, value) in fields(object)? {
            match key.as_str() {
                "name" => meta.name = optional_string(value)?,
                "extends" => meta.extends = optional_string(value)?,
                "model" => meta.model = self.model(value)?,
                "mixins" => {
                    meta.mixins = as_array(value, "mixin list")?
                        .elements
                        .iter()
                        .map(|element| String::from(text(self.code, element.span())))
                        .collect();
                }
                "components" => {
                    meta.components = map(value, |code| Ok(String::from(text(self.code, code.span()))))?;
                }
                "props" => meta.props = map(value, prop)?,
                "emits" => meta.emits = map(value, emit)?,
                "data" => meta.data = map(value, named)?,
                "computed" => meta.computed = map(value, named)?,
                "methods" => meta.methods = map(value, named)?,
                "setup" => meta.setup = map(value, named)?,
                "lifecycle" => meta.lifecycle = map(value, named)?,
                "provide" => meta.provide = map(value, provide)?,
                "inject" => meta.inject = map(value, inject)?,
                "filters" => meta.filters = map(value, filter)?,
                "slots" => meta.slots = map(value, slot)?,
                "misc" => meta.misc = map(value, named)?,
                "template" => meta.template = list(value, template_node)?,
                other => return Err(ExtractError::ReadError(format!("unknown field `{other}`"))),
            }
        }
        Ok(meta)
    }

    fn model(&self, value: &Expression<'_>) -> Result<Option<ModelOption>> {
        if is_undefined(value) {
            return Ok(None);
        }
        let mut model = ModelOption::default();
        for (key, value) in fields(as_object(value, "model option")?)? {
            match key.as_str() {
                "prop" => model.prop = string(value)?,
                "event" => model.event = string(value)?,
                _ => {}
            }
        }
        Ok(Some(model))
    }
}

fn is_undefined(expr: &Expression<'_>) -> bool {
    expr.is_specific_id("undefined")
}

fn as_object<'e, 'a>(expr: &'e Expression<'a>, what: &str) -> Result<&'e ObjectExpression<'a>> {
    match expr {
        Expression::ObjectExpression(object) => Ok(object),
        _ => invalid(what),
    }
}

fn as_array<'e, 'a>(expr: &'e Expression<'a>, what: &str) -> Result<&'e ArrayExpression<'a>> {
    match expr {
        Expression::ArrayExpression(array) => Ok(array),
        _ => invalid(what),
    }
}

/// Named properties of an object literal, in order.
fn fields<'e, 'a>(object: &'e ObjectExpression<'a>) -> Result<Vec<(String, &'e Expression<'a>)>> {
    object
        .properties
        .iter()
        .map(|property| match property {
            ObjectPropertyKind::ObjectProperty(property) => match property_name(&property.key) {
                Some(name) => Ok((name, &property.value)),
                None => invalid("a static key"),
            },
            ObjectPropertyKind::SpreadProperty(_) => invalid("a property, found a spread"),
        })
        .collect()
}

fn map<V>(expr: &Expression<'_>, mut entry: impl FnMut(&Expression<'_>) -> Result<V>) -> Result<OrderedMap<V>> {
    let mut result = OrderedMap::new();
    for (key, value) in fields(as_object(expr, "an object")?)? {
        result.insert(key, entry(value)?);
    }
    Ok(result)
}

fn list<V>(expr: &Expression<'_>, mut item: impl FnMut(&Expression<'_>) -> Result<V>) -> Result<Vec<V>> {
    as_array(expr, "an array")?
        .elements
        .iter()
        .map(|element| match element.as_expression() {
            Some(expr) => item(expr),
            None => invalid("an array element"),
        })
        .collect()
}

fn string(expr: &Expression<'_>) -> Result<String> {
    match expr {
        Expression::StringLiteral(lit) => Ok(String::from(lit.value.as_str())),
        _ => invalid("a string"),
    }
}

fn optional_string(expr: &Expression<'_>) -> Result<Option<String>> {
    if is_undefined(expr) {
        return Ok(None);
    }
    string(expr).map(Some)
}

fn optional_bool(expr: &Expression<'_>) -> Result<Option<bool>> {
    match expr {
        Expression::BooleanLiteral(lit) => Ok(Some(lit.value)),
        _ if is_undefined(expr) => Ok(None),
        _ => invalid("a boolean"),
    }
}

fn strings(expr: &Expression<'_>) -> Result<Vec<String>> {
    list(expr, string)
}

fn tags(expr: &Expression<'_>) -> Result<Vec<TypeTag>> {
    list(expr, |expr| {
        let name = string(expr)?;
        TypeTag::from_name(&name).map_or_else(|| invalid("a type tag"), Ok)
    })
}

fn named(expr: &Expression<'_>) -> Result<NamedEntry> {
    let mut entry = NamedEntry::default();
    for (key, value) in fields(as_object(expr, "an entry")?)? {
        if key == "comment" {
            entry.comment = optional_string(value)?;
        }
    }
    Ok(entry)
}

fn prop(expr: &Expression<'_>) -> Result<PropEntry> {
    let mut entry = PropEntry::default();
    for (key, value) in fields(as_object(expr, "a prop")?)? {
        match key.as_str() {
            "default" => entry.default = optional_string(value)?,
            "type" => entry.types = tags(value)?,
            "required" => entry.required = optional_bool(value)?,
            "comment" => entry.comment = optional_string(value)?,
            _ => {}
        }
    }
    Ok(entry)
}

fn emit(expr: &Expression<'_>) -> Result<EmitEntry> {
    let mut entry = EmitEntry::default();
    for (key, value) in fields(as_object(expr, "an emit")?)? {
        match key.as_str() {
            "type" => entry.types = list(value, tags)?,
            "comment" => entry.comment = optional_string(value)?,
            "validator" => entry.validator = optional_string(value)?,
            _ => {}
        }
    }
    Ok(entry)
}

fn provide(expr: &Expression<'_>) -> Result<ProvideEntry> {
    let mut entry = ProvideEntry::default();
    for (key, value) in fields(as_object(expr, "a provide")?)? {
        match key.as_str() {
            "keyKind" => {
                entry.key_kind = match string(value)?.as_str() {
                    "literal" => KeyKind::Literal,
                    "dynamic" => KeyKind::Dynamic,
                    _ => return invalid("a key kind"),
                }
            }
            "value" => entry.value = optional_string(value)?,
            "valueKind" => {
                entry.value_kind = match string(value)?.as_str() {
                    "literal" => ValueKind::Literal,
                    "reference" => ValueKind::Reference,
                    "expression" => ValueKind::Expression,
                    _ => return invalid("a value kind"),
                }
            }
            "comment" => entry.comment = optional_string(value)?,
            _ => {}
        }
    }
    Ok(entry)
}

fn inject(expr: &Expression<'_>) -> Result<InjectEntry> {
    let mut entry = InjectEntry::default();
    for (key, value) in fields(as_object(expr, "an inject")?)? {
        match key.as_str() {
            "from" => entry.from = optional_string(value)?,
            "fromKind" => {
                entry.from_kind = match string(value)?.as_str() {
                    "literal" => FromKind::Literal,
                    "identifier" => FromKind::Identifier,
                    _ => return invalid("a from kind"),
                }
            }
            "default" => entry.default = optional_string(value)?,
            "comment" => entry.comment = optional_string(value)?,
            _ => {}
        }
    }
    Ok(entry)
}

fn filter(expr: &Expression<'_>) -> Result<FilterEntry> {
    let mut entry = FilterEntry::default();
    for (key, value) in fields(as_object(expr, "a filter")?)? {
        match key.as_str() {
            "comment" => entry.comment = optional_string(value)?,
            "reexported" => entry.reexported = optional_bool(value)?.unwrap_or_default(),
            _ => {}
        }
    }
    Ok(entry)
}

fn slot(expr: &Expression<'_>) -> Result<SlotEntry> {
    let mut entry = SlotEntry::default();
    for (key, value) in fields(as_object(expr, "a slot")?)? {
        match key.as_str() {
            "comment" => entry.comment = optional_string(value)?,
            "props" => entry.props = strings(value)?,
            _ => {}
        }
    }
    Ok(entry)
}

fn template_node(expr: &Expression<'_>) -> Result<TemplateNode> {
    let mut node = TemplateNode {
        kind: TemplateNodeKind::Element,
        content: String::default(),
        attrs: Vec::new(),
        expression: None,
        children: Vec::new(),
        comment: None,
        range: [0, 0],
    };
    for (key, value) in fields(as_object(expr, "a template node")?)? {
        match key.as_str() {
            "kind" => {
                node.kind = match string(value)?.as_str() {
                    "element" => TemplateNodeKind::Element,
                    "text" => TemplateNodeKind::Text,
                    "expression" => TemplateNodeKind::Expression,
                    _ => return invalid("a node kind"),
                }
            }
            "content" => node.content = string(value)?,
            "attrs" => node.attrs = list(value, attr)?,
            "expression" => node.expression = expression(value)?,
            "children" => node.children = list(value, template_node)?,
            "comment" => node.comment = optional_string(value)?,
            "range" => {
                let bounds = list(value, offset)?;
                let [start, end] = bounds[..] else {
                    return invalid("a two-element range");
                };
                node.range = [start, end];
            }
            _ => {}
        }
    }
    Ok(node)
}

fn offset(expr: &Expression<'_>) -> Result<u32> {
    match expr {
        Expression::NumericLiteral(lit) if lit.value >= 0.0 && lit.value <= f64::from(u32::MAX) => {
            Ok(lit.value as u32)
        }
        _ => invalid("an offset"),
    }
}

fn attr(expr: &Expression<'_>) -> Result<TemplateAttr> {
    let mut attr = TemplateAttr {
        name: String::default(),
        value: None,
        expression: None,
    };
    for (key, value) in fields(as_object(expr, "an attribute")?)? {
        match key.as_str() {
            "name" => attr.name = string(value)?,
            "value" => attr.value = optional_string(value)?,
            "expression" => attr.expression = expression(value)?,
            _ => {}
        }
    }
    Ok(attr)
}

fn expression(expr: &Expression<'_>) -> Result<Option<ExpressionInfo>> {
    if is_undefined(expr) {
        return Ok(None);
    }
    let mut info = ExpressionInfo::new(ExpressionKind::Expression);
    for (key, value) in fields(as_object(expr, "an expression")?)? {
        match key.as_str() {
            "kind" => {
                info.kind = match string(value)?.as_str() {
                    "literal" => ExpressionKind::Literal,
                    "identifier" => ExpressionKind::Identifier,
                    "member" => ExpressionKind::Member,
                    "call" => ExpressionKind::Call,
                    "filter" => ExpressionKind::Filter,
                    "loop" => ExpressionKind::Loop,
                    "scope" => ExpressionKind::Scope,
                    "expression" => ExpressionKind::Expression,
                    _ => return invalid("an expression kind"),
                }
            }
            "scope" => info.scope = strings(value)?,
            "source" => info.source = optional_string(value)?,
            "callChain" => info.call_chain = strings(value)?,
            "arguments" => info.arguments = strings(value)?,
            _ => {}
        }
    }
    Ok(Some(info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::generate;
    use crate::metadata::{ComputedPart, MetadataBuilder};

    #[test]
    fn test_round_trip_builder() {
        let mut builder = MetadataBuilder::new();
        builder.set_name("Demo");
        builder.set_extends("Base");
        builder.add_mixin("Logging");
        builder.add_component("Child", "Child");
        builder.add_prop(
            "count",
            PropEntry {
                default: Some("() => ({ a: 1 })".into()),
                types: vec![TypeTag::Object, TypeTag::Null],
                required: Some(true),
                comment: Some("multi\nline \"quoted\"".into()),
            },
        );
        builder.add_emit(
            "update:count",
            EmitEntry {
                types: vec![vec![TypeTag::Number], vec![]],
                comment: None,
                validator: Some("(n) => n > 0".into()),
            },
        );
        builder.add_computed("double", ComputedPart::Get, Some("Doubled".into()));
        builder.add_provide(
            "theme",
            ProvideEntry {
                key_kind: KeyKind::Dynamic,
                value: Some("this.theme".into()),
                value_kind: ValueKind::Reference,
                comment: None,
            },
        );
        builder.add_inject(
            "store",
            InjectEntry {
                from: Some("key".into()),
                from_kind: FromKind::Identifier,
                default: None,
                comment: None,
            },
        );
        builder.add_filter(
            "upper",
            FilterEntry {
                comment: None,
                reexported: true,
            },
        );
        builder.add_slot(
            "header",
            SlotEntry {
                comment: Some("Top".into()),
                props: vec!["title".into()],
            },
        );
        let mut info = ExpressionInfo::new(ExpressionKind::Loop);
        info.scope = vec!["item".into(), "i".into()];
        info.source = Some("items".into());
        builder.set_template(vec![TemplateNode {
            kind: TemplateNodeKind::Element,
            content: "li".into(),
            attrs: vec![TemplateAttr {
                name: "v-for".into(),
                value: Some("(item, i) in items".into()),
                expression: Some(info),
            }],
            expression: None,
            children: Vec::new(),
            comment: Some("row".into()),
            range: [3, 42],
        }]);

        let meta = builder.finish();
        let code = generate(&meta);
        assert_eq!(read_metadata(&code).unwrap(), meta);
    }

    #[test]
    fn test_nested_component_round_trip() {
        let mut inner = MetadataBuilder::new();
        inner.set_name("Inner");
        let inner_code = generate(&inner.finish());

        let mut outer = MetadataBuilder::new();
        outer.add_component("Inner", inner_code.as_str());
        let meta = outer.finish();

        let read = read_metadata(&generate(&meta)).unwrap();
        assert_eq!(read, meta);
        let nested = read_metadata(read.components.get("Inner").unwrap()).unwrap();
        assert_eq!(nested.name.as_deref(), Some("Inner"));
    }

    #[test]
    fn test_read_errors() {
        assert!(matches!(read_metadata("{ name: "), Err(ExtractError::ReadError(_))));
        assert!(matches!(read_metadata("[1, 2]"), Err(ExtractError::ReadError(_))));
        assert!(matches!(read_metadata("{ bogus: 1 }"), Err(ExtractError::ReadError(_))));
    }
}
